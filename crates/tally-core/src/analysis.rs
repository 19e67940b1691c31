//! The fixed analysis catalogue and its structured results.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Catalogue ───────────────────────────────────────────────────────────────

/// A named aggregate computation. The set is closed and known at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
  /// Σ price × quantity over every sale with a known product.
  TotalRevenue,
  /// Units and revenue per product name, highest revenue first.
  RevenueByProduct,
  /// Units and revenue per store city, highest revenue first.
  RevenueByRegion,
}

impl Analysis {
  pub const ALL: [Analysis; 3] =
    [Self::TotalRevenue, Self::RevenueByProduct, Self::RevenueByRegion];

  /// The name recorded in the `analysis_log` table.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::TotalRevenue => "total_revenue",
      Self::RevenueByProduct => "revenue_by_product",
      Self::RevenueByRegion => "revenue_by_region",
    }
  }

  /// Output columns, in serialisation order.
  pub fn columns(self) -> &'static [&'static str] {
    match self {
      Self::TotalRevenue => &["total_revenue"],
      Self::RevenueByProduct => &["name", "units_sold", "revenue"],
      Self::RevenueByRegion => &["city", "units_sold", "revenue"],
    }
  }
}

impl fmt::Display for Analysis {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Analysis {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|a| a.as_str() == s)
      .ok_or_else(|| Error::UnknownAnalysis(s.to_owned()))
  }
}

// ─── Result rows ─────────────────────────────────────────────────────────────

// Field order below is the serialised column order; keep it in sync with
// `Analysis::columns`.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalRevenueRow {
  pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRevenue {
  pub name:       String,
  pub units_sold: i64,
  pub revenue:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRevenue {
  pub city:       String,
  pub units_sold: i64,
  pub revenue:    f64,
}

/// The structured outcome of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
  /// `None` when no sale joined to a product.
  TotalRevenue(Option<f64>),
  RevenueByProduct(Vec<ProductRevenue>),
  RevenueByRegion(Vec<RegionRevenue>),
}

impl AnalysisResult {
  pub fn analysis(&self) -> Analysis {
    match self {
      Self::TotalRevenue(_) => Analysis::TotalRevenue,
      Self::RevenueByProduct(_) => Analysis::RevenueByProduct,
      Self::RevenueByRegion(_) => Analysis::RevenueByRegion,
    }
  }

  /// `true` when there is nothing to report.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::TotalRevenue(total) => total.is_none(),
      Self::RevenueByProduct(rows) => rows.is_empty(),
      Self::RevenueByRegion(rows) => rows.is_empty(),
    }
  }

  /// Serialise as a JSON array of records, one object per result row, with
  /// keys in [`Analysis::columns`] order.
  pub fn to_json(&self) -> Result<String> {
    let json = match self {
      Self::TotalRevenue(total) => {
        let rows: Vec<TotalRevenueRow> = total
          .iter()
          .map(|&total_revenue| TotalRevenueRow { total_revenue })
          .collect();
        serde_json::to_string(&rows)?
      }
      Self::RevenueByProduct(rows) => serde_json::to_string(rows)?,
      Self::RevenueByRegion(rows) => serde_json::to_string(rows)?,
    };
    Ok(json)
  }
}

// ─── Run status ──────────────────────────────────────────────────────────────

/// What happened to one analysis during a catalogue run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisStatus {
  /// A snapshot was appended to the analysis log.
  Recorded {
    snapshot_id: i64,
    recorded_at: DateTime<Utc>,
  },
  /// The analysis ran but had nothing to report; no snapshot was written.
  NoData,
  /// The analysis failed; no snapshot was written.
  Failed { error: String },
}

/// The status of one named analysis within a catalogue run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
  pub analysis: Analysis,
  #[serde(flatten)]
  pub status:   AnalysisStatus,
}
