//! The four named tables and the persistence policy attached to each entity
//! table.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A table owned by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
  Products,
  Stores,
  Sales,
  /// The append-only log of analysis snapshots.
  AnalysisLog,
}

/// How an ingested batch is persisted into its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
  /// Rows whose natural key is already stored are skipped; the rest are
  /// appended.
  AppendWithDedup,
  /// The whole table content is atomically replaced by the batch.
  FullReplace,
}

impl Table {
  pub const ALL: [Table; 4] =
    [Self::Products, Self::Stores, Self::Sales, Self::AnalysisLog];

  /// The SQL table name.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Products => "products",
      Self::Stores => "stores",
      Self::Sales => "sales",
      Self::AnalysisLog => "analysis_log",
    }
  }

  /// The write policy for ingestion into this table, or `None` when the table
  /// is not fed by ingestion.
  pub fn policy(self) -> Option<WritePolicy> {
    match self {
      Self::Products | Self::Stores => Some(WritePolicy::AppendWithDedup),
      Self::Sales => Some(WritePolicy::FullReplace),
      Self::AnalysisLog => None,
    }
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Table {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| Error::UnknownTable(s.to_owned()))
  }
}
