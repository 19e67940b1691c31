//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`. Timestamps are stored as RFC 3339
//! UTC strings with a fixed microsecond width, so text order equals time
//! order.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, SubsecRound, Utc};
use tally_core::{
  record::Sale,
  snapshot::AnalysisSnapshot,
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// The timestamp for a new snapshot: `now` at microsecond precision, bumped
/// one microsecond past `latest` when the clock has not moved beyond it.
pub fn next_timestamp(
  now: DateTime<Utc>,
  latest: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
  let now = now.trunc_subsecs(6);
  match latest {
    Some(latest) if now <= latest => latest + Duration::microseconds(1),
    _ => now,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `sales` row.
pub struct RawSale {
  pub date:                 String,
  pub product_reference_id: String,
  pub store_id:             i64,
  pub quantity:             i64,
}

impl RawSale {
  pub fn into_sale(self) -> Result<Sale> {
    Ok(Sale {
      date:                 decode_date(&self.date)?,
      product_reference_id: self.product_reference_id,
      store_id:             self.store_id,
      quantity:             self.quantity,
    })
  }
}

/// Raw values read directly from an `analysis_log` row.
pub struct RawSnapshot {
  pub id:            i64,
  pub recorded_at:   String,
  pub analysis_name: String,
  pub result:        String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<AnalysisSnapshot> {
    Ok(AnalysisSnapshot {
      id:            self.id,
      recorded_at:   decode_dt(&self.recorded_at)?,
      analysis_name: self.analysis_name.parse()?,
      result:        self.result,
    })
  }
}
