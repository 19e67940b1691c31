//! Analysis snapshots — the rows of the append-only `analysis_log` table.
//!
//! A snapshot is never updated or deleted. Re-running an analysis always
//! appends a new snapshot, even when the result is unchanged: the log is a
//! history, not a cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;

/// A recorded analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
  /// Store-assigned, increasing with `recorded_at`.
  pub id:            i64,
  /// Server-assigned timestamp; strictly greater than every earlier
  /// snapshot's.
  pub recorded_at:   DateTime<Utc>,
  pub analysis_name: Analysis,
  /// The result serialised as a JSON array of records.
  pub result:        String,
}

/// Input to [`crate::store::SalesStore::append_snapshot`].
/// `id` and `recorded_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
  pub analysis: Analysis,
  pub result:   String,
}
