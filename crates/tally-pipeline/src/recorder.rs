//! Snapshot recorder: appends analysis results to the analysis log.
//!
//! Recording is not idempotent. Every call appends a new snapshot, even when
//! the result equals the previous one.

use tally_core::{
  analysis::AnalysisResult,
  snapshot::{AnalysisSnapshot, NewSnapshot},
  store::SalesStore,
};

use crate::error::{Error, Result};

/// Serialise `result` and append it to the analysis log.
///
/// Empty results are refused: "ran with nothing to report" is never logged.
pub async fn record<S: SalesStore>(
  store: &S,
  result: &AnalysisResult,
) -> Result<AnalysisSnapshot> {
  let analysis = result.analysis();
  if result.is_empty() {
    return Err(Error::EmptyResult(analysis));
  }

  let input = NewSnapshot { analysis, result: result.to_json()? };
  store
    .append_snapshot(input)
    .await
    .map_err(|e| Error::SnapshotWrite { analysis, source: Box::new(e) })
}
