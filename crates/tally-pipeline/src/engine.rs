//! Aggregation engine: runs the fixed analysis catalogue and records each
//! non-empty result.
//!
//! Analyses are independent. A failing analysis is reported under its own
//! name and does not stop the others.

use tally_core::{
  analysis::{Analysis, AnalysisReport, AnalysisResult, AnalysisStatus},
  store::SalesStore,
};

use crate::{
  error::{Error, Result},
  recorder,
};

/// Execute one analysis against the current table contents.
pub async fn run<S: SalesStore>(store: &S, analysis: Analysis) -> Result<AnalysisResult> {
  store
    .run_analysis(analysis)
    .await
    .map_err(|e| Error::Aggregation { analysis, source: Box::new(e) })
}

/// Run one analysis and record it when it has data.
async fn run_and_record<S: SalesStore>(store: &S, analysis: Analysis) -> Result<AnalysisStatus> {
  let result = run(store, analysis).await?;
  if result.is_empty() {
    tracing::info!(%analysis, "no data");
    return Ok(AnalysisStatus::NoData);
  }

  let snapshot = recorder::record(store, &result).await?;
  tracing::info!(
    %analysis,
    snapshot_id = snapshot.id,
    recorded_at = %snapshot.recorded_at,
    "analysis recorded"
  );
  Ok(AnalysisStatus::Recorded {
    snapshot_id: snapshot.id,
    recorded_at: snapshot.recorded_at,
  })
}

/// Run the whole catalogue, in [`Analysis::ALL`] order.
pub async fn run_catalog<S: SalesStore>(store: &S) -> Vec<AnalysisReport> {
  let mut reports = Vec::with_capacity(Analysis::ALL.len());

  for analysis in Analysis::ALL {
    let status = match run_and_record(store, analysis).await {
      Ok(status) => status,
      Err(e) => {
        tracing::warn!(%analysis, error = %e, "analysis failed");
        AnalysisStatus::Failed { error: e.to_string() }
      }
    };
    reports.push(AnalysisReport { analysis, status });
  }

  reports
}
