//! Handlers for `/analyses`.
//!
//! `GET` lists the analysis log oldest first. `POST` runs the whole catalogue
//! and answers `201 Created` with one status per analysis, whether or not it
//! recorded anything.

use axum::{Json, extract::State, http::StatusCode};
use tally_core::{
  analysis::AnalysisReport,
  snapshot::AnalysisSnapshot,
  source::SourceProvider,
  store::SalesStore,
};
use tally_pipeline::Pipeline;

use crate::error::ApiError;

/// `GET /analyses`
pub async fn list<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> Result<Json<Vec<AnalysisSnapshot>>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  Ok(Json(pipeline.list_snapshots().await?))
}

/// `POST /analyses`, `POST /execute_analyses`
pub async fn execute<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> (StatusCode, Json<Vec<AnalysisReport>>)
where
  S: SalesStore,
  P: SourceProvider,
{
  let reports = pipeline.run_all_analyses().await;
  (StatusCode::CREATED, Json(reports))
}
