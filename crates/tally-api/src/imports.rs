//! Handler for `POST /imports/{table}`.
//!
//! Body: `{"source": "produits.csv"}`. The source is a name below the data
//! directory or an `http(s)://` URL, depending on the configured provider.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use tally_core::{source::SourceProvider, store::SalesStore, table::Table};
use tally_pipeline::{IngestionReport, Pipeline};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub source: String,
}

/// `POST /imports/{table}`
pub async fn import_one<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
  Path(table): Path<String>,
  Json(body): Json<ImportBody>,
) -> Result<Json<IngestionReport>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  let table: Table = table.parse().map_err(tally_pipeline::Error::from)?;
  if body.source.trim().is_empty() {
    return Err(ApiError::BadRequest("source must not be empty".into()));
  }
  let report = pipeline.run_ingestion(table, &body.source).await?;
  Ok(Json(report))
}
