//! Read-only handlers over the stored tables.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | All products |
//! | `GET`  | `/stores` | All stores |
//! | `GET`  | `/sales` | The current sales batch |
//! | `GET`  | `/tables` | Table names present in storage |
//! | `GET`  | `/counts` | Row count per entity table |

use axum::{Json, extract::State};
use tally_core::{source::SourceProvider, store::SalesStore, table::Table};
use tally_pipeline::{Pipeline, TableCount, TableRows};

use crate::error::ApiError;

async fn rows<S, P>(pipeline: &Pipeline<S, P>, table: Table) -> Result<Json<TableRows>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  Ok(Json(pipeline.list(table).await?))
}

/// `GET /products`
pub async fn products<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> Result<Json<TableRows>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  rows(&pipeline, Table::Products).await
}

/// `GET /stores`
pub async fn stores<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> Result<Json<TableRows>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  rows(&pipeline, Table::Stores).await
}

/// `GET /sales`
pub async fn sales<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> Result<Json<TableRows>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  rows(&pipeline, Table::Sales).await
}

/// `GET /tables`
pub async fn names<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  Ok(Json(pipeline.list_table_names().await?))
}

/// `GET /counts`
pub async fn counts<S, P>(
  State(pipeline): State<Pipeline<S, P>>,
) -> Result<Json<Vec<TableCount>>, ApiError>
where
  S: SalesStore,
  P: SourceProvider,
{
  Ok(Json(pipeline.table_counts().await?))
}
