//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by a [`tally_pipeline::Pipeline`] over any
//! [`SalesStore`] and [`SourceProvider`]. Tracing layers, TLS and binding are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = tally_api::api_router(pipeline).layer(TraceLayer::new_for_http());
//! ```

pub mod analyses;
pub mod error;
pub mod imports;
pub mod tables;

use axum::{
  Router,
  routing::{get, post},
};
use tally_core::{source::SourceProvider, store::SalesStore};
use tally_pipeline::Pipeline;

pub use error::ApiError;

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(pipeline: Pipeline<S, P>) -> Router<()>
where
  S: SalesStore + 'static,
  P: SourceProvider + 'static,
{
  Router::new()
    // Entity tables
    .route("/products", get(tables::products::<S, P>))
    .route("/stores", get(tables::stores::<S, P>))
    .route("/sales", get(tables::sales::<S, P>))
    .route("/tables", get(tables::names::<S, P>))
    .route("/counts", get(tables::counts::<S, P>))
    // Analyses
    .route("/analyses", get(analyses::list::<S, P>).post(analyses::execute::<S, P>))
    .route("/execute_analyses", post(analyses::execute::<S, P>))
    // Ingestion
    .route("/imports/{table}", post(imports::import_one::<S, P>))
    .with_state(pipeline)
}
