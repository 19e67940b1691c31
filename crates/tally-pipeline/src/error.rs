//! Error type for `tally-pipeline`.

use tally_core::{analysis::Analysis, source::SourceUnavailable, table::{Table, WritePolicy}};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The source could not be read as records; nothing was written.
  #[error("source format error: {0}")]
  SourceFormat(#[from] tally_csv::Error),

  /// The source could not be fetched; nothing was written.
  #[error(transparent)]
  SourceUnavailable(#[from] SourceUnavailable),

  /// The store rejected a write; the table is unchanged.
  #[error("failed to write {attempted} rows to {table}: {source}")]
  IngestionWrite {
    table:     Table,
    attempted: usize,
    #[source]
    source:    BoxError,
  },

  #[error("{policy:?} cannot be applied to {table}")]
  PolicyMismatch { table: Table, policy: WritePolicy },

  /// One catalogue analysis failed to execute.
  #[error("analysis {analysis} failed: {source}")]
  Aggregation {
    analysis: Analysis,
    #[source]
    source:   BoxError,
  },

  #[error("no data to record for {0}")]
  EmptyResult(Analysis),

  #[error("failed to record snapshot for {analysis}: {source}")]
  SnapshotWrite {
    analysis: Analysis,
    #[source]
    source:   BoxError,
  },

  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
