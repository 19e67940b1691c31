//! Error types for the tally-csv reader.

use tally_core::table::Table;
use thiserror::Error;

/// A batch-level failure: the stream cannot be turned into records at all.
/// Nothing from such a stream may be written.
#[derive(Debug, Error)]
pub enum Error {
  #[error("no column mapping registered for table {0}")]
  NoMapping(Table),

  #[error("missing header row")]
  MissingHeader,

  #[error("required column {field:?} for table {table} not found in header")]
  MissingColumn { table: Table, field: &'static str },

  #[error("malformed CSV: {0}")]
  Csv(#[from] csv::Error),
}

/// Why a single row was dropped. Row errors never abort the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
  #[error("missing value for {0}")]
  Missing(&'static str),

  #[error("{field} is not valid UTF-8")]
  Encoding { field: &'static str },

  #[error("invalid {field} {value:?}: expected {expected}")]
  Invalid {
    field:    &'static str,
    value:    String,
    expected: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
