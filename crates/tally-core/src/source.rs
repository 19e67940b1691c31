//! The `SourceProvider` trait — where raw tabular bytes come from.
//!
//! Files on disk and HTTP downloads both reduce to a byte stream; the rest of
//! the pipeline treats every origin identically once bytes are obtained.

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;

/// A source could not be fetched (missing file, network failure, non-success
/// HTTP status).
#[derive(Debug, Error)]
#[error("source {source_name:?} unavailable: {reason}")]
pub struct SourceUnavailable {
  pub source_name: String,
  pub reason:      String,
}

impl SourceUnavailable {
  pub fn new(source_name: impl Into<String>, reason: impl ToString) -> Self {
    Self { source_name: source_name.into(), reason: reason.to_string() }
  }
}

/// Resolves a logical source name to raw bytes.
pub trait SourceProvider: Send + Sync {
  fn fetch<'a>(
    &'a self,
    source_name: &'a str,
  ) -> impl Future<Output = Result<Bytes, SourceUnavailable>> + Send + 'a;
}
