//! Tabular byte-stream providers: a data directory and HTTP.

use std::{
  path::{Component, Path, PathBuf},
  time::Duration,
};

use bytes::Bytes;
use reqwest::Client;
use tally_core::source::{SourceProvider, SourceUnavailable};

fn is_url(name: &str) -> bool {
  name.starts_with("http://") || name.starts_with("https://")
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Reads sources as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
  root: PathBuf,
}

impl DirectorySource {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Resolve `name` below the root. Absolute paths and `..` are refused so a
  /// source name can never escape the data directory.
  fn resolve(&self, name: &str) -> Result<PathBuf, SourceUnavailable> {
    let relative = Path::new(name);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes {
      return Err(SourceUnavailable::new(
        name,
        "not a relative path inside the data directory",
      ));
    }
    Ok(self.root.join(relative))
  }
}

impl SourceProvider for DirectorySource {
  async fn fetch(&self, source_name: &str) -> Result<Bytes, SourceUnavailable> {
    let path = self.resolve(source_name)?;
    let data = tokio::fs::read(&path)
      .await
      .map_err(|e| SourceUnavailable::new(source_name, format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read source file");
    Ok(Bytes::from(data))
  }
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// Downloads sources over HTTP, either from absolute URLs or relative to a
/// base URL.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpSource {
  client:   Client,
  base_url: Option<String>,
}

impl HttpSource {
  pub fn new(base_url: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base_url })
  }

  fn url(&self, name: &str) -> Result<String, SourceUnavailable> {
    if is_url(name) {
      return Ok(name.to_owned());
    }
    match &self.base_url {
      Some(base) => Ok(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        name.trim_start_matches('/')
      )),
      None => Err(SourceUnavailable::new(name, "no base URL configured")),
    }
  }
}

impl SourceProvider for HttpSource {
  async fn fetch(&self, source_name: &str) -> Result<Bytes, SourceUnavailable> {
    let url = self.url(source_name)?;
    let fail = |e: reqwest::Error| SourceUnavailable::new(source_name, e);

    let resp = self.client.get(&url).send().await.map_err(fail)?;
    let resp = resp.error_for_status().map_err(fail)?;
    let body = resp.bytes().await.map_err(fail)?;

    tracing::debug!(%url, bytes = body.len(), "downloaded source");
    Ok(body)
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Sends `http://` and `https://` names to [`HttpSource`] and everything else
/// to [`DirectorySource`].
#[derive(Debug, Clone)]
pub struct AnySource {
  pub dir:  DirectorySource,
  pub http: HttpSource,
}

impl SourceProvider for AnySource {
  async fn fetch(&self, source_name: &str) -> Result<Bytes, SourceUnavailable> {
    if is_url(source_name) {
      self.http.fetch(source_name).await
    } else {
      self.dir.fetch(source_name).await
    }
  }
}
