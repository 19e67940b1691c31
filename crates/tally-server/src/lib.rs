//! Wiring for the `tally` binary: configuration, store and source setup.

pub mod settings;

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Context as _;
use tally_pipeline::{
  Pipeline,
  source::{AnySource, DirectorySource, HttpSource},
};
use tally_store_sqlite::SqliteStore;

pub use settings::ServerConfig;

/// The pipeline type served by the binary.
pub type AppPipeline = Pipeline<SqliteStore, AnySource>;

/// Open the SQLite store named by `config`, creating its parent directory
/// when needed.
pub async fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let path = config.store_path();
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;
  store
    .set_busy_timeout(Duration::from_millis(config.busy_timeout_ms))
    .await
    .context("failed to set busy timeout")?;

  tracing::debug!(path = %path.display(), "store opened");
  Ok(store)
}

/// Build the source provider: files below `data_dir`, URLs over HTTP.
pub fn source(config: &ServerConfig) -> anyhow::Result<AnySource> {
  let http = HttpSource::new(
    config.source_base_url.clone(),
    Duration::from_secs(config.http_timeout_secs),
  )
  .context("failed to build HTTP client")?;
  Ok(AnySource { dir: DirectorySource::new(config.data_dir()), http })
}

/// Open everything the binary needs.
pub async fn pipeline(config: &ServerConfig) -> anyhow::Result<AppPipeline> {
  let store = open_store(config).await?;
  let source = source(config)?;
  Ok(Pipeline::new(Arc::new(store), Arc::new(source)))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> std::path::PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return std::path::PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
