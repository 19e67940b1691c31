//! Runtime configuration.
//!
//! Layered, lowest priority first: built-in defaults, an optional TOML file,
//! then `TALLY_*` environment variables. Nested keys use a double underscore,
//! e.g. `TALLY_SOURCES__SALES=ventes_2024.csv`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tally_core::table::Table;

use crate::expand_tilde;

/// Source names used by `import-all`, per entity table.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SourceNames {
  pub stores:   String,
  pub products: String,
  pub sales:    String,
}

impl Default for SourceNames {
  fn default() -> Self {
    let [(_, stores), (_, products), (_, sales)] = tally_pipeline::STANDARD_SOURCES;
    Self { stores: stores.into(), products: products.into(), sales: sales.into() }
  }
}

impl SourceNames {
  /// Import order: stores and products before sales.
  pub fn ordered(&self) -> Vec<(Table, String)> {
    vec![
      (Table::Stores, self.stores.clone()),
      (Table::Products, self.products.clone()),
      (Table::Sales, self.sales.clone()),
    ]
  }
}

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Root for relative source names.
  pub data_dir:          PathBuf,
  /// Base for relative source names fetched over HTTP.
  pub source_base_url:   Option<String>,
  pub http_timeout_secs: u64,
  pub busy_timeout_ms:   u64,
  pub sources:           SourceNames,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "0.0.0.0".into(),
      port:              5000,
      store_path:        PathBuf::from("data/database.db"),
      data_dir:          PathBuf::from("data"),
      source_base_url:   None,
      http_timeout_secs: 30,
      busy_timeout_ms:   5000,
      sources:           SourceNames::default(),
    }
  }
}

impl ServerConfig {
  /// Load from `path` (which may be absent) and the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("TALLY")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  /// Parse a TOML document, without consulting the environment.
  pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn data_dir(&self) -> PathBuf { expand_tilde(&self.data_dir) }
}
