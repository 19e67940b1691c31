//! Ingestion and analysis pipeline for Tally.
//!
//! ```text
//! source ─ fetch ─▶ tally_csv::read ─▶ identity::filter_new ─▶ writer::write
//!                                                               │
//!          recorder::record ◀─ engine::run_catalog ◀────────────┘
//! ```
//!
//! [`Pipeline`] ties the stages to a [`SalesStore`] and a
//! [`SourceProvider`], both passed in explicitly.

pub mod engine;
pub mod error;
pub mod identity;
pub mod recorder;
pub mod source;
pub mod writer;

use std::sync::Arc;

use serde::Serialize;
use tally_core::{
  analysis::AnalysisReport,
  record::{Product, Sale, Store},
  snapshot::AnalysisSnapshot,
  source::SourceProvider,
  store::SalesStore,
  table::{Table, WritePolicy},
};
use tally_csv::ReadOutcome;

pub use error::{Error, Result};

/// The standard extracts and the order they are imported in: stores and
/// products before the sales that reference them.
pub const STANDARD_SOURCES: [(Table, &str); 3] = [
  (Table::Stores, "magasins.csv"),
  (Table::Products, "produits.csv"),
  (Table::Sales, "ventes.csv"),
];

// ─── Reports ─────────────────────────────────────────────────────────────────

/// A row dropped while reading a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
  pub line:   u64,
  pub reason: String,
}

/// The outcome of importing one source into one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
  pub table:              Table,
  pub source_name:        String,
  pub written:            usize,
  /// Records whose natural key was already known.
  pub skipped_duplicates: usize,
  /// Rows dropped by validation.
  pub rejected:           Vec<Rejection>,
}

/// Per-table outcome of [`Pipeline::import_all`].
#[derive(Debug)]
pub struct ImportOutcome {
  pub table:       Table,
  pub source_name: String,
  pub result:      Result<IngestionReport>,
}

/// Current content of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableRows {
  Products(Vec<Product>),
  Stores(Vec<Store>),
  Sales(Vec<Sale>),
  AnalysisLog(Vec<AnalysisSnapshot>),
}

impl TableRows {
  pub fn len(&self) -> usize {
    match self {
      Self::Products(rows) => rows.len(),
      Self::Stores(rows) => rows.len(),
      Self::Sales(rows) => rows.len(),
      Self::AnalysisLog(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
  pub table: Table,
  pub rows:  u64,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Entry point for the HTTP layer and CLI.
///
/// Cloning is cheap — both collaborators are reference-counted.
pub struct Pipeline<S, P> {
  store:  Arc<S>,
  source: Arc<P>,
}

impl<S, P> Clone for Pipeline<S, P> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), source: Arc::clone(&self.source) }
  }
}

impl<S, P> Pipeline<S, P>
where
  S: SalesStore,
  P: SourceProvider,
{
  pub fn new(store: Arc<S>, source: Arc<P>) -> Self { Self { store, source } }

  pub fn store(&self) -> &S { &self.store }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// All current rows of `table`.
  pub async fn list(&self, table: Table) -> Result<TableRows> {
    let rows = match table {
      Table::Products => {
        TableRows::Products(self.store.list_products().await.map_err(Error::store)?)
      }
      Table::Stores => {
        TableRows::Stores(self.store.list_stores().await.map_err(Error::store)?)
      }
      Table::Sales => {
        TableRows::Sales(self.store.list_sales().await.map_err(Error::store)?)
      }
      Table::AnalysisLog => TableRows::AnalysisLog(self.list_snapshots().await?),
    };
    Ok(rows)
  }

  /// The analysis log, oldest first.
  pub async fn list_snapshots(&self) -> Result<Vec<AnalysisSnapshot>> {
    self.store.list_snapshots().await.map_err(Error::store)
  }

  /// Names of the tables present in storage.
  pub async fn list_table_names(&self) -> Result<Vec<String>> {
    self.store.table_names().await.map_err(Error::store)
  }

  /// Row counts of the entity tables.
  pub async fn table_counts(&self) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(3);
    for table in [Table::Sales, Table::Products, Table::Stores] {
      let rows = self.store.count_rows(table).await.map_err(Error::store)?;
      counts.push(TableCount { table, rows });
    }
    Ok(counts)
  }

  // ── Ingestion ─────────────────────────────────────────────────────────────

  /// Fetch `source_name`, read it as `table` records, drop known keys and
  /// write the rest under the table's policy.
  ///
  /// Nothing is written when the source is unavailable or unreadable.
  pub async fn run_ingestion(
    &self,
    table: Table,
    source_name: &str,
  ) -> Result<IngestionReport> {
    let Some(policy) = table.policy() else {
      return Err(tally_csv::Error::NoMapping(table).into());
    };

    let bytes = self.source.fetch(source_name).await?;
    let ReadOutcome { batch, rejected } = tally_csv::read(&bytes, table)?;

    let (batch, skipped_duplicates) = match policy {
      WritePolicy::AppendWithDedup => identity::filter_new(&*self.store, batch).await?,
      WritePolicy::FullReplace => (batch, 0),
    };

    let written = writer::write(&*self.store, policy, batch).await?;

    tracing::info!(
      %table,
      source = source_name,
      written,
      skipped_duplicates,
      rejected = rejected.len(),
      "ingestion complete"
    );

    Ok(IngestionReport {
      table,
      source_name: source_name.to_owned(),
      written,
      skipped_duplicates,
      rejected: rejected
        .into_iter()
        .map(|r| Rejection { line: r.line, reason: r.reason.to_string() })
        .collect(),
    })
  }

  /// Import several sources in order, continuing past failures.
  pub async fn import_all(&self, sources: &[(Table, String)]) -> Vec<ImportOutcome> {
    let mut outcomes = Vec::with_capacity(sources.len());
    for (table, source_name) in sources {
      let result = self.run_ingestion(*table, source_name).await;
      if let Err(e) = &result {
        tracing::warn!(%table, source = %source_name, error = %e, "import failed");
      }
      outcomes.push(ImportOutcome {
        table: *table,
        source_name: source_name.clone(),
        result,
      });
    }
    outcomes
  }

  // ── Analyses ──────────────────────────────────────────────────────────────

  /// Run the whole analysis catalogue, recording every non-empty result.
  pub async fn run_all_analyses(&self) -> Vec<AnalysisReport> {
    match self.table_counts().await {
      Ok(counts) => {
        for TableCount { table, rows } in counts {
          tracing::info!(%table, rows, "table size before analysis");
        }
      }
      Err(e) => tracing::warn!(error = %e, "could not count table rows"),
    }

    engine::run_catalog(&*self.store).await
  }
}

#[cfg(test)]
mod tests;
