//! The `SalesStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-pipeline`, `tally-api`) depend on this abstraction,
//! not on any concrete backend.

use std::{collections::HashSet, future::Future};

use crate::{
  analysis::{Analysis, AnalysisResult},
  record::{Product, Sale, Store},
  snapshot::{AnalysisSnapshot, NewSnapshot},
  table::Table,
};

/// Abstraction over the relational store holding the four pipeline tables.
///
/// Every write is atomic at the table level: a failed call leaves the table
/// exactly as it was. The `analysis_log` table is append-only.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SalesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  fn list_stores(
    &self,
  ) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send + '_;

  fn list_sales(
    &self,
  ) -> impl Future<Output = Result<Vec<Sale>, Self::Error>> + Send + '_;

  /// All snapshots, oldest first.
  fn list_snapshots(
    &self,
  ) -> impl Future<Output = Result<Vec<AnalysisSnapshot>, Self::Error>> + Send + '_;

  /// Names of the tables currently present in storage.
  fn table_names(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn count_rows(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Key-set scans ─────────────────────────────────────────────────────

  /// Every stored `Product::reference_id`, in a single scan.
  fn product_keys(
    &self,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  /// Every stored `Store::store_id`, in a single scan.
  fn store_keys(
    &self,
  ) -> impl Future<Output = Result<HashSet<i64>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Append products in one transaction; returns the number of rows written.
  fn append_products(
    &self,
    rows: Vec<Product>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Append stores in one transaction; returns the number of rows written.
  fn append_stores(
    &self,
    rows: Vec<Store>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Atomically replace the whole `sales` table with `rows`. Readers never
  /// observe a partially replaced table.
  fn replace_sales(
    &self,
    rows: Vec<Sale>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Analyses ──────────────────────────────────────────────────────────

  /// Execute one catalogue analysis against the current table contents.
  /// Sales whose product or store is unknown are excluded.
  fn run_analysis(
    &self,
    analysis: Analysis,
  ) -> impl Future<Output = Result<AnalysisResult, Self::Error>> + Send + '_;

  /// Append a snapshot to the analysis log. The store assigns `id` and a
  /// `recorded_at` strictly later than every existing snapshot.
  fn append_snapshot(
    &self,
    input: NewSnapshot,
  ) -> impl Future<Output = Result<AnalysisSnapshot, Self::Error>> + Send + '_;
}
