//! End-to-end pipeline tests against an in-memory SQLite store.

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use bytes::Bytes;
use tally_core::{
  analysis::{Analysis, AnalysisReport, AnalysisResult, AnalysisStatus},
  record::{Product, Sale, Store},
  snapshot::{AnalysisSnapshot, NewSnapshot},
  source::{SourceProvider, SourceUnavailable},
  store::SalesStore,
  table::Table,
};
use tally_store_sqlite::SqliteStore;

use crate::{Error, Pipeline, TableRows};

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Sources served from memory.
#[derive(Default)]
struct MemorySource(HashMap<String, Bytes>);

impl MemorySource {
  fn with(mut self, name: &str, body: &str) -> Self {
    self.0.insert(name.to_owned(), Bytes::from(body.to_owned()));
    self
  }
}

impl SourceProvider for MemorySource {
  async fn fetch(&self, source_name: &str) -> Result<Bytes, SourceUnavailable> {
    self
      .0
      .get(source_name)
      .cloned()
      .ok_or_else(|| SourceUnavailable::new(source_name, "no such source"))
  }
}

const PRODUCTS: &str = "Nom,ID Référence produit,Prix,Stock\n\
                        Widget,P1,10.0,100\n\
                        Gadget,P2,2.5,30\n";

const STORES: &str = "ID Magasin,Ville,Nombre de salariés\n\
                      1,Paris,10\n\
                      2,Lyon,4\n";

const SALES_A: &str = "Date,ID Référence produit,Quantité,ID Magasin\n\
                       2024-01-15,P1,2,1\n\
                       2024-01-15,P1,3,1\n";

const SALES_B: &str = "Date,ID Référence produit,Quantité,ID Magasin\n\
                       2024-01-15,P1,2,1\n\
                       2024-01-16,P2,4,2\n";

fn source() -> MemorySource {
  MemorySource::default()
    .with("produits.csv", PRODUCTS)
    .with("magasins.csv", STORES)
    .with("ventes.csv", SALES_A)
    .with("ventes_b.csv", SALES_B)
}

async fn pipeline_with(source: MemorySource) -> Pipeline<SqliteStore, MemorySource> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  Pipeline::new(Arc::new(store), Arc::new(source))
}

async fn pipeline() -> Pipeline<SqliteStore, MemorySource> { pipeline_with(source()).await }

fn status_of(reports: &[AnalysisReport], analysis: Analysis) -> &AnalysisStatus {
  &reports
    .iter()
    .find(|r| r.analysis == analysis)
    .expect("analysis reported")
    .status
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn importing_products_twice_is_idempotent() {
  let p = pipeline().await;

  let first = p.run_ingestion(Table::Products, "produits.csv").await.unwrap();
  assert_eq!(first.written, 2);
  assert_eq!(first.skipped_duplicates, 0);
  let after_first = p.list(Table::Products).await.unwrap();

  let second = p.run_ingestion(Table::Products, "produits.csv").await.unwrap();
  assert_eq!(second.written, 0);
  assert_eq!(second.skipped_duplicates, 2);

  assert_eq!(p.list(Table::Products).await.unwrap(), after_first);
}

#[tokio::test]
async fn duplicate_keys_within_a_batch_keep_the_first_row() {
  let p = pipeline_with(MemorySource::default().with(
    "magasins.csv",
    "ID Magasin,Ville,Nombre de salariés\n1,Paris,10\n1,Marseille,3\n",
  ))
  .await;

  let report = p.run_ingestion(Table::Stores, "magasins.csv").await.unwrap();
  assert_eq!(report.written, 1);
  assert_eq!(report.skipped_duplicates, 1);

  let TableRows::Stores(stores) = p.list(Table::Stores).await.unwrap() else {
    panic!("wrong table");
  };
  assert_eq!(stores, vec![Store { store_id: 1, city: "Paris".into(), employee_count: 10 }]);
}

#[tokio::test]
async fn known_key_with_new_price_is_not_updated() {
  let p = pipeline_with(
    MemorySource::default()
      .with("v1.csv", "Nom,ID Référence produit,Prix,Stock\nWidget,P1,10.0,1\n")
      .with("v2.csv", "Nom,ID Référence produit,Prix,Stock\nWidget,P1,12.0,1\n"),
  )
  .await;

  p.run_ingestion(Table::Products, "v1.csv").await.unwrap();
  p.run_ingestion(Table::Products, "v2.csv").await.unwrap();

  let TableRows::Products(products) = p.list(Table::Products).await.unwrap() else {
    panic!("wrong table");
  };
  assert_eq!(products, vec![Product {
    name:         "Widget".into(),
    reference_id: "P1".into(),
    price:        10.0,
    stock:        1,
  }]);
}

#[tokio::test]
async fn sales_import_fully_replaces_previous_batch() {
  let p = pipeline().await;

  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();
  let report = p.run_ingestion(Table::Sales, "ventes_b.csv").await.unwrap();
  assert_eq!(report.written, 2);
  assert_eq!(report.skipped_duplicates, 0);

  let TableRows::Sales(sales) = p.list(Table::Sales).await.unwrap() else {
    panic!("wrong table");
  };
  let quantities: Vec<(String, i64)> = sales
    .iter()
    .map(|s: &Sale| (s.product_reference_id.clone(), s.quantity))
    .collect();
  assert_eq!(quantities, vec![("P1".into(), 2), ("P2".into(), 4)]);
}

#[tokio::test]
async fn rejected_rows_are_reported_alongside_written_rows() {
  let p = pipeline_with(MemorySource::default().with(
    "ventes.csv",
    "Date,ID Référence produit,Quantité,ID Magasin\n\
     2024-01-15,P1,2,1\n\
     someday,P1,2,1\n\
     2024-01-15,P1,lots,1\n",
  ))
  .await;

  let report = p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();
  assert_eq!(report.written, 1);
  assert_eq!(report.rejected.len(), 2);
  assert_eq!(report.rejected[0].line, 3);
  assert!(report.rejected[1].reason.contains("quantity"));
}

#[tokio::test]
async fn unavailable_source_writes_nothing() {
  let p = pipeline().await;
  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();

  let err = p.run_ingestion(Table::Sales, "missing.csv").await.unwrap_err();
  assert!(matches!(err, Error::SourceUnavailable(_)));
  assert_eq!(p.list(Table::Sales).await.unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_source_writes_nothing() {
  let p = pipeline_with(
    source().with("broken.csv", "Date,Produit,Quantité\n2024-01-15,P1,3\n"),
  )
  .await;
  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();

  let err = p.run_ingestion(Table::Sales, "broken.csv").await.unwrap_err();
  assert!(matches!(
    err,
    Error::SourceFormat(tally_csv::Error::MissingColumn { .. })
  ));
  assert_eq!(p.list(Table::Sales).await.unwrap().len(), 2);
}

#[tokio::test]
async fn analysis_log_cannot_be_ingested() {
  let p = pipeline().await;
  let err = p
    .run_ingestion(Table::AnalysisLog, "produits.csv")
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::SourceFormat(tally_csv::Error::NoMapping(Table::AnalysisLog))
  ));
}

#[tokio::test]
async fn import_all_continues_past_a_missing_source() {
  let p = pipeline_with(
    MemorySource::default()
      .with("magasins.csv", STORES)
      .with("ventes.csv", SALES_A),
  )
  .await;

  let sources: Vec<(Table, String)> = crate::STANDARD_SOURCES
    .iter()
    .map(|(t, name)| (*t, (*name).to_owned()))
    .collect();
  let outcomes = p.import_all(&sources).await;

  let ok: Vec<(Table, bool)> = outcomes.iter().map(|o| (o.table, o.result.is_ok())).collect();
  assert_eq!(ok, vec![
    (Table::Stores, true),
    (Table::Products, false),
    (Table::Sales, true),
  ]);
}

// ─── Analyses ────────────────────────────────────────────────────────────────

async fn loaded() -> Pipeline<SqliteStore, MemorySource> {
  let p = pipeline().await;
  p.run_ingestion(Table::Products, "produits.csv").await.unwrap();
  p.run_ingestion(Table::Stores, "magasins.csv").await.unwrap();
  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();
  p
}

fn snapshots(rows: TableRows) -> Vec<AnalysisSnapshot> {
  match rows {
    TableRows::AnalysisLog(rows) => rows,
    other => panic!("expected analysis log, got {other:?}"),
  }
}

#[tokio::test]
async fn reference_scenario_is_recorded() {
  let p = loaded().await;

  let reports = p.run_all_analyses().await;
  for analysis in Analysis::ALL {
    assert!(matches!(status_of(&reports, analysis), AnalysisStatus::Recorded { .. }));
  }

  let log = snapshots(p.list(Table::AnalysisLog).await.unwrap());
  let results: Vec<(Analysis, &str)> = log
    .iter()
    .map(|s| (s.analysis_name, s.result.as_str()))
    .collect();
  assert_eq!(results, vec![
    (Analysis::TotalRevenue, r#"[{"total_revenue":50.0}]"#),
    (
      Analysis::RevenueByProduct,
      r#"[{"name":"Widget","units_sold":5,"revenue":50.0}]"#,
    ),
    (
      Analysis::RevenueByRegion,
      r#"[{"city":"Paris","units_sold":5,"revenue":50.0}]"#,
    ),
  ]);
}

#[tokio::test]
async fn orphaned_sales_are_left_out_of_every_analysis() {
  let p = pipeline_with(source().with(
    "ventes.csv",
    "Date,ID Référence produit,Quantité,ID Magasin\n\
     2024-01-15,P1,2,1\n\
     2024-01-15,P1,3,1\n\
     2024-01-15,NOPE,50,1\n\
     2024-01-15,P1,7,42\n",
  ))
  .await;
  p.run_ingestion(Table::Products, "produits.csv").await.unwrap();
  p.run_ingestion(Table::Stores, "magasins.csv").await.unwrap();
  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();

  let store = p.store();
  assert_eq!(
    store.run_analysis(Analysis::TotalRevenue).await.unwrap(),
    AnalysisResult::TotalRevenue(Some(50.0))
  );
  let AnalysisResult::RevenueByProduct(products) =
    store.run_analysis(Analysis::RevenueByProduct).await.unwrap()
  else {
    panic!("wrong result kind");
  };
  assert_eq!(products.len(), 1);
  assert_eq!((products[0].units_sold, products[0].revenue), (5, 50.0));
  let AnalysisResult::RevenueByRegion(regions) =
    store.run_analysis(Analysis::RevenueByRegion).await.unwrap()
  else {
    panic!("wrong result kind");
  };
  assert_eq!(regions.len(), 1);
  assert_eq!((regions[0].units_sold, regions[0].revenue), (5, 50.0));
}

#[tokio::test]
async fn repeated_runs_append_new_snapshots() {
  let p = loaded().await;

  p.run_all_analyses().await;
  let first = snapshots(p.list(Table::AnalysisLog).await.unwrap());

  p.run_all_analyses().await;
  p.run_all_analyses().await;
  let all = snapshots(p.list(Table::AnalysisLog).await.unwrap());

  assert_eq!(all.len(), 9);
  assert_eq!(&all[..3], &first[..]);
  assert_eq!(p.list_snapshots().await.unwrap(), all);
  for pair in all.windows(2) {
    assert!(pair[0].recorded_at < pair[1].recorded_at);
  }
  for analysis in Analysis::ALL {
    let results: Vec<&str> = all
      .iter()
      .filter(|s| s.analysis_name == analysis)
      .map(|s| s.result.as_str())
      .collect();
    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
  }
}

#[tokio::test]
async fn empty_sales_record_nothing() {
  let p = pipeline().await;
  p.run_ingestion(Table::Products, "produits.csv").await.unwrap();
  p.run_ingestion(Table::Stores, "magasins.csv").await.unwrap();

  let reports = p.run_all_analyses().await;
  assert_eq!(reports.len(), 3);
  assert!(reports.iter().all(|r| r.status == AnalysisStatus::NoData));
  assert!(p.list(Table::AnalysisLog).await.unwrap().is_empty());
}

#[tokio::test]
async fn table_names_and_counts() {
  let p = loaded().await;

  let names = p.list_table_names().await.unwrap();
  for table in Table::ALL {
    assert!(names.iter().any(|n| n == table.as_str()), "{table} missing");
  }

  let counts = p.table_counts().await.unwrap();
  let rows: Vec<(Table, u64)> = counts.iter().map(|c| (c.table, c.rows)).collect();
  assert_eq!(rows, vec![(Table::Sales, 2), (Table::Products, 2), (Table::Stores, 2)]);
}

// ─── Failure isolation ───────────────────────────────────────────────────────

/// Delegates to SQLite but fails one analysis, and every write once
/// `fail_writes` is set.
struct FlakyStore {
  inner:       SqliteStore,
  failing:     Option<Analysis>,
  fail_writes: AtomicBool,
}

impl FlakyStore {
  fn new(inner: SqliteStore, failing: Option<Analysis>) -> Self {
    Self { inner, failing, fail_writes: AtomicBool::new(false) }
  }

  fn check_write(&self) -> Result<(), FlakyError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(FlakyError::Simulated);
    }
    Ok(())
  }
}

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error("simulated failure")]
  Simulated,
  #[error(transparent)]
  Inner(#[from] tally_store_sqlite::Error),
}

impl SalesStore for FlakyStore {
  type Error = FlakyError;

  async fn list_products(&self) -> Result<Vec<Product>, FlakyError> {
    Ok(self.inner.list_products().await?)
  }

  async fn list_stores(&self) -> Result<Vec<Store>, FlakyError> {
    Ok(self.inner.list_stores().await?)
  }

  async fn list_sales(&self) -> Result<Vec<Sale>, FlakyError> {
    Ok(self.inner.list_sales().await?)
  }

  async fn list_snapshots(&self) -> Result<Vec<AnalysisSnapshot>, FlakyError> {
    Ok(self.inner.list_snapshots().await?)
  }

  async fn table_names(&self) -> Result<Vec<String>, FlakyError> {
    Ok(self.inner.table_names().await?)
  }

  async fn count_rows(&self, table: Table) -> Result<u64, FlakyError> {
    Ok(self.inner.count_rows(table).await?)
  }

  async fn product_keys(&self) -> Result<std::collections::HashSet<String>, FlakyError> {
    Ok(self.inner.product_keys().await?)
  }

  async fn store_keys(&self) -> Result<std::collections::HashSet<i64>, FlakyError> {
    Ok(self.inner.store_keys().await?)
  }

  async fn append_products(&self, rows: Vec<Product>) -> Result<usize, FlakyError> {
    self.check_write()?;
    Ok(self.inner.append_products(rows).await?)
  }

  async fn append_stores(&self, rows: Vec<Store>) -> Result<usize, FlakyError> {
    self.check_write()?;
    Ok(self.inner.append_stores(rows).await?)
  }

  async fn replace_sales(&self, rows: Vec<Sale>) -> Result<usize, FlakyError> {
    self.check_write()?;
    Ok(self.inner.replace_sales(rows).await?)
  }

  async fn run_analysis(&self, analysis: Analysis) -> Result<AnalysisResult, FlakyError> {
    if Some(analysis) == self.failing {
      return Err(FlakyError::Simulated);
    }
    Ok(self.inner.run_analysis(analysis).await?)
  }

  async fn append_snapshot(&self, input: NewSnapshot) -> Result<AnalysisSnapshot, FlakyError> {
    Ok(self.inner.append_snapshot(input).await?)
  }
}

#[tokio::test]
async fn one_failing_analysis_does_not_stop_the_others() {
  let inner = SqliteStore::open_in_memory().await.unwrap();
  let store = FlakyStore::new(inner, Some(Analysis::RevenueByProduct));
  let p = Pipeline::new(Arc::new(store), Arc::new(source()));
  p.run_ingestion(Table::Products, "produits.csv").await.unwrap();
  p.run_ingestion(Table::Stores, "magasins.csv").await.unwrap();
  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();

  let reports = p.run_all_analyses().await;

  assert!(matches!(
    status_of(&reports, Analysis::TotalRevenue),
    AnalysisStatus::Recorded { .. }
  ));
  assert!(matches!(
    status_of(&reports, Analysis::RevenueByProduct),
    AnalysisStatus::Failed { error } if error.contains("simulated failure")
  ));
  assert!(matches!(
    status_of(&reports, Analysis::RevenueByRegion),
    AnalysisStatus::Recorded { .. }
  ));

  let log = snapshots(p.list(Table::AnalysisLog).await.unwrap());
  assert_eq!(log.len(), 2);
  assert!(log.iter().all(|s| s.analysis_name != Analysis::RevenueByProduct));
}

#[tokio::test]
async fn failed_replace_reports_table_and_attempted_rows() {
  let inner = SqliteStore::open_in_memory().await.unwrap();
  let p = Pipeline::new(Arc::new(FlakyStore::new(inner, None)), Arc::new(source()));
  p.run_ingestion(Table::Sales, "ventes.csv").await.unwrap();
  let before = p.list(Table::Sales).await.unwrap();

  p.store().fail_writes.store(true, Ordering::SeqCst);
  let err = p.run_ingestion(Table::Sales, "ventes_b.csv").await.unwrap_err();

  assert!(
    matches!(err, Error::IngestionWrite { table: Table::Sales, attempted: 2, .. }),
    "unexpected error: {err:?}"
  );
  assert_eq!(p.list(Table::Sales).await.unwrap(), before);
}

#[tokio::test]
async fn failed_append_reports_table_and_attempted_rows() {
  let inner = SqliteStore::open_in_memory().await.unwrap();
  let p = Pipeline::new(Arc::new(FlakyStore::new(inner, None)), Arc::new(source()));

  p.store().fail_writes.store(true, Ordering::SeqCst);
  let err = p.run_ingestion(Table::Products, "produits.csv").await.unwrap_err();

  assert!(
    matches!(err, Error::IngestionWrite { table: Table::Products, attempted: 2, .. }),
    "unexpected error: {err:?}"
  );
  assert!(p.list(Table::Products).await.unwrap().is_empty());
}

#[tokio::test]
async fn recorder_refuses_empty_results() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let err = crate::recorder::record(&store, &AnalysisResult::RevenueByRegion(vec![]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmptyResult(Analysis::RevenueByRegion)));
}

#[tokio::test]
async fn writer_refuses_mismatched_policy() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let err = crate::writer::write(
    &store,
    tally_core::table::WritePolicy::FullReplace,
    tally_core::record::Batch::Stores(vec![]),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::PolicyMismatch { table: Table::Stores, .. }));
}
