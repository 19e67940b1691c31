//! [`SqliteStore`] — the SQLite implementation of [`SalesStore`].

use std::{collections::HashSet, path::Path, time::Duration};

use chrono::Utc;
use tally_core::{
  analysis::{Analysis, AnalysisResult, ProductRevenue, RegionRevenue},
  record::{Product, Sale, Store},
  snapshot::{AnalysisSnapshot, NewSnapshot},
  store::SalesStore,
  table::Table,
};

use crate::{
  Error, Result,
  encode::{
    RawSale, RawSnapshot, decode_dt, encode_date, encode_dt, next_timestamp,
  },
  schema::{REVENUE_BY_PRODUCT, REVENUE_BY_REGION, SCHEMA, TOTAL_REVENUE},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised on the connection's background thread, and every write
/// runs in its own transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Bound how long a statement waits on a locked database before failing.
  pub async fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }

  async fn grouped_revenue(
    &self,
    sql: &'static str,
  ) -> Result<Vec<(String, i64, f64)>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── SalesStore impl ─────────────────────────────────────────────────────────

impl SalesStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_products(&self) -> Result<Vec<Product>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name, reference_id, price, stock FROM products ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Product {
              name:         row.get(0)?,
              reference_id: row.get(1)?,
              price:        row.get(2)?,
              stock:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn list_stores(&self) -> Result<Vec<Store>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT store_id, city, employee_count FROM stores ORDER BY store_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Store {
              store_id:       row.get(0)?,
              city:           row.get(1)?,
              employee_count: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn list_sales(&self) -> Result<Vec<Sale>> {
    let raws: Vec<RawSale> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT date, product_reference_id, store_id, quantity
           FROM sales ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSale {
              date:                 row.get(0)?,
              product_reference_id: row.get(1)?,
              store_id:             row.get(2)?,
              quantity:             row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSale::into_sale).collect()
  }

  async fn list_snapshots(&self) -> Result<Vec<AnalysisSnapshot>> {
    let raws: Vec<RawSnapshot> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, recorded_at, analysis_name, result
           FROM analysis_log ORDER BY recorded_at, id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSnapshot {
              id:            row.get(0)?,
              recorded_at:   row.get(1)?,
              analysis_name: row.get(2)?,
              result:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  async fn table_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM sqlite_master
           WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
           ORDER BY name",
        )?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn count_rows(&self, table: Table) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(count.max(0) as u64)
  }

  // ── Key-set scans ─────────────────────────────────────────────────────────

  async fn product_keys(&self) -> Result<HashSet<String>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT reference_id FROM products")?;
        let keys = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }

  async fn store_keys(&self) -> Result<HashSet<i64>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT store_id FROM stores")?;
        let keys = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn append_products(&self, rows: Vec<Product>) -> Result<usize> {
    if rows.is_empty() {
      return Ok(0);
    }

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO products (name, reference_id, price, stock)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for p in &rows {
            stmt.execute(rusqlite::params![
              p.name,
              p.reference_id,
              p.price,
              p.stock
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(written)
  }

  async fn append_stores(&self, rows: Vec<Store>) -> Result<usize> {
    if rows.is_empty() {
      return Ok(0);
    }

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO stores (store_id, city, employee_count)
             VALUES (?1, ?2, ?3)",
          )?;
          for s in &rows {
            stmt.execute(rusqlite::params![s.store_id, s.city, s.employee_count])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(written)
  }

  async fn replace_sales(&self, rows: Vec<Sale>) -> Result<usize> {
    let encoded: Vec<(String, String, i64, i64)> = rows
      .into_iter()
      .map(|s| {
        (encode_date(s.date), s.product_reference_id, s.store_id, s.quantity)
      })
      .collect();

    // Delete and insert share one transaction; a failure anywhere rolls the
    // table back to its previous content.
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sales", [])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO sales (date, product_reference_id, store_id, quantity)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (date, product_reference_id, store_id, quantity) in &encoded {
            stmt.execute(rusqlite::params![
              date,
              product_reference_id,
              store_id,
              quantity
            ])?;
          }
        }
        tx.commit()?;
        Ok(encoded.len())
      })
      .await?;
    tracing::debug!(rows = written, "sales table replaced");
    Ok(written)
  }

  // ── Analyses ──────────────────────────────────────────────────────────────

  async fn run_analysis(&self, analysis: Analysis) -> Result<AnalysisResult> {
    let result = match analysis {
      Analysis::TotalRevenue => {
        let total: Option<f64> = self
          .conn
          .call(|conn| Ok(conn.query_row(TOTAL_REVENUE, [], |row| row.get(0))?))
          .await?;
        AnalysisResult::TotalRevenue(total)
      }
      Analysis::RevenueByProduct => AnalysisResult::RevenueByProduct(
        self
          .grouped_revenue(REVENUE_BY_PRODUCT)
          .await?
          .into_iter()
          .map(|(name, units_sold, revenue)| ProductRevenue {
            name,
            units_sold,
            revenue,
          })
          .collect(),
      ),
      Analysis::RevenueByRegion => AnalysisResult::RevenueByRegion(
        self
          .grouped_revenue(REVENUE_BY_REGION)
          .await?
          .into_iter()
          .map(|(city, units_sold, revenue)| RegionRevenue {
            city,
            units_sold,
            revenue,
          })
          .collect(),
      ),
    };
    Ok(result)
  }

  async fn append_snapshot(&self, input: NewSnapshot) -> Result<AnalysisSnapshot> {
    let now = Utc::now();
    let name = input.analysis.as_str();
    let result = input.result.clone();

    // Reading the latest timestamp and inserting share one transaction so
    // that `recorded_at` stays strictly increasing.
    let (id, recorded_at) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let latest: Option<String> = tx.query_row(
          "SELECT MAX(recorded_at) FROM analysis_log",
          [],
          |row| row.get(0),
        )?;
        let latest = latest
          .as_deref()
          .map(decode_dt)
          .transpose()
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
        let recorded_at = next_timestamp(now, latest);

        tx.execute(
          "INSERT INTO analysis_log (recorded_at, analysis_name, result)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![encode_dt(recorded_at), name, result],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok((id, recorded_at))
      })
      .await?;

    Ok(AnalysisSnapshot {
      id,
      recorded_at,
      analysis_name: input.analysis,
      result: input.result,
    })
  }
}
