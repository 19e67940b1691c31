//! Typed entity records — the rows of the `products`, `stores` and `sales`
//! tables.
//!
//! Records are built by the CSV reader from declared column mappings and
//! written by the ingestion pipeline. Products and stores carry a natural key
//! (see [`Keyed`]); sales do not, and are replaced wholesale on each import.

use std::{fmt::Debug, hash::Hash};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::table::Table;

// ─── Natural keys ────────────────────────────────────────────────────────────

/// A record with a natural key that is unique within its table.
pub trait Keyed {
  type Key: Clone + Debug + Eq + Hash + Send + 'static;

  fn key(&self) -> Self::Key;
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub name:         String,
  /// Natural key.
  pub reference_id: String,
  /// Unit price; never negative.
  pub price:        f64,
  pub stock:        i64,
}

impl Keyed for Product {
  type Key = String;

  fn key(&self) -> String { self.reference_id.clone() }
}

/// A physical store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
  /// Natural key.
  pub store_id:       i64,
  pub city:           String,
  pub employee_count: i64,
}

impl Keyed for Store {
  type Key = i64;

  fn key(&self) -> i64 { self.store_id }
}

/// One sales line. Sales reference products and stores by natural key, but
/// the references are not enforced: orphans are dropped at aggregation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
  pub date:                 NaiveDate,
  pub product_reference_id: String,
  pub store_id:             i64,
  pub quantity:             i64,
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A homogeneous batch of records destined for one entity table.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
  Products(Vec<Product>),
  Stores(Vec<Store>),
  Sales(Vec<Sale>),
}

impl Batch {
  pub fn table(&self) -> Table {
    match self {
      Self::Products(_) => Table::Products,
      Self::Stores(_) => Table::Stores,
      Self::Sales(_) => Table::Sales,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::Products(rows) => rows.len(),
      Self::Stores(rows) => rows.len(),
      Self::Sales(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
