//! Identity resolution: which incoming keyed records are already stored.
//!
//! The stored key set is read with a single projected scan per batch, never
//! with per-row lookups. First write wins: a record whose key is already
//! stored, or already appeared earlier in the same batch, is set aside
//! without comparing its other fields.

use std::collections::HashSet;

use tally_core::{
  record::{Batch, Keyed},
  store::SalesStore,
};

use crate::error::{Error, Result};

/// The partition of an incoming batch by natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<R> {
  /// Records to append, in source order.
  pub new:      Vec<R>,
  /// Records whose key is already known; discarded by the caller.
  pub existing: Vec<R>,
}

/// Partition `incoming` against the `stored` key set.
pub fn resolve<R: Keyed>(incoming: Vec<R>, stored: &HashSet<R::Key>) -> Resolution<R> {
  let mut seen: HashSet<R::Key> = HashSet::new();
  let mut new = Vec::new();
  let mut existing = Vec::new();

  for record in incoming {
    let key = record.key();
    if stored.contains(&key) || !seen.insert(key) {
      existing.push(record);
    } else {
      new.push(record);
    }
  }

  Resolution { new, existing }
}

/// Drop already-known records from a keyed batch.
///
/// Returns the batch of new records and the number skipped. Sales carry no
/// natural key and pass through untouched.
pub async fn filter_new<S: SalesStore>(store: &S, batch: Batch) -> Result<(Batch, usize)> {
  let (batch, skipped) = match batch {
    Batch::Products(rows) => {
      let stored = store.product_keys().await.map_err(Error::store)?;
      tracing::debug!(stored = stored.len(), incoming = rows.len(), "resolving product keys");
      let Resolution { new, existing } = resolve(rows, &stored);
      (Batch::Products(new), existing.len())
    }
    Batch::Stores(rows) => {
      let stored = store.store_keys().await.map_err(Error::store)?;
      tracing::debug!(stored = stored.len(), incoming = rows.len(), "resolving store keys");
      let Resolution { new, existing } = resolve(rows, &stored);
      (Batch::Stores(new), existing.len())
    }
    sales @ Batch::Sales(_) => (sales, 0),
  };
  Ok((batch, skipped))
}
