//! Ingestion writer: persists a validated batch under its table's policy.

use tally_core::{record::Batch, store::SalesStore, table::WritePolicy};

use crate::error::{Error, Result};

/// Write `batch` to its table under `policy` and return the rows written.
///
/// - [`WritePolicy::AppendWithDedup`]: the batch must already be filtered by
///   [`crate::identity::filter_new`]; it is appended as is. An empty batch is a
///   no-op.
/// - [`WritePolicy::FullReplace`]: the table content becomes exactly the
///   batch, atomically.
///
/// On failure the table is left in its previous state and the error carries
/// the table and the number of rows attempted.
pub async fn write<S: SalesStore>(
  store: &S,
  policy: WritePolicy,
  batch: Batch,
) -> Result<usize> {
  let table = batch.table();
  let attempted = batch.len();

  if table.policy() != Some(policy) {
    return Err(Error::PolicyMismatch { table, policy });
  }

  if policy == WritePolicy::AppendWithDedup && batch.is_empty() {
    tracing::debug!(%table, "nothing new to append");
    return Ok(0);
  }

  let written = match batch {
    Batch::Products(rows) => store.append_products(rows).await,
    Batch::Stores(rows) => store.append_stores(rows).await,
    Batch::Sales(rows) => store.replace_sales(rows).await,
  };

  written.map_err(|e| Error::IngestionWrite {
    table,
    attempted,
    source: Box::new(e),
  })
}
