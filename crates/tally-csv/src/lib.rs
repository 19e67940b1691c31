//! Tabular source reader for Tally.
//!
//! Turns a raw CSV byte stream into typed [`tally_core`] records for one
//! entity table. Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use tally_core::table::Table;
//!
//! let csv = "Nom,ID Référence produit,Prix,Stock\nWidget,P1,10.0,4\n";
//! let outcome = tally_csv::read(csv.as_bytes(), Table::Products).unwrap();
//! println!("{} rows, {} rejected", outcome.batch.len(), outcome.rejected.len());
//! ```

mod coerce;
pub mod error;
mod mapping;
mod read;

pub use error::{Error, Result, RowError};
use tally_core::{record::Batch, table::Table};

// ─── Public types ────────────────────────────────────────────────────────────

/// A row dropped during reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
  /// 1-based line number in the source.
  pub line:   u64,
  pub reason: RowError,
}

/// The result of reading one source.
#[derive(Debug)]
pub struct ReadOutcome {
  /// Every row that passed validation, in source order.
  pub batch:    Batch,
  /// Rows dropped by validation, in source order.
  pub rejected: Vec<RejectedRow>,
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Read `input` as CSV records for `table`.
///
/// Headers are mapped to canonical fields through the table's declared
/// mapping, values are coerced (dates to calendar dates, currency and
/// integers to numbers), and rows failing validation are dropped and listed
/// in [`ReadOutcome::rejected`].
///
/// Fails only when the stream has no header row, a required column is
/// absent, the stream is not readable as CSV, or `table` has no mapping.
pub fn read(input: &[u8], table: Table) -> Result<ReadOutcome> {
  read::read(input, table)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use tally_core::record::{Product, Sale, Store};

  use super::*;

  #[test]
  fn reads_french_product_extract() {
    let csv = "Nom,ID Référence produit,Prix,Stock\n\
               Produit A,REF001,49.99,100\n\
               Produit B,REF002,\"12,50\",5\n";
    let outcome = read(csv.as_bytes(), Table::Products).unwrap();

    assert!(outcome.rejected.is_empty());
    assert_eq!(
      outcome.batch,
      Batch::Products(vec![
        Product {
          name:         "Produit A".into(),
          reference_id: "REF001".into(),
          price:        49.99,
          stock:        100,
        },
        Product {
          name:         "Produit B".into(),
          reference_id: "REF002".into(),
          price:        12.5,
          stock:        5,
        },
      ])
    );
  }

  #[test]
  fn reads_semicolon_separated_stores() {
    let csv = "ID Magasin;Ville;Nombre de salariés\n1;Paris;10\n2;Lyon;8\n";
    let outcome = read(csv.as_bytes(), Table::Stores).unwrap();

    assert_eq!(
      outcome.batch,
      Batch::Stores(vec![
        Store { store_id: 1, city: "Paris".into(), employee_count: 10 },
        Store { store_id: 2, city: "Lyon".into(), employee_count: 8 },
      ])
    );
  }

  #[test]
  fn sales_dates_are_normalised() {
    let csv = "Date,ID Référence produit,Quantité,ID Magasin\n\
               15/01/2024,REF001,3,1\n\
               2024-01-16 08:00:00,REF002,1,2\n";
    let outcome = read(csv.as_bytes(), Table::Sales).unwrap();

    let Batch::Sales(sales) = outcome.batch else {
      panic!("expected sales batch");
    };
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0], Sale {
      date:                 NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
      product_reference_id: "REF001".into(),
      store_id:             1,
      quantity:             3,
    });
    assert_eq!(sales[1].date.to_string(), "2024-01-16");
  }

  #[test]
  fn non_utf8_field_rejects_only_its_row() {
    let mut csv = b"Nom,ID R\xc3\xa9f\xc3\xa9rence produit,Prix,Stock\n".to_vec();
    csv.extend_from_slice(b"Caf\xe9,REF001,2.50,4\n");
    csv.extend_from_slice(b"Th\xc3\xa9,REF002,3.00,6\n");
    let outcome = read(&csv, Table::Products).unwrap();

    assert_eq!(outcome.batch.len(), 1);
    assert_eq!(outcome.rejected, vec![RejectedRow {
      line:   2,
      reason: RowError::Encoding { field: "name" },
    }]);
  }

  #[test]
  fn invalid_rows_are_dropped_not_fatal() {
    let csv = "Date,ID Référence produit,Quantité,ID Magasin\n\
               2024-01-15,REF001,3,1\n\
               not-a-date,REF001,3,1\n\
               2024-01-15,,3,1\n\
               2024-01-15,REF001,-2,1\n\
               2024-01-15,REF001\n\
               2024-01-17,REF002,4,2\n";
    let outcome = read(csv.as_bytes(), Table::Sales).unwrap();

    assert_eq!(outcome.batch.len(), 2);
    let lines: Vec<u64> = outcome.rejected.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![3, 4, 5, 6]);
    assert!(matches!(
      outcome.rejected[0].reason,
      RowError::Invalid { field: "date", .. }
    ));
    assert_eq!(
      outcome.rejected[1].reason,
      RowError::Missing("product_reference_id")
    );
    assert!(matches!(
      outcome.rejected[2].reason,
      RowError::Invalid { field: "quantity", .. }
    ));
    assert_eq!(outcome.rejected[3].reason, RowError::Missing("store_id"));
  }

  #[test]
  fn extra_columns_are_ignored() {
    let csv = "store_id,city,employee_count,manager\n7,Nice,3,Ann\n";
    let outcome = read(csv.as_bytes(), Table::Stores).unwrap();
    assert_eq!(outcome.batch.len(), 1);
  }

  #[test]
  fn empty_stream_has_no_header() {
    let err = read(b"", Table::Products).unwrap_err();
    assert!(matches!(err, Error::MissingHeader));
  }

  #[test]
  fn header_only_stream_is_an_empty_batch() {
    let outcome = read(b"Nom,ID R\xc3\xa9f\xc3\xa9rence produit,Prix,Stock\n", Table::Products)
      .unwrap();
    assert!(outcome.batch.is_empty());
    assert!(outcome.rejected.is_empty());
  }

  #[test]
  fn unmapped_header_is_a_format_error() {
    let err = read(b"a,b,c\n1,2,3\n", Table::Stores).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { field: "store_id", .. }));
  }

  #[test]
  fn analysis_log_cannot_be_read() {
    let err = read(b"x\n", Table::AnalysisLog).unwrap_err();
    assert!(matches!(err, Error::NoMapping(Table::AnalysisLog)));
  }
}
