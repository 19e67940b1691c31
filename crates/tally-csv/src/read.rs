//! CSV reader.
//!
//! Pipeline:
//!   raw &[u8]
//!     └─ sniff_delimiter()        → `,` or `;`
//!          └─ mapping::locate()   → column index per canonical field
//!               └─ Row builders   → typed record, or RowError
//!                    └─ collect   → Batch + rejected rows

use csv::{ByteRecord, ReaderBuilder, Trim};
use tally_core::{
  record::{Batch, Product, Sale, Store},
  table::Table,
};

use crate::{
  ReadOutcome, RejectedRow, coerce,
  error::{Error, Result, RowError},
  mapping::{self, Field},
};

// ─── Delimiter ───────────────────────────────────────────────────────────────

/// Pick `;` when the header line has more semicolons than commas (common in
/// spreadsheet exports from French locales), `,` otherwise.
fn sniff_delimiter(input: &[u8]) -> u8 {
  let header = input.split(|&b| b == b'\n').next().unwrap_or_default();
  let commas = header.iter().filter(|&&b| b == b',').count();
  let semicolons = header.iter().filter(|&&b| b == b';').count();
  if semicolons > commas { b';' } else { b',' }
}

// ─── Row access ──────────────────────────────────────────────────────────────

struct Row<'a> {
  record:  &'a ByteRecord,
  fields:  &'a [Field],
  columns: &'a [usize],
}

impl Row<'_> {
  /// The trimmed, non-empty text of the `i`-th declared field.
  fn text(&self, i: usize) -> Result<&str, RowError> {
    let name = self.fields[i].canonical;
    let raw = self
      .record
      .get(self.columns[i])
      .ok_or(RowError::Missing(name))?;
    let text = std::str::from_utf8(raw)
      .map_err(|_| RowError::Encoding { field: name })?
      .trim();
    if text.is_empty() {
      return Err(RowError::Missing(name));
    }
    Ok(text)
  }

  fn parse<T>(
    &self,
    i: usize,
    expected: &'static str,
    coerce: fn(&str) -> Option<T>,
  ) -> Result<T, RowError> {
    let text = self.text(i)?;
    coerce(text).ok_or_else(|| RowError::Invalid {
      field: self.fields[i].canonical,
      value: text.to_owned(),
      expected,
    })
  }
}

// ─── Record builders ─────────────────────────────────────────────────────────
// Indices follow the field order declared in `mapping`.

fn product(row: &Row<'_>) -> Result<Product, RowError> {
  Ok(Product {
    name:         row.text(0)?.to_owned(),
    reference_id: row.text(1)?.to_owned(),
    price:        row.parse(2, "a non-negative amount", coerce::currency)?,
    stock:        row.parse(3, "a non-negative integer", coerce::count)?,
  })
}

fn store(row: &Row<'_>) -> Result<Store, RowError> {
  Ok(Store {
    store_id:       row.parse(0, "an integer", coerce::integer)?,
    city:           row.text(1)?.to_owned(),
    employee_count: row.parse(2, "a non-negative integer", coerce::count)?,
  })
}

fn sale(row: &Row<'_>) -> Result<Sale, RowError> {
  Ok(Sale {
    date:                 row.parse(0, "a date", coerce::date)?,
    product_reference_id: row.text(1)?.to_owned(),
    store_id:             row.parse(2, "an integer", coerce::integer)?,
    quantity:             row.parse(3, "a non-negative integer", coerce::count)?,
  })
}

// ─── Driver ──────────────────────────────────────────────────────────────────

fn collect<T>(
  reader: &mut csv::Reader<&[u8]>,
  table: Table,
  fields: &[Field],
  columns: &[usize],
  rejected: &mut Vec<RejectedRow>,
  build: fn(&Row<'_>) -> Result<T, RowError>,
) -> Result<Vec<T>> {
  let mut rows = Vec::new();
  let mut record = ByteRecord::new();

  while reader.read_byte_record(&mut record)? {
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    match build(&Row { record: &record, fields, columns }) {
      Ok(value) => rows.push(value),
      Err(reason) => {
        tracing::warn!(%table, line, %reason, "dropping row");
        rejected.push(RejectedRow { line, reason });
      }
    }
  }

  Ok(rows)
}

pub(crate) fn read(input: &[u8], table: Table) -> Result<ReadOutcome> {
  let fields = mapping::fields_for(table)?;

  let mut reader = ReaderBuilder::new()
    .delimiter(sniff_delimiter(input))
    .flexible(true)
    .trim(Trim::Headers)
    .from_reader(input);

  let headers = reader.byte_headers()?.clone();
  if headers.iter().all(<[u8]>::is_empty) {
    return Err(Error::MissingHeader);
  }
  let columns = mapping::locate(table, fields, &headers)?;

  let mut rejected = Vec::new();
  let batch = match table {
    Table::Products => Batch::Products(collect(
      &mut reader, table, fields, &columns, &mut rejected, product,
    )?),
    Table::Stores => Batch::Stores(collect(
      &mut reader, table, fields, &columns, &mut rejected, store,
    )?),
    Table::Sales => Batch::Sales(collect(
      &mut reader, table, fields, &columns, &mut rejected, sale,
    )?),
    Table::AnalysisLog => return Err(Error::NoMapping(table)),
  };

  tracing::debug!(
    %table,
    accepted = batch.len(),
    rejected = rejected.len(),
    "read tabular source"
  );

  Ok(ReadOutcome { batch, rejected })
}
