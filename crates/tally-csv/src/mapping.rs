//! Declared column mappings: source header → canonical field, per table.
//!
//! Each canonical field accepts its own name and the headers used by the
//! French store extracts (`produits.csv`, `magasins.csv`, `ventes.csv`).
//! Matching ignores surrounding whitespace, a leading BOM and letter case.

use csv::ByteRecord;
use tally_core::table::Table;

use crate::error::{Error, Result};

/// One canonical field and the source headers that map onto it.
pub(crate) struct Field {
  pub canonical: &'static str,
  pub aliases:   &'static [&'static str],
}

const fn field(canonical: &'static str, aliases: &'static [&'static str]) -> Field {
  Field { canonical, aliases }
}

// Field order is the order record builders index into.

pub(crate) const PRODUCTS: &[Field] = &[
  field("name", &["Nom"]),
  field("reference_id", &["ID Référence produit", "id_reference_produit"]),
  field("price", &["Prix"]),
  field("stock", &["Stock"]),
];

pub(crate) const STORES: &[Field] = &[
  field("store_id", &["ID Magasin", "id_magasin", "id"]),
  field("city", &["Ville"]),
  field("employee_count", &["Nombre de salariés", "nombre_de_salaries"]),
];

pub(crate) const SALES: &[Field] = &[
  field("date", &["Date"]),
  field("product_reference_id", &["ID Référence produit", "id_reference_produit"]),
  field("store_id", &["ID Magasin", "id_magasin"]),
  field("quantity", &["Quantité", "quantite"]),
];

/// The registered mapping for `table`.
pub(crate) fn fields_for(table: Table) -> Result<&'static [Field]> {
  match table {
    Table::Products => Ok(PRODUCTS),
    Table::Stores => Ok(STORES),
    Table::Sales => Ok(SALES),
    Table::AnalysisLog => Err(Error::NoMapping(table)),
  }
}

fn normalize(header: &str) -> String {
  header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

impl Field {
  fn matches(&self, header: &str) -> bool {
    header == self.canonical
      || self.aliases.iter().any(|alias| normalize(alias) == header)
  }
}

/// Resolve every declared field to its column index in `headers`.
///
/// Returns one index per field, in field order. Columns that map to no field
/// are ignored; a field with no column is a batch-level error.
pub(crate) fn locate(
  table: Table,
  fields: &[Field],
  headers: &ByteRecord,
) -> Result<Vec<usize>> {
  let names: Vec<String> = headers
    .iter()
    .map(|raw| normalize(&String::from_utf8_lossy(raw)))
    .collect();

  fields
    .iter()
    .map(|f| {
      names
        .iter()
        .position(|name| f.matches(name))
        .ok_or(Error::MissingColumn { table, field: f.canonical })
    })
    .collect()
}
