//! Field coercions from raw CSV text to typed values.
//!
//! Each coercion returns `None` when the text does not represent a valid
//! value; the caller turns that into a row-level rejection.

use chrono::NaiveDate;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// A calendar date. A trailing time component (`2024-01-15 10:30:00`,
/// `2024-01-15T10:30:00`) is discarded.
pub(crate) fn date(s: &str) -> Option<NaiveDate> {
  let day = s.split([' ', 'T']).next()?;
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// A non-negative amount of money.
///
/// Accepts currency markers (`€`, `$`, `EUR`), spaces used as thousands
/// separators, and a decimal comma (`12,50`). When both `,` and `.` appear the
/// comma is taken as a thousands separator.
pub(crate) fn currency(s: &str) -> Option<f64> {
  let mut cleaned: String = s
    .replace("EUR", "")
    .chars()
    .filter(|c| !matches!(c, '€' | '$') && !c.is_whitespace())
    .collect();

  if cleaned.contains(',') {
    cleaned = if cleaned.contains('.') {
      cleaned.replace(',', "")
    } else {
      cleaned.replace(',', ".")
    };
  }

  let value: f64 = cleaned.parse().ok()?;
  (value.is_finite() && value >= 0.0).then_some(value)
}

/// Any integer. Spreadsheet exports sometimes write whole numbers as `12.0`;
/// a fractional part of zero is accepted.
pub(crate) fn integer(s: &str) -> Option<i64> {
  let s = s.trim();
  if let Ok(n) = s.parse() {
    return Some(n);
  }
  let whole = s.strip_suffix(".0").or_else(|| s.strip_suffix(".00"))?;
  whole.parse().ok()
}

/// A non-negative integer (stock, head count, quantity).
pub(crate) fn count(s: &str) -> Option<i64> { integer(s).filter(|n| *n >= 0) }
