//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS products (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    reference_id  TEXT    NOT NULL UNIQUE,
    price         REAL    NOT NULL CHECK (price >= 0),
    stock         INTEGER NOT NULL CHECK (stock >= 0)
);

CREATE TABLE IF NOT EXISTS stores (
    store_id        INTEGER PRIMARY KEY,
    city            TEXT    NOT NULL,
    employee_count  INTEGER NOT NULL CHECK (employee_count >= 0)
);

-- Replaced wholesale on every import. References to products and stores are
-- not enforced; aggregation inner-joins them away.
CREATE TABLE IF NOT EXISTS sales (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    date                  TEXT    NOT NULL,   -- YYYY-MM-DD
    product_reference_id  TEXT    NOT NULL,
    store_id              INTEGER NOT NULL,
    quantity              INTEGER NOT NULL CHECK (quantity >= 0)
);

-- Strictly append-only.
CREATE TABLE IF NOT EXISTS analysis_log (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    analysis_name  TEXT NOT NULL,
    result         TEXT NOT NULL    -- JSON array of records
);

CREATE TRIGGER IF NOT EXISTS analysis_log_no_update
BEFORE UPDATE ON analysis_log
BEGIN
    SELECT RAISE(ABORT, 'analysis_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS analysis_log_no_delete
BEFORE DELETE ON analysis_log
BEGIN
    SELECT RAISE(ABORT, 'analysis_log is append-only');
END;

CREATE INDEX IF NOT EXISTS sales_product_idx        ON sales(product_reference_id);
CREATE INDEX IF NOT EXISTS sales_store_idx          ON sales(store_id);
CREATE INDEX IF NOT EXISTS analysis_log_recorded_idx ON analysis_log(recorded_at);

PRAGMA user_version = 1;
";

/// Catalogue SQL. Every query joins both products and stores on their
/// natural keys, so a sale referencing either unknown drops out of all three.
pub const TOTAL_REVENUE: &str = "
SELECT SUM(p.price * s.quantity)
FROM sales s
JOIN products p  ON p.reference_id = s.product_reference_id
JOIN stores   st ON st.store_id    = s.store_id
";

pub const REVENUE_BY_PRODUCT: &str = "
SELECT p.name,
       SUM(s.quantity)           AS units_sold,
       SUM(p.price * s.quantity) AS revenue
FROM sales s
JOIN products p  ON p.reference_id = s.product_reference_id
JOIN stores   st ON st.store_id    = s.store_id
GROUP BY p.name
ORDER BY revenue DESC, p.name ASC
";

pub const REVENUE_BY_REGION: &str = "
SELECT st.city,
       SUM(s.quantity)           AS units_sold,
       SUM(p.price * s.quantity) AS revenue
FROM sales s
JOIN stores   st ON st.store_id    = s.store_id
JOIN products p  ON p.reference_id = s.product_reference_id
GROUP BY st.city
ORDER BY revenue DESC, st.city ASC
";
