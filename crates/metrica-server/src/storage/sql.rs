//! SQL text for the relational backend, one table per kind.

use metrica_core::Kind;

pub const CREATE_GAUGE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS gauge_metrics (
    id    TEXT PRIMARY KEY,
    value DOUBLE NOT NULL
)
"#;

pub const CREATE_COUNTER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS counter_metrics (
    id    TEXT PRIMARY KEY,
    value BIGINT NOT NULL
)
"#;

const UPSERT_GAUGE: &str = "INSERT INTO gauge_metrics (id, value) VALUES (?, ?) \
     ON CONFLICT (id) DO UPDATE SET value = excluded.value";

// Saturates at the i64 bounds; a plain `+` would overflow into REAL.
const UPSERT_COUNTER: &str = "INSERT INTO counter_metrics (id, value) VALUES (?, ?) \
     ON CONFLICT (id) DO UPDATE SET value = CASE \
         WHEN excluded.value > 0 \
              AND counter_metrics.value > 9223372036854775807 - excluded.value \
             THEN 9223372036854775807 \
         WHEN excluded.value < 0 \
              AND counter_metrics.value < -9223372036854775808 - excluded.value \
             THEN -9223372036854775808 \
         ELSE counter_metrics.value + excluded.value \
     END";

const GET_GAUGE: &str = "SELECT id, value FROM gauge_metrics WHERE id = ?";
const GET_COUNTER: &str = "SELECT id, value FROM counter_metrics WHERE id = ?";

const LIST_GAUGES: &str = "SELECT id, value FROM gauge_metrics";
const LIST_COUNTERS: &str = "SELECT id, value FROM counter_metrics";

pub fn create_table(kind: Kind) -> &'static str {
    match kind {
        Kind::Gauge => CREATE_GAUGE_TABLE,
        Kind::Counter => CREATE_COUNTER_TABLE,
    }
}

/// Gauges overwrite; counters add the delta to the stored total, saturating.
pub fn upsert(kind: Kind) -> &'static str {
    match kind {
        Kind::Gauge => UPSERT_GAUGE,
        Kind::Counter => UPSERT_COUNTER,
    }
}

pub fn get(kind: Kind) -> &'static str {
    match kind {
        Kind::Gauge => GET_GAUGE,
        Kind::Counter => GET_COUNTER,
    }
}

pub fn list(kind: Kind) -> &'static str {
    match kind {
        Kind::Gauge => LIST_GAUGES,
        Kind::Counter => LIST_COUNTERS,
    }
}
