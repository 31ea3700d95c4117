//! Row-mapping helpers shared by the SQLite repositories.

use blogbench_core::{CoreError, CoreResult};
use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamps are stored as RFC3339 strings with fixed-width nanosecond
/// precision and a `Z` suffix, which keeps lexicographic and chronological
/// order identical and makes reads return exactly what was written.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(raw: &str, column: &'static str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| CoreError::internal(format!("invalid {column}: {err}")))
}

pub(crate) fn map_sqlx_error(entity: &'static str, id: String, err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            if message.contains("UNIQUE constraint failed") {
                CoreError::already_exists(entity, id)
            } else if message.contains("FOREIGN KEY constraint failed") {
                CoreError::validation("foreign key constraint failed")
            } else {
                CoreError::storage(message)
            }
        }
        other => CoreError::storage(other.to_string()),
    }
}
