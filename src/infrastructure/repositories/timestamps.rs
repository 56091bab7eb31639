//! Timestamps are stored as unix seconds.

use chrono::{DateTime, TimeZone, Utc};

pub fn to_db(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

pub fn from_db(ts: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Integer,
            format!("Invalid timestamp in DB: {}", ts).into(),
        )
    })
}
