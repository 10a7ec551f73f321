pub mod problem;
pub mod sheet;
pub mod user;

pub use problem::*;
pub use sheet::*;
pub use user::*;

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub fn to_chrono(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

/// ISO-8601 with millis, the format the dashboard already parses.
pub fn to_iso(dt: BsonDateTime) -> String {
    to_chrono(dt).to_rfc3339_opts(SecondsFormat::Millis, true)
}
