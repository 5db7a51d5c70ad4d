mod contacts;
mod interactions;

pub use contacts::ContactRepository;
pub use interactions::InteractionRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width UTC timestamps so text ordering matches time ordering.
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
