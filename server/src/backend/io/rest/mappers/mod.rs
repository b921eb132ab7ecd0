//! Conversions between domain types and the `shared` DTOs.

pub mod catalog_mapper;
pub mod family_mapper;
pub mod gift_order_mapper;

use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Local wall-clock timestamp as sent over the wire
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_optional_timestamp(at: Option<NaiveDateTime>) -> Option<String> {
    at.map(format_timestamp)
}
