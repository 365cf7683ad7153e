use crate::value::OutputRecord;

/// JSON formatting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

/// Serialize an output record as a JSON object, keeping key order.
pub fn write_json(record: &OutputRecord, style: JsonStyle) -> serde_json::Result<String> {
    match style {
        JsonStyle::Compact => serde_json::to_string(record),
        JsonStyle::Pretty => serde_json::to_string_pretty(record),
    }
}

pub fn to_json(record: &OutputRecord) -> serde_json::Result<String> {
    write_json(record, JsonStyle::Compact)
}

pub fn to_json_pretty(record: &OutputRecord) -> serde_json::Result<String> {
    write_json(record, JsonStyle::Pretty)
}
