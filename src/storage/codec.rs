//! Line codec for the locations file.
//!
//! Every record is a single comma-separated line. Text fields are wrapped in
//! double quotes with interior quotes doubled; numbers are written bare.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::location_record::{format_accuracy, format_coordinate, LocationRecord};

pub const DELIMITER: char = ',';
pub const QUOTE: char = '"';

pub const HEADER_FIELDS: [&str; 8] = [
    "ID",
    "Device",
    "Latitude",
    "Longitude",
    "Accuracy",
    "Timestamp",
    "UserAgent",
    "CreatedAt",
];

pub fn header_line() -> String {
    HEADER_FIELDS.join(",")
}

/// Encodes a record without a trailing newline.
pub fn encode(record: &LocationRecord) -> String {
    let fields = [
        record.id.clone(),
        quote(&record.device),
        format_coordinate(record.latitude),
        format_coordinate(record.longitude),
        format_accuracy(record.accuracy),
        quote(&record.observed_at),
        quote(&record.client_identifier),
        quote(&record.created_at),
    ];
    fields.join(",")
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(QUOTE);
    for c in value.chars() {
        match c {
            QUOTE => {
                out.push(QUOTE);
                out.push(QUOTE);
            }
            // one record per line
            '\r' | '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out.push(QUOTE);
    out
}

/// A decoded line, keyed by header name in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredRow {
    fields: Vec<(String, String)>,
}

impl StoredRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }
}

impl Serialize for StoredRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRows {
    pub rows: Vec<StoredRow>,
    /// Lines dropped because they did not parse or did not match the header width.
    pub skipped: usize,
}

/// Decodes a whole file. The first line is the header; malformed lines are
/// dropped and counted rather than failing the read.
pub fn decode_all(text: &str) -> DecodedRows {
    let mut lines = text
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let header = match lines.next() {
        Some(line) if !line.trim().is_empty() => header_names(line),
        _ => return DecodedRows::default(),
    };

    let mut decoded = DecodedRows::default();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        // writers racing on a fresh file can each leave a header behind
        if header_names(line) == header {
            decoded.skipped += 1;
            continue;
        }
        match split_line(line) {
            Some(values) if values.len() == header.len() => {
                decoded.rows.push(StoredRow {
                    fields: header.iter().cloned().zip(values).collect(),
                });
            }
            _ => decoded.skipped += 1,
        }
    }
    decoded
}

fn header_names(line: &str) -> Vec<String> {
    line.split(DELIMITER)
        .map(|name| name.replace(QUOTE, "").trim().to_string())
        .collect()
}

/// Splits one line on the delimiter, honouring quoted fields. Returns `None`
/// for an unterminated quote or stray text after a closing quote.
fn split_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if *c != DELIMITER && c.is_whitespace()) {
            chars.next();
        }

        let mut field = String::new();
        let at_end;

        if chars.peek() == Some(&QUOTE) {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c != QUOTE {
                    field.push(c);
                } else if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    field.push(QUOTE);
                } else {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return None;
            }
            loop {
                match chars.next() {
                    None => {
                        at_end = true;
                        break;
                    }
                    Some(DELIMITER) => {
                        at_end = false;
                        break;
                    }
                    Some(c) if c.is_whitespace() => {}
                    Some(_) => return None,
                }
            }
        } else {
            loop {
                match chars.next() {
                    None => {
                        at_end = true;
                        break;
                    }
                    Some(DELIMITER) => {
                        at_end = false;
                        break;
                    }
                    Some(c) => field.push(c),
                }
            }
            field = field.trim_end().to_string();
        }

        fields.push(field);
        if at_end {
            return Some(fields);
        }
    }
}
