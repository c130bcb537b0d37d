use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::FieldType;

/// One decoded cell
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Logical(bool),
}

impl FieldValue {
    /// Decode a fixed-width cell. Blank or unparseable cells decode to `Null`.
    pub fn decode(field_type: FieldType, raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_matches(|c: char| c == ' ' || c == '\0');

        match field_type {
            FieldType::Numeric | FieldType::Float => text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or(FieldValue::Null, FieldValue::Number),
            FieldType::Date => NaiveDate::parse_from_str(text, "%Y%m%d")
                .map_or(FieldValue::Null, FieldValue::Date),
            FieldType::Logical => match text.chars().next() {
                Some('Y' | 'y' | 'T' | 't') => FieldValue::Logical(true),
                Some('N' | 'n' | 'F' | 'f') => FieldValue::Logical(false),
                _ => FieldValue::Null,
            },
            FieldType::Character | FieldType::Other(_) => {
                if text.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Text(text.to_string())
                }
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; numeric text is accepted too
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// One record, keyed by upper-cased column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(BTreeMap<String, FieldValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into().to_ascii_uppercase(), value);
    }

    /// Case-insensitive column lookup
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(&name.to_ascii_uppercase())
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}
