//! Result-record normalization.
//!
//! Pods publish their test results as open key/value maps whose field names
//! drift between firmware versions.  This module is the only place that
//! knows how to read them: it takes a raw record plus the definition's
//! [`FieldSynonyms`] and returns an [`Extracted`] view with every field
//! optional.  The synonym lists stay data in [`crate::catalog`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::catalog::{COMPLETED_STATUS, FieldSynonyms};

/// One result record as returned by the gateway.
pub type Record = Map<String, Value>;

/// Envelope keys some gateway deployments wrap their record list in.
const ENVELOPE_KEYS: &[&str] = &["data", "records"];

/// Fields read out of a record.  Absent fields stay `None` / absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub test_name: Option<String>,
    pub test_status: Option<String>,
    pub metrics: BTreeMap<&'static str, i64>,
}

impl Extracted {
    /// `true` when the status equals `completed`, ignoring case and
    /// surrounding whitespace.
    pub fn is_completed(&self) -> bool {
        self.test_status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(COMPLETED_STATUS))
    }

    /// `true` when the record carries an explicit status of any value.
    pub fn has_status(&self) -> bool {
        self.test_status.is_some()
    }
}

/// Read the logical fields out of `record`, first matching synonym wins.
pub fn normalize(record: &Record, fields: &FieldSynonyms) -> Extracted {
    let metrics = fields
        .metrics
        .iter()
        .filter_map(|m| first_integer(record, m.synonyms).map(|v| (m.name, v)))
        .collect();

    Extracted {
        test_name: first_text(record, fields.test_name),
        test_status: first_text(record, fields.test_status),
        metrics,
    }
}

/// Split a Subscribe response body into records.
///
/// Accepts a single object, an array of objects, or either of those inside
/// a `data` / `records` envelope.  Non-object array items are skipped.
pub fn records_from_body(body: Value) -> Vec<Record> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if matches!(map.get(*key), Some(Value::Array(_) | Value::Object(_))) {
                    if let Some(inner) = map.remove(*key) {
                        return records_from_body(inner);
                    }
                }
            }
            if map.is_empty() {
                Vec::new()
            } else {
                vec![map]
            }
        }
        _ => Vec::new(),
    }
}

fn first_text(record: &Record, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match record.get(*name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn first_integer(record: &Record, names: &[&str]) -> Option<i64> {
    names.iter().find_map(|name| match record.get(*name)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
