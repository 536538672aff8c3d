//! Field and range validation of raw competency entries

use crate::scoring::ParseErrorKind;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accepted key names for the label and score of an entry.
///
/// The first alias present in an entry is the one used, even if its value
/// turns out to be invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub label: Vec<String>,
    pub score: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            label: vec!["Área".to_string(), "Area".to_string(), "label".to_string()],
            score: vec!["Pontuação".to_string(), "Pontuacao".to_string(), "score".to_string()],
        }
    }
}

/// A competency that passed validation: trimmed label, score in [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidEntry {
    pub label: String,
    pub score: f64,
}

/// Keep the entries that carry a usable label and score, in input order.
///
/// Invalid entries are dropped without aborting; only an empty outcome is an
/// error.
pub fn validate_and_normalize(
    entries: &[Value],
    fields: &FieldAliases,
) -> std::result::Result<Vec<ValidEntry>, ParseErrorKind> {
    let valid: Vec<ValidEntry> = entries
        .iter()
        .filter_map(|entry| validate_entry(entry, fields))
        .collect();

    let dropped = entries.len() - valid.len();
    if dropped > 0 {
        debug!("Dropped {} of {} competency entries during validation", dropped, entries.len());
    }

    if valid.is_empty() {
        return Err(ParseErrorKind::NoValidEntries);
    }

    Ok(valid)
}

fn validate_entry(entry: &Value, fields: &FieldAliases) -> Option<ValidEntry> {
    let object = entry.as_object()?;

    let label = match lookup(object, &fields.label)? {
        Value::String(s) => s.trim(),
        _ => return None,
    };
    if label.is_empty() {
        return None;
    }

    let score = coerce_score(lookup(object, &fields.score)?)?;
    if !(0.0..=100.0).contains(&score) {
        return None;
    }

    Some(ValidEntry {
        label: label.to_string(),
        score,
    })
}

fn lookup<'a>(object: &'a Map<String, Value>, aliases: &[String]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| object.get(key))
}

/// Numbers and numeric strings; anything else is not a score
fn coerce_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
