//! Recovery of the structured section embedded in an LLM reply

use crate::scoring::{ParseError, ParseErrorKind};
use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Single-level object literals, used when no array can be recovered
fn object_literal_regex() -> &'static Regex {
    static OBJECT_LITERAL: OnceLock<Regex> = OnceLock::new();
    OBJECT_LITERAL.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("Invalid object literal regex"))
}

/// Extract the raw competency entries from an LLM reply.
///
/// Tries every `[` in order and keeps the first balanced array that parses as
/// JSON and holds at least one object. When no such array exists (typically a
/// reply cut off mid-array) it falls back to parsing each flat `{...}` literal
/// on its own.
pub fn extract_structured_section(raw: &str) -> std::result::Result<Vec<Value>, ParseError> {
    if let Some(entries) = find_structured_array(raw) {
        return Ok(entries);
    }

    let objects = scan_object_literals(raw);
    if objects.is_empty() {
        return Err(ParseError::new(ParseErrorKind::NoStructuredData, raw));
    }

    debug!("Recovered {} object literal(s) without an enclosing array", objects.len());
    Ok(objects)
}

/// Free text after the last `]`, trimmed; empty when there is none
pub fn extract_commentary(raw: &str) -> String {
    match raw.rfind(']') {
        Some(idx) => raw[idx + 1..].trim().to_string(),
        None => String::new(),
    }
}

fn find_structured_array(raw: &str) -> Option<Vec<Value>> {
    for (start, _) in raw.match_indices('[') {
        let Some(end) = balanced_end(raw, start) else {
            continue;
        };

        match serde_json::from_str::<Value>(&raw[start..end]) {
            Ok(Value::Array(items)) if items.iter().any(Value::is_object) => return Some(items),
            Ok(_) => debug!("Skipping bracketed span at byte {} without objects", start),
            Err(e) => debug!("Skipping unparseable bracketed span at byte {}: {}", start, e),
        }
    }

    None
}

/// End offset (exclusive) of the bracket group opened at `start`.
///
/// Nesting of `[]` and `{}` must match and brackets inside JSON string
/// literals are ignored. Returns `None` for mismatched or unterminated groups.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut closers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' => closers.push(b']'),
            b'{' => closers.push(b'}'),
            b']' | b'}' => {
                if closers.pop()? != byte {
                    return None;
                }
                if closers.is_empty() {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn scan_object_literals(raw: &str) -> Vec<Value> {
    object_literal_regex()
        .find_iter(raw)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_surrounded_by_prose() {
        let raw = "Segue a análise:\n```json\n[\n  {\"Área\": \"Finanças\", \"Pontuação\": 82},\n  {\"Área\": \"SQL\", \"Pontuação\": 70}\n]\n```\nPontos fortes: clareza.";
        let entries = extract_structured_section(raw).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["Área"], "Finanças");
        assert_eq!(entries[1]["Pontuação"], 70);
    }

    #[test]
    fn test_footnote_brackets_do_not_shadow_array() {
        let raw = "Nota [1]: veja abaixo [ok]\n[{\"Área\": \"Python\", \"Pontuação\": 78}]";
        let entries = extract_structured_section(raw).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["Área"], "Python");
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let raw = "[{\"Área\": \"Excel [avançado]\", \"Pontuação\": 90}] fim";
        let entries = extract_structured_section(raw).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["Área"], "Excel [avançado]");
    }

    #[test]
    fn test_truncated_array_falls_back_to_objects() {
        let raw = "[\n{\"Área\": \"Economia\", \"Pontuação\": 85},\n{\"Área\": \"Valuation\", \"Pontuação\": 60},\n{\"Área\": \"Contab";
        let entries = extract_structured_section(raw).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["Área"], "Valuation");
    }

    #[test]
    fn test_malformed_array_keeps_parseable_objects() {
        let raw = "[{\"Área\": \"SQL\", \"Pontuação\": 75}, {Área: sem aspas}]";
        let entries = extract_structured_section(raw).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["Área"], "SQL");
    }

    #[test]
    fn test_no_structure() {
        let err = extract_structured_section("Desculpe, não consigo gerar uma análise.").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::NoStructuredData);
    }

    #[test]
    fn test_empty_array_is_not_structure() {
        let err = extract_structured_section("Resultado: []").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::NoStructuredData);
    }

    #[test]
    fn test_balanced_end_rejects_mismatch() {
        assert_eq!(balanced_end("[{]}", 0), None);
        assert_eq!(balanced_end("[[1], [2]] tail", 0), Some(10));
        assert_eq!(balanced_end("x [\"]\"] y", 2), Some(7));
    }

    #[test]
    fn test_commentary_after_last_bracket() {
        assert_eq!(extract_commentary("[1] a [2]  Pontos fortes.  "), "Pontos fortes.");
        assert_eq!(extract_commentary("sem colchetes"), "");
        assert_eq!(extract_commentary("[{\"a\": 1}]   \n"), "");
    }
}
