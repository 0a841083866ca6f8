//! Turn whatever the classifier sent back into one verdict per expected id.
//!
//! Malformed output never becomes an error here. Anything that cannot be
//! read resolves to [`Flag::Normal`] with a placeholder reason.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::models::{Flag, FlagMap, FlagResult};

pub const NO_REASON: &str = "No reason provided";
pub const UNPARSEABLE: &str = "Unable to parse response";

/// Build a verdict for every id in `expected_ids` from the raw classifier payload.
///
/// The returned map always holds exactly the expected ids. Payload entries for
/// other ids are dropped.
pub fn normalize_batch<S: AsRef<str>>(expected_ids: &[S], raw: &str) -> FlagMap {
    let Some(entries) = interpret(raw, expected_ids.len()) else {
        warn!(
            expected = expected_ids.len(),
            "classifier response could not be parsed; defaulting batch to Normal"
        );
        return expected_ids
            .iter()
            .map(|id| (id.as_ref().to_string(), FlagResult::new(Flag::Normal, UNPARSEABLE)))
            .collect();
    };

    let single = match expected_ids {
        [only] if !entries.contains_key(only.as_ref()) && is_bare_verdict(&entries) => {
            Some(only.as_ref())
        }
        _ => None,
    };

    for key in entries.keys() {
        if single.is_none() && !expected_ids.iter().any(|id| id.as_ref() == key) {
            debug!(id = %key, "discarding verdict for id outside this batch");
        }
    }

    expected_ids
        .iter()
        .map(|id| {
            let id = id.as_ref();
            let entry = if single.is_some() {
                Some(Value::Object(entries.clone()))
            } else {
                entries.get(id).cloned()
            };
            (id.to_string(), verdict_from_entry(entry.as_ref()))
        })
        .collect()
}

fn verdict_from_entry(entry: Option<&Value>) -> FlagResult {
    let flag = entry
        .and_then(|e| e.get("flag"))
        .and_then(Value::as_str)
        .and_then(Flag::from_raw)
        .unwrap_or(Flag::Normal);

    let reason = entry
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(NO_REASON);

    FlagResult::new(flag, reason)
}

/// A `{flag, reason}` object rather than an `id → {flag, reason}` map.
fn is_bare_verdict(entries: &Map<String, Value>) -> bool {
    entries.get("flag").is_some_and(Value::is_string)
}

/// Parse the payload as a JSON object, tolerating code fences and prose
/// around it. Returns `None` when no object can be recovered.
fn interpret(raw: &str, expected: usize) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidates = [Some(trimmed), strip_fence(trimmed), outermost_object(trimmed)];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return Some(map);
        }
    }

    debug!(expected, len = raw.len(), "no JSON object found in classifier output");
    None
}

fn strip_fence(text: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("fence pattern is valid")
    });
    fence
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_defaults_to_normal() {
        let raw = r#"{"r1":{"flag":"Suspicious","reason":"late night charge"}}"#;
        let map = normalize_batch(&["r1", "r2"], raw);

        assert_eq!(map.len(), 2);
        assert_eq!(
            map["r1"],
            FlagResult::new(Flag::Suspicious, "late night charge")
        );
        assert_eq!(map["r2"], FlagResult::new(Flag::Normal, NO_REASON));
    }

    #[test]
    fn test_unparseable_payload() {
        let map = normalize_batch(&["a", "b", "c"], "I think these look fine!");
        assert_eq!(map.len(), 3);
        for result in map.values() {
            assert_eq!(*result, FlagResult::new(Flag::Normal, UNPARSEABLE));
        }
    }

    #[test]
    fn test_empty_and_truncated_payloads() {
        assert_eq!(
            normalize_batch(&["a"], "")["a"],
            FlagResult::new(Flag::Normal, UNPARSEABLE)
        );
        assert_eq!(
            normalize_batch(&["a"], r#"{"a":{"flag":"Suspi"#)["a"],
            FlagResult::new(Flag::Normal, UNPARSEABLE)
        );
    }

    #[test]
    fn test_non_object_json_is_unparseable() {
        let map = normalize_batch(&["a"], r#"["Suspicious"]"#);
        assert_eq!(map["a"], FlagResult::new(Flag::Normal, UNPARSEABLE));
    }

    #[test]
    fn test_unknown_flag_collapses_to_normal() {
        let raw = r#"{"a":{"flag":"maybe","reason":"hard to say"},"b":{"flag":"SUSPICIOUS"}}"#;
        let map = normalize_batch(&["a", "b"], raw);
        assert_eq!(map["a"], FlagResult::new(Flag::Normal, "hard to say"));
        assert_eq!(map["b"], FlagResult::new(Flag::Normal, NO_REASON));
    }

    #[test]
    fn test_blank_reason_gets_placeholder() {
        let raw = r#"{"a":{"flag":"Suspicious","reason":"   "},"b":{"flag":"Normal","reason":null}}"#;
        let map = normalize_batch(&["a", "b"], raw);
        assert_eq!(map["a"], FlagResult::new(Flag::Suspicious, NO_REASON));
        assert_eq!(map["b"], FlagResult::new(Flag::Normal, NO_REASON));
    }

    #[test]
    fn test_entry_that_is_not_an_object() {
        let map = normalize_batch(&["a"], r#"{"a":"Suspicious"}"#);
        assert_eq!(map["a"], FlagResult::new(Flag::Normal, NO_REASON));
    }

    #[test]
    fn test_foreign_ids_are_discarded() {
        let raw = r#"{"a":{"flag":"Normal","reason":"ok"},"zz":{"flag":"Suspicious","reason":"x"}}"#;
        let map = normalize_batch(&["a"], raw);
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("zz"));
    }

    #[test]
    fn test_code_fence_is_tolerated() {
        let raw = "```json\n{\"a\":{\"flag\":\"Suspicious\",\"reason\":\"cash withdrawal\"}}\n```";
        let map = normalize_batch(&["a"], raw);
        assert_eq!(map["a"], FlagResult::new(Flag::Suspicious, "cash withdrawal"));
    }

    #[test]
    fn test_surrounding_prose_is_tolerated() {
        let raw = "Here you go: {\"a\":{\"flag\":\"Suspicious\",\"reason\":\"weekend bar tab\"}} Hope that helps.";
        let map = normalize_batch(&["a"], raw);
        assert_eq!(map["a"].flag, Flag::Suspicious);
    }

    #[test]
    fn test_single_bare_verdict() {
        let map = normalize_batch(&["r1"], r#"{"flag":"Suspicious","reason":"alcohol"}"#);
        assert_eq!(map["r1"], FlagResult::new(Flag::Suspicious, "alcohol"));

        let map = normalize_batch(&["r1"], r#"{"flag":"maybe"}"#);
        assert_eq!(map["r1"], FlagResult::new(Flag::Normal, NO_REASON));
    }

    #[test]
    fn test_single_keyed_verdict() {
        let map = normalize_batch(&["r1"], r#"{"r1":{"flag":"Suspicious","reason":"odd hour"}}"#);
        assert_eq!(map.len(), 1);
        assert_eq!(map["r1"], FlagResult::new(Flag::Suspicious, "odd hour"));
    }

    #[test]
    fn test_bare_verdict_ignored_for_multi_id_batches() {
        let map = normalize_batch(&["a", "b"], r#"{"flag":"Suspicious","reason":"x"}"#);
        assert_eq!(map["a"], FlagResult::new(Flag::Normal, NO_REASON));
        assert_eq!(map["b"], FlagResult::new(Flag::Normal, NO_REASON));
    }
}
