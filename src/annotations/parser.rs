//! Typed readers over a routing rule's annotation map.
//!
//! Callers decide what a missing or unparsable key means; these functions
//! only distinguish the two failure shapes so per-field defaulting stays at
//! the call site.

use std::collections::HashMap;

use crate::error::{FluxgateError, FluxgateResult};

/// Read an annotation as a trimmed string.
pub fn get_string(annotations: &HashMap<String, String>, key: &str) -> FluxgateResult<String> {
    match annotations.get(key) {
        Some(value) => Ok(value.trim().to_string()),
        None => Err(FluxgateError::annotation(format!(
            "annotation {} is missing",
            key
        ))),
    }
}

/// Read an annotation as a boolean.
///
/// Accepts true/false in any case plus 1/0; anything else is an error the
/// caller is expected to fold into its default.
pub fn get_bool(annotations: &HashMap<String, String>, key: &str) -> FluxgateResult<bool> {
    let raw = get_string(annotations, key)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(FluxgateError::annotation(format!(
            "annotation {} has invalid boolean value {:?}",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_get_string_trims() {
        let meta = annotations(&[("abpolicy-host", "  example.com  ")]);
        assert_eq!(get_string(&meta, "abpolicy-host").unwrap(), "example.com");
    }

    #[test]
    fn test_get_string_missing() {
        let meta = annotations(&[]);
        assert!(get_string(&meta, "abpolicy-host").is_err());
    }

    #[test]
    fn test_get_bool_values() {
        let meta = annotations(&[
            ("a", "true"),
            ("b", "False"),
            ("c", "1"),
            ("d", "0"),
            ("e", "yes"),
        ]);
        assert!(get_bool(&meta, "a").unwrap());
        assert!(!get_bool(&meta, "b").unwrap());
        assert!(get_bool(&meta, "c").unwrap());
        assert!(!get_bool(&meta, "d").unwrap());
        assert!(get_bool(&meta, "e").is_err());
        assert!(get_bool(&meta, "absent").is_err());
    }
}
