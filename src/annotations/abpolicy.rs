//! `abpolicy-*` annotation extraction.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::error;

use crate::annotations::parser;
use crate::error::FluxgateResult;
use crate::policy::{Policy, PolicyBackend};

/// Toggles the whole rule; absent or unparsable means disabled.
pub const ANNOTATION_ENABLED: &str = "abpolicy";
pub const ANNOTATION_HOST: &str = "abpolicy-host";
pub const ANNOTATION_PATH: &str = "abpolicy-path";
pub const ANNOTATION_HEADER: &str = "abpolicy-header";
pub const ANNOTATION_TYPE: &str = "abpolicy-type";
/// JSON-encoded array of `{name, header}` records.
pub const ANNOTATION_BACKENDS: &str = "abpolicy-backends";

/// Annotation-side backend record; `name` is the upstream group.
#[derive(Debug, Clone, Deserialize)]
struct BackendEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    header: String,
}

/// Parse one routing rule's annotations into a validated [`Policy`].
///
/// Every key defaults independently: a bad value in one key never disturbs
/// another. Malformed backends JSON degrades to an empty list (logged), so
/// the rule fails validation like one that configured no backends at all.
pub fn parse(annotations: &HashMap<String, String>) -> FluxgateResult<Policy> {
    let enabled = parser::get_bool(annotations, ANNOTATION_ENABLED).unwrap_or(false);
    let host = parser::get_string(annotations, ANNOTATION_HOST).unwrap_or_default();
    let path = parser::get_string(annotations, ANNOTATION_PATH).unwrap_or_default();
    let header = parser::get_string(annotations, ANNOTATION_HEADER).unwrap_or_default();
    let diversion = parser::get_string(annotations, ANNOTATION_TYPE).unwrap_or_default();

    let backends_raw =
        parser::get_string(annotations, ANNOTATION_BACKENDS).unwrap_or_else(|_| "[]".to_string());
    let entries: Vec<BackendEntry> = match serde_json::from_str(&backends_raw) {
        Ok(entries) => entries,
        Err(e) => {
            error!(
                "Failed to parse {} value {:?}: {}",
                ANNOTATION_BACKENDS, backends_raw, e
            );
            Vec::new()
        }
    };

    let policy = Policy {
        enabled,
        host,
        path,
        diversion,
        header,
        upstreams: entries
            .into_iter()
            .map(|entry| PolicyBackend {
                header: entry.header,
                upstream: entry.name,
            })
            .collect(),
    };

    policy.validate()?;
    Ok(policy)
}
