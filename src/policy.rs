//! Traffic-diversion policy model.
//!
//! A [`Policy`] describes one A/B rule: which (host, path) it applies to,
//! which request header drives the split, and which upstream group each
//! header value maps to. Policies are pure data; they are produced by the
//! annotation parser on the control-plane side and deserialized from the
//! shared-state payload on the worker side. Once constructed they are never
//! mutated, only replaced wholesale by the next push.

use serde::{Deserialize, Serialize};

use crate::error::{FluxgateError, FluxgateResult};

/// Diversion strategy selector.
///
/// Only header-based splitting is implemented; any other selector string is
/// carried through untouched and simply never matches traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiversionType {
    /// Split on a request header value
    Header,
    /// Recognized as data, ignored by the router
    Unsupported,
}

impl From<&str> for DiversionType {
    fn from(raw: &str) -> Self {
        match raw {
            "header" => DiversionType::Header,
            _ => DiversionType::Unsupported,
        }
    }
}

/// One header-value → upstream-group mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyBackend {
    /// Header value this entry matches
    #[serde(default)]
    pub header: String,
    /// Upstream group receiving the diverted traffic
    pub upstream: String,
}

/// A single traffic-diversion rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Set from the `abpolicy` annotation; not part of the wire payload.
    /// The control plane only pushes policies that validated as enabled.
    #[serde(skip)]
    pub enabled: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    /// Raw selector string, e.g. "header"
    #[serde(rename = "type", default)]
    pub diversion: String,
    /// Request header key consulted by the router
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub upstreams: Vec<PolicyBackend>,
}

impl Policy {
    /// Typed view of the raw diversion selector.
    pub fn diversion_type(&self) -> DiversionType {
        DiversionType::from(self.diversion.as_str())
    }

    /// Enforce the creation invariant: an enabled policy must carry a host,
    /// a path, a diversion selector and at least one upstream mapping.
    /// Disabled policies are always acceptable.
    pub fn validate(&self) -> FluxgateResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.upstreams.is_empty() {
            return Err(FluxgateError::annotation(
                "enabled policy requires at least one backend entry",
            ));
        }
        if self.host.is_empty() {
            return Err(FluxgateError::annotation(
                "enabled policy requires a non-empty host",
            ));
        }
        if self.diversion.is_empty() {
            return Err(FluxgateError::annotation(
                "enabled policy requires a non-empty diversion type",
            ));
        }
        if self.path.is_empty() {
            return Err(FluxgateError::annotation(
                "enabled policy requires a non-empty path",
            ));
        }

        Ok(())
    }
}
