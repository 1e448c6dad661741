use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One addressable backend endpoint.
///
/// Wire field names are camelCase to match the control-plane descriptor.
/// Identity is the `address:port` string; the balancer keys its statistics
/// on it and never mutates the fields themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
    #[serde(rename = "maxFails", alias = "max_fails", default)]
    pub max_fails: u32,
    /// Seconds an endpoint sits out after exhausting max_fails
    #[serde(rename = "failTimeout", alias = "fail_timeout", default)]
    pub fail_timeout: u64,
}

impl Endpoint {
    /// The `address:port` identity string.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Get the failure-timeout window as Duration
    pub fn get_fail_timeout(&self) -> Duration {
        Duration::from_secs(self.fail_timeout)
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.address.is_empty() {
            return Err(anyhow::anyhow!("Endpoint address cannot be empty"));
        }

        if self.port == 0 {
            return Err(anyhow::anyhow!(
                "Endpoint {} port must be greater than 0",
                self.address
            ));
        }

        Ok(())
    }
}

/// A named group of interchangeable endpoints fronting one upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendGroup {
    pub name: String,
    /// Load-balancing selector; `round_robin` picks the cycling balancer,
    /// anything else (including empty) picks EWMA.
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl BackendGroup {
    /// Validate group configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            return Err(anyhow::anyhow!("Backend group name cannot be empty"));
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            endpoint.validate()?;
            if !seen.insert(endpoint.identity()) {
                return Err(anyhow::anyhow!(
                    "Backend group {} has duplicate endpoint {}",
                    self.name,
                    endpoint.identity()
                ));
            }
        }

        Ok(())
    }
}

/// Validate a full set of bootstrap groups: each group valid, names unique.
pub fn validate_groups(groups: &[BackendGroup]) -> anyhow::Result<()> {
    let mut names = HashSet::new();
    for group in groups {
        group.validate()?;
        if !names.insert(group.name.as_str()) {
            return Err(anyhow::anyhow!("Duplicate backend group name: {}", group.name));
        }
    }

    Ok(())
}
