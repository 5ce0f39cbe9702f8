//! Engine configuration.

use serde::Deserialize;

/// Options controlling expansion.
///
/// Deserializable so a host can load them from JSON; every field has a
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Fail when a node lineage is rewritten more than `divergence_limit` times.
    pub divergence_guard: bool,
    pub divergence_limit: u32,
    /// Prefix of identifiers returned by `Context::generate_id`.
    pub id_prefix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            divergence_guard: false,
            divergence_limit: 100,
            id_prefix: "uniq".to_string(),
        }
    }
}

impl EngineOptions {
    /// Parse options from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Turn the divergence guard on or off.
    pub fn with_divergence_guard(mut self, enable: bool) -> Self {
        self.divergence_guard = enable;
        self
    }
}
