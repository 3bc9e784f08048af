use serde::Deserialize;

use crate::error::EngineError;

/// Properties every catalog item may override whether or not its definition declares them.
pub const DEFAULT_IMPLICIT_PROPERTIES: [&str; 2] = ["DisplayName", "cy_list_price"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevertConfig {
    /// Appended after the schema-derived names whenever no explicit list is given.
    pub implicit_properties: Vec<String>,
}

impl Default for RevertConfig {
    fn default() -> Self {
        Self {
            implicit_properties: DEFAULT_IMPLICIT_PROPERTIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RevertConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }
}
