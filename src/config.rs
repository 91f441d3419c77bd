use serde::{Deserialize, Serialize};

use crate::custom_elements::is_valid_custom_element_name;
use crate::{Error, Result};

/// Definition-time settings of the quantity modifier element.
///
/// Per-instance state stays attribute-driven; this only decides the tag the
/// element is registered under, the name of its change event and the
/// fallbacks used for missing or unparseable attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuantityModifierConfig {
    pub tag_name: String,
    pub change_event: String,
    pub default_min: i64,
    pub default_max: i64,
    pub default_value: i64,
}

impl Default for QuantityModifierConfig {
    fn default() -> Self {
        Self {
            tag_name: crate::TAG_NAME.to_string(),
            change_event: crate::CHANGE_EVENT.to_string(),
            default_min: 1,
            default_max: 99,
            default_value: 1,
        }
    }
}

impl QuantityModifierConfig {
    pub fn from_json(src: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(src).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_custom_element_name(&self.tag_name) {
            return Err(Error::InvalidCustomElementName(self.tag_name.clone()));
        }
        if self.change_event.trim().is_empty() {
            return Err(Error::Config("change_event must not be empty".into()));
        }
        Ok(())
    }
}
