//! Factory configuration.

use serde::{Deserialize, Serialize};

/// Tag keys read from struct fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagKeys {
    /// Rule text (default: `validate`).
    pub validate: String,
    /// Default value text (default: `default`).
    pub default: String,
    /// Override error message (default: `errMsg`).
    pub err_msg: String,
    /// Display name used as the path segment; `-` skips the field
    /// (default: `name`).
    pub name: String,
}

impl Default for TagKeys {
    fn default() -> Self {
        Self {
            validate: "validate".to_owned(),
            default: "default".to_owned(),
            err_msg: "errMsg".to_owned(),
            name: "name".to_owned(),
        }
    }
}

/// Settings for a [`Factory`](super::Factory).
///
/// Every field has a default, so a partial config file is enough:
///
/// ```
/// use nebula_rules::factory::FactoryConfig;
///
/// let config: FactoryConfig =
///     serde_json::from_str(r#"{"tag_keys": {"validate": "rule"}}"#).unwrap();
/// assert_eq!(config.tag_keys.validate, "rule");
/// assert_eq!(config.tag_keys.default, "default");
/// assert!(config.cache);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Tag keys for struct fields.
    pub tag_keys: TagKeys,
    /// Cache compiled validators by type and rule (default: on).
    pub cache: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            tag_keys: TagKeys::default(),
            cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_keys() {
        let keys = TagKeys::default();
        assert_eq!(keys.validate, "validate");
        assert_eq!(keys.default, "default");
        assert_eq!(keys.err_msg, "errMsg");
        assert_eq!(keys.name, "name");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: FactoryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FactoryConfig::default());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = FactoryConfig {
            cache: false,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: FactoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
