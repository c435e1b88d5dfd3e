//! Settings loading from configuration text.
//!
//! This module builds [`EngineSettings`] from TOML or JSON documents and
//! applies environment variable overrides. Reading the documents from disk is
//! left to the host application.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Merge a TOML or JSON document over the defaults.
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `RUSTY_TEMPLATES_AUTOESCAPE` | `autoescape` |
//! | `RUSTY_TEMPLATES_DEBUG` | `debug` |
//! | `RUSTY_TEMPLATES_LOG_LEVEL` | `log_level` |
//! | `RUSTY_TEMPLATES_STRING_IF_INVALID` | `string_if_invalid` |
//!
//! ## Examples
//!
//! ```
//! use rusty_templates_core::settings::UndefinedBehavior;
//! use rusty_templates_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_str(r#"
//!     autoescape = false
//!     undefined = "lenient"
//!     builtins = ["custom_filters"]
//! "#).unwrap();
//!
//! assert!(!settings.autoescape);
//! assert_eq!(settings.undefined, UndefinedBehavior::Lenient);
//! assert_eq!(settings.log_level, "info");
//! ```

use crate::error::ConfigError;
use crate::settings::EngineSettings;

/// Setting names a document may carry. Anything else is ignored with a warning.
const SETTING_KEYS: [&str; 7] = [
    "autoescape",
    "undefined",
    "string_if_invalid",
    "builtins",
    "debug",
    "log_level",
    "diagnostic_width",
];

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<EngineSettings, ConfigError> {
    let table: toml::Table = toml::from_str(toml_str).map_err(|e| ConfigError::Toml(e.to_string()))?;
    let document = serde_json::to_value(table).map_err(|e| ConfigError::Toml(e.to_string()))?;
    settings_from_document(document)
}

/// Loads settings from a TOML string and then applies environment variable overrides.
pub fn from_toml_str_with_env(toml_str: &str) -> Result<EngineSettings, ConfigError> {
    let mut settings = from_toml_str(toml_str)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// Any fields not present in the JSON keep their default values.
pub fn from_json_str(json_str: &str) -> Result<EngineSettings, ConfigError> {
    let document: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| ConfigError::Json(e.to_string()))?;
    settings_from_document(document)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> EngineSettings {
    let mut settings = EngineSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes" (case-insensitive) as true and
/// anything else as false.
pub fn apply_env_overrides(settings: &mut EngineSettings) {
    if let Ok(val) = std::env::var("RUSTY_TEMPLATES_AUTOESCAPE") {
        settings.autoescape = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("RUSTY_TEMPLATES_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("RUSTY_TEMPLATES_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("RUSTY_TEMPLATES_STRING_IF_INVALID") {
        settings.string_if_invalid = val;
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

// Missing fields fall back to `EngineSettings::default()` through
// `#[serde(default)]`.
fn settings_from_document(document: serde_json::Value) -> Result<EngineSettings, ConfigError> {
    let serde_json::Value::Object(fields) = document else {
        return Err(ConfigError::Invalid(
            "settings must be a table of key/value pairs".to_string(),
        ));
    };
    for key in fields.keys().filter(|key| !SETTING_KEYS.contains(&key.as_str())) {
        tracing::warn!(key = %key, "ignoring unknown engine setting");
    }
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| ConfigError::Invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::UndefinedBehavior;

    #[test]
    fn test_from_toml_str_partial() {
        let settings = from_toml_str("debug = true\nlog_level = \"trace\"").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "trace");
        assert!(settings.autoescape);
    }

    #[test]
    fn test_from_toml_str_full() {
        let settings = from_toml_str(
            r#"
            autoescape = false
            undefined = "lenient"
            string_if_invalid = "INVALID %s"
            builtins = ["custom_filters", "more_filters"]
            diagnostic_width = 120
            "#,
        )
        .unwrap();
        assert!(!settings.autoescape);
        assert_eq!(settings.undefined, UndefinedBehavior::Lenient);
        assert_eq!(settings.string_if_invalid, "INVALID %s");
        assert_eq!(settings.builtins.len(), 2);
        assert_eq!(settings.diagnostic_width, 120);
    }

    #[test]
    fn test_from_toml_str_malformed() {
        let err = from_toml_str("autoescape = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let err = from_toml_str("autoescape = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_json_str() {
        let settings =
            from_json_str(r#"{"builtins": ["custom_filters"], "undefined": "strict"}"#).unwrap();
        assert_eq!(settings.builtins, vec!["custom_filters".to_string()]);
        assert_eq!(settings.undefined, UndefinedBehavior::Strict);
    }

    #[test]
    fn test_from_json_str_rejects_non_object() {
        let err = from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_json_str_malformed() {
        let err = from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("off"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let settings = from_toml_str("autoescape = false\ntemplate_dirs = [\"a\"]").unwrap();
        assert!(!settings.autoescape);
        assert_eq!(settings, EngineSettings::default().with_autoescape(false));
    }

    #[test]
    fn test_setting_keys_cover_every_field() {
        let defaults = serde_json::to_value(EngineSettings::default()).unwrap();
        let mut fields: Vec<_> = defaults.as_object().unwrap().keys().cloned().collect();
        fields.sort();
        let mut keys: Vec<_> = SETTING_KEYS.iter().map(ToString::to_string).collect();
        keys.sort();
        assert_eq!(fields, keys);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(from_toml_str("").unwrap(), EngineSettings::default());
        assert_eq!(from_json_str("{}").unwrap(), EngineSettings::default());
    }
}
