use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::{Catalog, RuleSpec};
use crate::error::{TranslateError, TranslateResult};
use crate::translator::{FallbackPolicy, Translator};

/// Build a catalog from JSON text.
///
/// Two layouts are accepted: a bare array of rule specs, or an object with a
/// `rules` array. Object keys starting with `@` are metadata and ignored:
/// ```json
/// {
///     "@metadata": { "authors": ["..."] },
///     "rules": [
///         { "name": "int", "kind": "TypeRef",
///           "when": [{ "equals": { "capture": "name", "value": "int" } }],
///           "template": "i64" }
///     ]
/// }
/// ```
pub fn catalog_from_json_str(content: &str, origin: &str) -> TranslateResult<Catalog> {
    // Parse JSON
    let json: Value = serde_json::from_str(content).map_err(|e| TranslateError::Json {
        path: origin.to_string(),
        source: e,
    })?;

    // Find the rule array, skipping @metadata
    let rules = match json {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut obj) => {
            for key in obj.keys() {
                if !key.starts_with('@') && key != "rules" {
                    warn!(key = key.as_str(), origin, "ignoring unknown key in rule file");
                }
            }
            obj.remove("rules").unwrap_or(Value::Array(Vec::new()))
        }
        _ => {
            return Err(TranslateError::InvalidRuleFile(format!(
                "'{}': root must be an array or an object",
                origin
            )));
        }
    };

    // Build rules in file order
    let specs: Vec<RuleSpec> = serde_json::from_value(rules).map_err(|e| TranslateError::Json {
        path: origin.to_string(),
        source: e,
    })?;
    Catalog::try_from(specs)
}

/// Load a catalog from a JSON rule file
///
/// # Arguments
/// * `path` - Path to the JSON rule file
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON, or a rule spec of the wrong shape
/// - Duplicate rule names, malformed templates, invalid patterns
pub fn load_catalog_from_file(path: &Path) -> TranslateResult<Catalog> {
    // Read the file
    let content = fs::read_to_string(path).map_err(|e| TranslateError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let catalog = catalog_from_json_str(&content, &path.display().to_string())?;
    info!(path = %path.display(), rules = catalog.len(), "loaded rule file");
    Ok(catalog)
}

/// Translator settings, usually read from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    pub fallback: FallbackPolicy,
    /// Start from the built-in rules
    pub builtin: bool,
    /// Rule files layered after the built-in rules, in order
    pub rules: Vec<PathBuf>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            fallback: FallbackPolicy::Fail,
            builtin: true,
            rules: Vec::new(),
        }
    }
}

impl TranslatorConfig {
    /// Assemble the catalog this config describes. Fails on the first
    /// duplicate name across the layered rule sets.
    pub fn build_catalog(&self) -> TranslateResult<Catalog> {
        let mut catalog = if self.builtin {
            Catalog::builtin()?
        } else {
            Catalog::new()
        };
        for path in &self.rules {
            catalog.extend(load_catalog_from_file(path)?)?;
        }
        Ok(catalog)
    }

    pub fn build_translator(&self) -> TranslateResult<Translator> {
        Ok(Translator::new(self.build_catalog()?).with_fallback(self.fallback))
    }
}

/// Load translator settings from a JSON file.
///
/// Relative rule paths are resolved against the config file's directory.
pub fn load_config_from_file(path: &Path) -> TranslateResult<TranslatorConfig> {
    // Read the file
    let content = fs::read_to_string(path).map_err(|e| TranslateError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    // Parse JSON
    let mut config: TranslatorConfig =
        serde_json::from_str(&content).map_err(|e| TranslateError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
    // Resolve rule paths against the config file
    if let Some(dir) = path.parent() {
        config.rules = config
            .rules
            .into_iter()
            .map(|rule| if rule.is_relative() { dir.join(rule) } else { rule })
            .collect();
    }
    Ok(config)
}
