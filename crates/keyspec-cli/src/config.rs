//! # Validator Configuration
//!
//! Engine options come from an optional configuration file given with the
//! global `--config` flag, then from command-line overrides.
//!
//! ```yaml
//! # keyspec.yaml
//! nested_siblings: continue   # or short_circuit (default)
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use keyspec_schema::{read_value, SiblingPolicy, ValidatorOptions};

/// Load options from `config` (if given) and apply overrides.
pub fn resolve_options(config: Option<&Path>, continue_siblings: bool) -> Result<ValidatorOptions> {
    let mut options = match config {
        Some(path) => load_options(path)?,
        None => ValidatorOptions::default(),
    };

    if continue_siblings {
        options.nested_siblings = SiblingPolicy::Continue;
    }

    tracing::debug!(nested_siblings = ?options.nested_siblings, "resolved validator options");
    Ok(options)
}

/// Read a JSON or YAML configuration file into [`ValidatorOptions`].
pub fn load_options(path: &Path) -> Result<ValidatorOptions> {
    let value = read_value(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    // An empty YAML file parses as null; treat it as all defaults.
    if value.is_null() {
        return Ok(ValidatorOptions::default());
    }
    serde_json::from_value(value)
        .with_context(|| format!("invalid config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let options = resolve_options(None, false).unwrap();
        assert_eq!(options, ValidatorOptions::default());
        assert_eq!(options.nested_siblings, SiblingPolicy::ShortCircuit);
    }

    #[test]
    fn flag_overrides_default() {
        let options = resolve_options(None, true).unwrap();
        assert_eq!(options.nested_siblings, SiblingPolicy::Continue);
    }

    #[test]
    fn yaml_config_sets_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyspec.yaml");
        std::fs::write(&path, "nested_siblings: continue\n").unwrap();
        let options = resolve_options(Some(&path), false).unwrap();
        assert_eq!(options.nested_siblings, SiblingPolicy::Continue);
    }

    #[test]
    fn json_config_sets_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyspec.json");
        std::fs::write(&path, r#"{"nested_siblings": "short_circuit"}"#).unwrap();
        let options = load_options(&path).unwrap();
        assert_eq!(options.nested_siblings, SiblingPolicy::ShortCircuit);
    }

    #[test]
    fn empty_yaml_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyspec.yaml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_options(&path).unwrap(), ValidatorOptions::default());
    }

    #[test]
    fn unknown_config_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyspec.yaml");
        std::fs::write(&path, "max_depth: 10\n").unwrap();
        let err = load_options(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config file"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = resolve_options(Some(Path::new("/nonexistent/keyspec.yaml")), false).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
