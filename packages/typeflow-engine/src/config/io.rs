//! Configuration I/O (YAML loading)
//!
//! Schema v1:
//! ```yaml
//! version: 1
//! preset: balanced
//! overrides:
//!   context_strategy: object_sensitive
//!   context_depth: 2
//!   max_iterations: null   # unbounded
//! ```

use super::analysis_config::TypeFlowConfig;
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use crate::features::type_flow::infrastructure::context_policy::ContextStrategy;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Schema versions this build understands
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides applied on top of the preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Field-level overrides; absent fields keep the preset value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_strategy: Option<ContextStrategy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_depth: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamp_declared_types: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub divert_parameter_returns: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_threshold: Option<usize>,

    /// `null` clears the preset's budget
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_iterations: Option<Option<usize>>,

    /// `null` clears the preset's budget
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_budget_ms: Option<Option<u64>>,
}

/// Present key, possibly `null`; absent keys fall back to `default`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ConfigOverrides {
    /// Apply every present field onto `base`
    pub fn apply(&self, mut base: TypeFlowConfig) -> TypeFlowConfig {
        if let Some(v) = self.context_strategy {
            base.context_strategy = v;
        }
        if let Some(v) = self.context_depth {
            base.context_depth = v;
        }
        if let Some(v) = self.clamp_declared_types {
            base.clamp_declared_types = v;
        }
        if let Some(v) = self.divert_parameter_returns {
            base.divert_parameter_returns = v;
        }
        if let Some(v) = self.strict {
            base.strict = v;
        }
        if let Some(v) = self.parallel {
            base.parallel = v;
        }
        if let Some(v) = self.num_threads {
            base.num_threads = v;
        }
        if let Some(v) = self.batch_size {
            base.batch_size = v;
        }
        if let Some(v) = self.parallel_threshold {
            base.parallel_threshold = v;
        }
        if let Some(v) = self.max_iterations {
            base.max_iterations = v;
        }
        if let Some(v) = self.time_budget_ms {
            base.time_budget_ms = v;
        }
        base
    }

    /// Full override set reproducing `config` exactly
    fn from_config(config: &TypeFlowConfig) -> Self {
        Self {
            context_strategy: Some(config.context_strategy),
            context_depth: Some(config.context_depth),
            clamp_declared_types: Some(config.clamp_declared_types),
            divert_parameter_returns: Some(config.divert_parameter_returns),
            strict: Some(config.strict),
            parallel: Some(config.parallel),
            num_threads: Some(config.num_threads),
            batch_size: Some(config.batch_size),
            parallel_threshold: Some(config.parallel_threshold),
            max_iterations: Some(config.max_iterations),
            time_budget_ms: Some(config.time_budget_ms),
        }
    }
}

impl TypeFlowConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(yaml)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = file.preset.parse()?;
        let base = TypeFlowConfig::from_preset(preset);
        let config = match &file.overrides {
            Some(overrides) => overrides.apply(base),
            None => base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file on disk
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Serialize as a custom-preset document with every field overridden
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            preset: Preset::Custom.as_str().to_string(),
            overrides: Some(ConfigOverrides::from_config(self)),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_roundtrip() {
        let config = TypeFlowConfig::from_preset(Preset::Thorough).max_iterations(Some(5000));

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: custom"));
        assert!(yaml.contains("context_strategy: object_sensitive"));

        let loaded = TypeFlowConfig::from_yaml(&yaml).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_yaml_loading() {
        let yaml_content = r#"
version: 1
preset: fast
overrides:
  context_strategy: type_sensitive
  context_depth: 1
  max_iterations: 100000
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml_content.as_bytes()).unwrap();

        let config = TypeFlowConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.context_strategy, ContextStrategy::TypeSensitive);
        assert_eq!(config.context_depth, 1);
        assert_eq!(config.max_iterations, Some(100000));
        // untouched fields keep the preset value
        assert!(!config.clamp_declared_types);
    }

    #[test]
    fn test_null_override_clears_budget() {
        let overrides = ConfigOverrides {
            max_iterations: Some(None),
            ..Default::default()
        };
        let base = TypeFlowConfig::default()
            .max_iterations(Some(10))
            .time_budget_ms(Some(50));
        let config = overrides.apply(base);
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.time_budget_ms, Some(50));

        let yaml = "version: 1\npreset: fast\noverrides:\n  max_iterations: null\n  time_budget_ms: 250\n";
        let parsed: ConfigFileV1 = serde_yaml::from_str(yaml).unwrap();
        let overrides = parsed.overrides.unwrap();
        assert_eq!(overrides.max_iterations, Some(None));
        assert_eq!(overrides.time_budget_ms, Some(Some(250)));

        let absent: ConfigOverrides = serde_yaml::from_str("context_depth: 1\n").unwrap();
        assert_eq!(absent.max_iterations, None);
    }

    #[test]
    fn test_unbounded_budget_survives_roundtrip() {
        let config = TypeFlowConfig::default().max_iterations(None).time_budget_ms(None);
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("max_iterations: null"));
        assert_eq!(TypeFlowConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_missing_version() {
        let err = TypeFlowConfig::from_yaml("preset: fast\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVersion));
    }

    #[test]
    fn test_unsupported_version() {
        let err = TypeFlowConfig::from_yaml("version: 2\npreset: fast\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn test_unknown_preset() {
        let err = TypeFlowConfig::from_yaml("version: 1\npreset: paranoid\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(ref p) if p == "paranoid"));
    }

    #[test]
    fn test_unknown_override_field() {
        let yaml = "version: 1\npreset: fast\noverrides:\n  context_dept: 2\n";
        let err = TypeFlowConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_invalid_override_is_validated() {
        let yaml = "version: 1\npreset: balanced\noverrides:\n  batch_size: 0\n";
        let err = TypeFlowConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = TypeFlowConfig::from_yaml_file("/nonexistent/typeflow.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
