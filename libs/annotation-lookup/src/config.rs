//! Lookup configuration.
//!
//! The configuration lives under the `annotation_lookup` section and is
//! layered with `figment`: built-in defaults, then an optional YAML file, then
//! `ANNOTATION_LOOKUP__*` environment variables.
//!
//! ```yaml
//! annotation_lookup:
//!   definitional_namespaces:
//!     - lang.annotation
//!     - kotlin.annotation
//! ```

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::TypeName;
use crate::policy::{DEFAULT_DEFINITIONAL_NAMESPACE, NamespaceExclusion};

/// Section name holding the lookup configuration.
pub const CONFIG_SECTION: &str = "annotation_lookup";

/// Prefix of environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "ANNOTATION_LOOKUP__";

/// Configuration error for lookup setup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid annotation lookup configuration: {source}")]
    Figment {
        #[source]
        source: Box<figment::Error>,
    },
    #[error("invalid definitional namespace '{namespace}'")]
    InvalidNamespace { namespace: String },
}

impl From<figment::Error> for ConfigError {
    fn from(source: figment::Error) -> Self {
        Self::Figment {
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    /// Namespaces whose annotation types are never traversed into.
    /// Accepts a list or a comma-separated string.
    #[serde(deserialize_with = "list_or_csv")]
    pub definitional_namespaces: Vec<String>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            definitional_namespaces: vec![DEFAULT_DEFINITIONAL_NAMESPACE.to_owned()],
        }
    }
}

impl LookupConfig {
    /// Extracts the `annotation_lookup` section, falling back to defaults
    /// when the section is absent.
    ///
    /// # Errors
    /// Returns `ConfigError` if the section cannot be deserialized or names an
    /// invalid namespace.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = match figment.extract_inner(CONFIG_SECTION) {
            Ok(config) => config,
            Err(e) if e.missing() => {
                tracing::debug!("No '{CONFIG_SECTION}' section, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults, the optional YAML file and environment overrides.
    /// A YAML path that does not exist contributes nothing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed, or if the
    /// merged configuration is invalid.
    pub fn load(yaml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::default(CONFIG_SECTION, Self::default()));
        if let Some(path) = yaml_path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX).map(|key| format!("{CONFIG_SECTION}.{key}").into()),
        );

        let config = Self::from_figment(&figment)?;
        tracing::debug!(
            namespaces = ?config.definitional_namespaces,
            "Loaded annotation lookup configuration"
        );
        Ok(config)
    }

    /// Policy excluding the configured namespaces.
    #[must_use]
    pub fn exclusion_policy(&self) -> NamespaceExclusion {
        NamespaceExclusion::new(self.definitional_namespaces.iter().map(String::as_str))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for namespace in &self.definitional_namespaces {
            if !TypeName::is_valid(namespace.trim_end_matches('.')) {
                return Err(ConfigError::InvalidNamespace {
                    namespace: namespace.clone(),
                });
            }
        }
        Ok(())
    }
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(list) => list,
        ListOrCsv::Csv(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::policy::ExclusionPolicy;
    use serde_json::json;

    #[test]
    fn missing_section_uses_defaults() {
        let figment = Figment::new().merge(Serialized::defaults(json!({ "other": {} })));
        let config = LookupConfig::from_figment(&figment).unwrap();
        assert_eq!(config, LookupConfig::default());
        assert_eq!(config.definitional_namespaces, ["lang.annotation"]);
    }

    #[test]
    fn section_overrides_namespaces() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "annotation_lookup": {
                "definitional_namespaces": ["lang.annotation", "kotlin.annotation"]
            }
        })));
        let config = LookupConfig::from_figment(&figment).unwrap();
        let policy = config.exclusion_policy();
        assert!(policy.is_definitional(&TypeName::new("kotlin.annotation.Target")));
        assert!(policy.is_definitional(&TypeName::new("lang.annotation.Documented")));
    }

    #[test]
    fn empty_section_keeps_defaults() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "annotation_lookup": {}
        })));
        let config = LookupConfig::from_figment(&figment).unwrap();
        assert_eq!(config, LookupConfig::default());
    }

    #[test]
    fn comma_separated_namespaces() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "annotation_lookup": { "definitional_namespaces": "a.meta, b.meta," }
        })));
        let config = LookupConfig::from_figment(&figment).unwrap();
        assert_eq!(config.definitional_namespaces, ["a.meta", "b.meta"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "annotation_lookup": { "namespaces": ["x"] }
        })));
        let err = LookupConfig::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ConfigError::Figment { .. }));
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let figment = Figment::new().merge(Serialized::defaults(json!({
            "annotation_lookup": { "definitional_namespaces": ["ok.ns", "bad..ns"] }
        })));
        let err = LookupConfig::from_figment(&figment).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidNamespace { ref namespace } if namespace == "bad..ns")
        );
    }
}
