use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use crate::error::{Error, Result};
use crate::provenance::{HostModule, HOST_MODULE_ENV};

pub const SCHEMA_PREFIXES_ENV: &str = "OAS_REGISTRY_SCHEMA_PREFIXES";

/// Registry construction options.
///
/// Can be read from a Cargo manifest:
///
/// ```toml
/// [package.metadata.oas_registry]
/// schema_key_prefixes_to_trim = ["Contracts"]
/// host_module = "github.com/acme/shop"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Literal prefixes removed from derived schema names. The first prefix
    /// that matches is removed; the rest are not tried.
    pub schema_key_prefixes_to_trim: Vec<String>,
    /// When `None`, the registry falls back to [`HostModule::from_env`].
    pub host_module: Option<HostModule>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends prefixes to trim from generated schema keys, e.g. `"Contracts"`
    /// when all payloads live in a `contracts` module.
    pub fn with_schema_key_prefixes_to_trim<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema_key_prefixes_to_trim
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn with_host_module(mut self, host_module: HostModule) -> Self {
        self.host_module = Some(host_module);
        self
    }

    /// Reads `[package.metadata.oas_registry]`, falling back to
    /// `[workspace.metadata.oas_registry]`. A manifest with neither table
    /// yields the default config.
    pub fn from_manifest(manifest_path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(manifest_path.as_ref())?;
        Self::from_manifest_str(&content)
    }

    pub fn from_manifest_str(content: &str) -> Result<Self> {
        let manifest: Value = toml::from_str(content)?;
        let section = ["package", "workspace"].into_iter().find_map(|table| {
            manifest
                .get(table)?
                .get("metadata")?
                .get("oas_registry")
                .cloned()
        });
        match section {
            Some(section) => Ok(section.try_into()?),
            None => Ok(Self::default()),
        }
    }

    /// Overlays `OAS_REGISTRY_SCHEMA_PREFIXES` (comma separated, replaces the
    /// configured list) and `OAS_REGISTRY_HOST_MODULE`.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(prefixes) = lookup(SCHEMA_PREFIXES_ENV) {
            let prefixes: Vec<String> = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if prefixes.is_empty() {
                return Err(Error::Config(format!("{SCHEMA_PREFIXES_ENV} is set but empty")));
            }
            self.schema_key_prefixes_to_trim = prefixes;
        }
        if let Some(host) = lookup(HOST_MODULE_ENV) {
            self.host_module = Some(HostModule::new(host));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_package_metadata() {
        let manifest = r#"
            [package]
            name = "shop"

            [package.metadata.oas_registry]
            schema_key_prefixes_to_trim = ["Contracts", "Dto"]
            host_module = "https://github.com/acme/shop"
        "#;
        let config = RegistryConfig::from_manifest_str(manifest).unwrap();
        assert_eq!(config.schema_key_prefixes_to_trim, vec!["Contracts", "Dto"]);
        assert_eq!(
            config.host_module.as_ref().and_then(HostModule::path),
            Some("github.com/acme/shop")
        );
    }

    #[test]
    fn falls_back_to_workspace_metadata() {
        let manifest = r#"
            [workspace]
            members = ["shop"]

            [workspace.metadata.oas_registry]
            schema_key_prefixes_to_trim = ["Api"]
        "#;
        let config = RegistryConfig::from_manifest_str(manifest).unwrap();
        assert_eq!(config.schema_key_prefixes_to_trim, vec!["Api"]);
        assert_eq!(config.host_module, None);
    }

    #[test]
    fn missing_section_is_default() {
        let config = RegistryConfig::from_manifest_str("[package]\nname = \"shop\"\n").unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let manifest = r#"
            [package.metadata.oas_registry]
            schema_prefixes = ["Api"]
        "#;
        assert!(matches!(
            RegistryConfig::from_manifest_str(manifest),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn env_overrides_manifest() {
        let config = RegistryConfig::new()
            .with_schema_key_prefixes_to_trim(["Contracts"])
            .apply_vars(|key| match key {
                SCHEMA_PREFIXES_ENV => Some("Api, Dto,".to_string()),
                HOST_MODULE_ENV => Some("github.com/acme/shop".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.schema_key_prefixes_to_trim, vec!["Api", "Dto"]);
        assert!(config.host_module.unwrap().is_known());
    }

    #[test]
    fn empty_prefix_list_in_env_is_an_error() {
        let result = RegistryConfig::new().apply_vars(|key| {
            (key == SCHEMA_PREFIXES_ENV).then(|| " , ".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
