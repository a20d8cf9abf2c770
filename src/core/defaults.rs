use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::paths;
use crate::utils::io;

/// Root configuration structure for nodeci.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeciConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via nodeci.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_base_image")]
    pub base_image: String,

    #[serde(default = "default_workdir")]
    pub workdir: String,

    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    #[serde(default = "default_node_version")]
    pub node_version: String,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            base_image: default_base_image(),
            workdir: default_workdir(),
            package_manager: default_package_manager(),
            node_version: default_node_version(),
            exclude: default_exclude(),
            engine: EngineConfig::default(),
        }
    }
}

/// Configuration for the container engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            docker_bin: default_docker_bin(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_base_image() -> String {
    "pkgxdev/pkgx:latest".to_string()
}

fn default_workdir() -> String {
    "/app".to_string()
}

fn default_package_manager() -> String {
    "npm".to_string()
}

fn default_node_version() -> String {
    "18.16.1".to_string()
}

/// Paths never copied from the source directory into a job container.
fn default_exclude() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".devbox".to_string(),
        "node_modules".to_string(),
        ".fluentci".to_string(),
    ]
}

fn default_docker_bin() -> String {
    "docker".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If nodeci.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full nodeci.json config, falling back to defaults on any error.
pub fn load_config() -> NodeciConfig {
    paths::nodeci_json()
        .and_then(|path| load_config_from_file(&path))
        .unwrap_or_default()
}

/// Attempt to load config from a nodeci.json file.
pub fn load_config_from_file(path: &Path) -> crate::Result<NodeciConfig> {
    if !path.exists() {
        return Err(crate::Error::other(format!(
            "{} not found",
            path.display()
        )));
    }

    let content = io::read_file(path, &format!("read {}", path.display()))?;

    serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_defaults_match_pkgx_image() {
        let defaults = builtin_defaults();
        assert_eq!(defaults.base_image, "pkgxdev/pkgx:latest");
        assert_eq!(defaults.workdir, "/app");
        assert_eq!(defaults.package_manager, "npm");
        assert_eq!(defaults.node_version, "18.16.1");
        assert_eq!(
            defaults.exclude,
            vec![".git", ".devbox", "node_modules", ".fluentci"]
        );
        assert_eq!(defaults.engine.docker_bin, "docker");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"defaults": {{"node_version": "20.11.0", "engine": {{"docker_bin": "podman"}}}}}}"#
        )
        .unwrap();

        let config = load_config_from_file(file.path()).unwrap();
        assert_eq!(config.defaults.node_version, "20.11.0");
        assert_eq!(config.defaults.engine.docker_bin, "podman");
        assert_eq!(config.defaults.package_manager, "npm");
        assert_eq!(config.defaults.base_image, "pkgxdev/pkgx:latest");
    }

    #[test]
    fn invalid_file_reports_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_config_from_file(file.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_config_from_file(Path::new("/nonexistent/nodeci.json"));
        assert!(result.is_err());
    }
}
