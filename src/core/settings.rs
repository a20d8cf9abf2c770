//! Per-job configuration resolution.
//!
//! Every job resolves its package manager and Node.js version the same way:
//! environment variable, then explicit argument, then configured default.
//! Empty environment values are treated as unset.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::defaults::Defaults;
use crate::error::{Error, Result};

pub const PACKAGE_MANAGER_ENV: &str = "PACKAGE_MANAGER";
pub const NODE_VERSION_ENV: &str = "NODE_VERSION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

impl PackageManager {
    pub fn all() -> &'static [PackageManager] {
        &[
            PackageManager::Npm,
            PackageManager::Yarn,
            PackageManager::Pnpm,
            PackageManager::Bun,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    /// Name of the dependency cache volume for this package manager.
    pub fn cache_volume(&self) -> String {
        format!("node_modules_{}", self.as_str())
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PackageManager::all()
            .iter()
            .copied()
            .find(|pm| pm.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unsupported package manager '{}' (expected one of: {})",
                    s,
                    supported_names().join(", ")
                )
            })
    }
}

fn supported_names() -> Vec<String> {
    PackageManager::all()
        .iter()
        .map(|pm| pm.as_str().to_string())
        .collect()
}

/// Where a resolved value came from. Drives which error code a bad value gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Env(&'static str),
    Argument(&'static str),
    Default(&'static str),
}

/// Resolved configuration for a single job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobConfig {
    pub package_manager: PackageManager,
    /// Passed to pkgx as-is, so partial versions like `20` work.
    pub node_version: String,
}

impl JobConfig {
    /// Resolve from explicit inputs.
    pub fn resolve(
        env_package_manager: Option<&str>,
        arg_package_manager: Option<&str>,
        env_node_version: Option<&str>,
        arg_node_version: Option<&str>,
        defaults: &Defaults,
    ) -> Result<Self> {
        let (pm, pm_origin) = pick(
            env_package_manager,
            arg_package_manager,
            &defaults.package_manager,
            PACKAGE_MANAGER_ENV,
            "package_manager",
        );
        let (version, version_origin) = pick(
            env_node_version,
            arg_node_version,
            &defaults.node_version,
            NODE_VERSION_ENV,
            "node_version",
        );

        let package_manager = pm
            .parse::<PackageManager>()
            .map_err(|problem| invalid(pm_origin, pm, problem, Some(supported_names())))?;

        let node_version = version.trim();
        if node_version.is_empty() {
            return Err(invalid(
                version_origin,
                version,
                "Node.js version is empty",
                None,
            ));
        }
        let node_version = node_version.to_string();

        Ok(Self {
            package_manager,
            node_version,
        })
    }

    /// Resolve using `PACKAGE_MANAGER` and `NODE_VERSION` from the process environment.
    pub fn from_env(
        arg_package_manager: Option<&str>,
        arg_node_version: Option<&str>,
        defaults: &Defaults,
    ) -> Result<Self> {
        let env_pm = std::env::var(PACKAGE_MANAGER_ENV).ok();
        let env_version = std::env::var(NODE_VERSION_ENV).ok();

        Self::resolve(
            env_pm.as_deref(),
            arg_package_manager,
            env_version.as_deref(),
            arg_node_version,
            defaults,
        )
    }

    /// `node@<version>` spec understood by pkgx.
    pub fn node_spec(&self) -> String {
        format!("node@{}", self.node_version)
    }
}

fn pick<'a>(
    env: Option<&'a str>,
    arg: Option<&'a str>,
    default: &'a str,
    env_name: &'static str,
    field: &'static str,
) -> (&'a str, Origin) {
    if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
        return (value.trim(), Origin::Env(env_name));
    }
    if let Some(value) = arg.filter(|v| !v.trim().is_empty()) {
        return (value.trim(), Origin::Argument(field));
    }
    (default, Origin::Default(field))
}

fn invalid(
    origin: Origin,
    value: &str,
    problem: impl Into<String>,
    tried: Option<Vec<String>>,
) -> Error {
    match origin {
        Origin::Env(name) => Error::config_invalid_value(name, Some(value.to_string()), problem)
            .with_hint(format!("Unset {} or fix its value", name)),
        Origin::Argument(field) => Error::validation_invalid_argument(
            field,
            problem,
            Some(value.to_string()),
            tried,
        ),
        Origin::Default(field) => {
            Error::config_invalid_value(format!("defaults.{}", field), Some(value.to_string()), problem)
                .with_hint("Fix the value in nodeci.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::builtin_defaults;

    #[test]
    fn builtin_defaults_are_npm_and_18_16_1() {
        let config = JobConfig::resolve(None, None, None, None, &builtin_defaults()).unwrap();
        assert_eq!(config.package_manager, PackageManager::Npm);
        assert_eq!(config.node_version, "18.16.1");
    }

    #[test]
    fn env_wins_over_argument() {
        let config = JobConfig::resolve(
            Some("yarn"),
            Some("pnpm"),
            Some("20.1.0"),
            Some("19.0.0"),
            &builtin_defaults(),
        )
        .unwrap();
        assert_eq!(config.package_manager, PackageManager::Yarn);
        assert_eq!(config.node_version, "20.1.0");
    }

    #[test]
    fn argument_wins_over_default() {
        let config =
            JobConfig::resolve(None, Some("pnpm"), None, Some("20.0.0"), &builtin_defaults())
                .unwrap();
        assert_eq!(config.package_manager, PackageManager::Pnpm);
        assert_eq!(config.node_spec(), "node@20.0.0");
    }

    #[test]
    fn empty_env_counts_as_unset() {
        let config =
            JobConfig::resolve(Some(""), Some("bun"), Some("  "), None, &builtin_defaults())
                .unwrap();
        assert_eq!(config.package_manager, PackageManager::Bun);
        assert_eq!(config.node_version, "18.16.1");
    }

    #[test]
    fn configured_default_applies_when_nothing_else_set() {
        let mut defaults = builtin_defaults();
        defaults.package_manager = "pnpm".to_string();
        defaults.node_version = "20.11.1".to_string();

        let config = JobConfig::resolve(None, None, None, None, &defaults).unwrap();
        assert_eq!(config.package_manager, PackageManager::Pnpm);
        assert_eq!(config.node_version, "20.11.1");
    }

    #[test]
    fn partial_versions_pass_through() {
        for version in ["20", "20.11", "lts", "v20.0.0"] {
            let config =
                JobConfig::resolve(None, None, Some(version), None, &builtin_defaults()).unwrap();
            assert_eq!(config.node_spec(), format!("node@{}", version));
        }
    }

    #[test]
    fn unknown_package_manager_from_env_is_config_error() {
        let err = JobConfig::resolve(Some("cargo"), None, None, None, &builtin_defaults())
            .unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "PACKAGE_MANAGER");
    }

    #[test]
    fn unknown_package_manager_argument_is_validation_error() {
        let err = JobConfig::resolve(None, Some("cargo"), None, None, &builtin_defaults())
            .unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert_eq!(err.details["field"], "package_manager");
    }

    #[test]
    fn empty_configured_version_is_rejected() {
        let mut defaults = builtin_defaults();
        defaults.node_version = " ".to_string();

        let err = JobConfig::resolve(None, None, None, None, &defaults).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "defaults.node_version");
    }

    #[test]
    fn cache_volume_is_keyed_by_package_manager() {
        assert_eq!(PackageManager::Yarn.cache_volume(), "node_modules_yarn");
        assert_eq!(PackageManager::Npm.cache_volume(), "node_modules_npm");
    }

    #[test]
    fn package_manager_parse_is_case_sensitive() {
        assert!("NPM".parse::<PackageManager>().is_err());
        assert_eq!("bun".parse::<PackageManager>(), Ok(PackageManager::Bun));
    }
}
