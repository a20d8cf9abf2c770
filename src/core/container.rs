//! Declarative container chain.
//!
//! A [`Container`] is an immutable, ordered list of configuration steps. Every
//! `with_*` call consumes the container and returns a new one with a single
//! step appended; nothing runs until an [`Engine`](crate::engine::Engine)
//! evaluates the chain.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::shell;

/// Named persistent volume shared across evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheVolume {
    pub name: String,
}

impl CacheVolume {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Handle to a directory the engine can copy into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Directory {
    /// Directory on the host filesystem (canonical path).
    Host(PathBuf),
    /// Directory produced by an earlier evaluation.
    Output(DirectoryId),
}

impl Directory {
    /// Resolve a host path into a directory handle.
    ///
    /// Expands `~`, requires the path to exist and be a directory.
    pub fn host(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref().to_string_lossy().to_string();
        let expanded = shellexpand::tilde(&raw).to_string();
        let path = PathBuf::from(&expanded);

        if !path.is_dir() {
            return Err(Error::validation_invalid_argument(
                "src",
                format!("Source directory '{}' does not exist", raw),
                Some(raw),
                None,
            ));
        }

        let canonical = path.canonicalize().map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("resolve {}", path.display())))
        })?;

        Ok(Directory::Host(canonical))
    }
}

/// Source location a job is pointed at: a path or an existing directory handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Directory(Directory),
}

impl Default for Source {
    fn default() -> Self {
        Source::Path(PathBuf::from("."))
    }
}

impl Source {
    pub fn resolve(&self) -> Result<Directory> {
        match self {
            Source::Path(path) => Directory::host(path),
            Source::Directory(dir) => Ok(dir.clone()),
        }
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(PathBuf::from(path))
    }
}

/// Opaque identifier of an evaluated container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a directory inside an evaluated container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryId {
    pub container: ContainerId,
    pub path: String,
}

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    From {
        image: String,
    },
    Exec {
        args: Vec<String>,
    },
    MountCache {
        path: String,
        volume: CacheVolume,
    },
    EnvVariable {
        name: String,
        value: String,
    },
    Directory {
        path: String,
        source: Directory,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        exclude: Vec<String>,
    },
    Workdir {
        path: String,
    },
}

impl Step {
    /// One-line human readable rendering, used in plans and status logs.
    pub fn describe(&self) -> String {
        match self {
            Step::From { image } => format!("from {}", image),
            Step::Exec { args } => format!("exec {}", shell::quote_args(args)),
            Step::MountCache { path, volume } => {
                format!("mount cache {} at {}", volume.name, path)
            }
            Step::EnvVariable { name, value } => format!("env {}={}", name, value),
            Step::Directory {
                path,
                source,
                exclude,
            } => {
                let from = match source {
                    Directory::Host(p) => p.display().to_string(),
                    Directory::Output(id) => id.to_string(),
                };
                if exclude.is_empty() {
                    format!("copy {} to {}", from, path)
                } else {
                    format!("copy {} to {} (exclude {})", from, path, exclude.join(", "))
                }
            }
            Step::Workdir { path } => format!("workdir {}", path),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Container {
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<String>,
    steps: Vec<Step>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the chain with the job it belongs to.
    pub fn pipeline(mut self, name: impl Into<String>) -> Self {
        self.pipeline = Some(name.into());
        self
    }

    pub fn from(self, image: impl Into<String>) -> Self {
        self.push(Step::From {
            image: image.into(),
        })
    }

    pub fn with_exec<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Step::Exec {
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    pub fn with_mounted_cache(self, path: impl Into<String>, volume: CacheVolume) -> Self {
        self.push(Step::MountCache {
            path: path.into(),
            volume,
        })
    }

    pub fn with_env_variable(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Step::EnvVariable {
            name: name.into(),
            value: value.into(),
        })
    }

    pub fn with_directory(
        self,
        path: impl Into<String>,
        source: Directory,
        exclude: &[String],
    ) -> Self {
        self.push(Step::Directory {
            path: path.into(),
            source,
            exclude: exclude.to_vec(),
        })
    }

    pub fn with_workdir(self, path: impl Into<String>) -> Self {
        self.push(Step::Workdir { path: path.into() })
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn pipeline_name(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    /// Image of the first `from` step. Steps before it are invalid for engines.
    pub fn base_image(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match step {
            Step::From { image } => Some(image.as_str()),
            _ => None,
        })
    }

    /// Argv of the last `exec` step, whose stdout is the chain's output.
    pub fn last_exec(&self) -> Option<&[String]> {
        self.steps.iter().rev().find_map(|step| match step {
            Step::Exec { args } => Some(args.as_slice()),
            _ => None,
        })
    }

    /// Stable content hash of the step chain.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        for step in &self.steps {
            let encoded = serde_json::to_vec(step).unwrap_or_default();
            hasher.update((encoded.len() as u64).to_le_bytes());
            hasher.update(&encoded);
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn describe(&self) -> Vec<String> {
        self.steps.iter().map(Step::describe).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn with_calls_append_in_order() {
        let ctr = Container::new()
            .from("alpine:latest")
            .with_exec(["apk", "update"])
            .with_mounted_cache("/cache", CacheVolume::new("c"))
            .with_env_variable("CI", "1")
            .with_workdir("/app");

        let kinds: Vec<String> = ctr.describe();
        assert_eq!(
            kinds,
            vec![
                "from alpine:latest",
                "exec apk update",
                "mount cache c at /cache",
                "env CI=1",
                "workdir /app",
            ]
        );
        assert_eq!(ctr.base_image(), Some("alpine:latest"));
        assert_eq!(ctr.last_exec().unwrap(), ["apk", "update"]);
    }

    #[test]
    fn id_is_stable_and_content_addressed() {
        let a = Container::new().from("node:20").with_exec(["npm", "test"]);
        let b = Container::new().from("node:20").with_exec(["npm", "test"]);
        let c = Container::new().from("node:20").with_exec(["npm", "run", "test"]);

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.id().len(), 64);
    }

    #[test]
    fn pipeline_label_does_not_change_id() {
        let a = Container::new().from("node:20");
        let b = Container::new().pipeline("test").from("node:20");
        assert_eq!(a.id(), b.id());
        assert_eq!(b.pipeline_name(), Some("test"));
    }

    #[test]
    fn host_directory_requires_existing_dir() {
        let err = Directory::host("/nonexistent/project").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");

        let tmp = TempDir::new().unwrap();
        let dir = Directory::host(tmp.path()).unwrap();
        assert_eq!(dir, Directory::Host(tmp.path().canonicalize().unwrap()));
    }

    #[test]
    fn source_directory_passes_through() {
        let handle = Directory::Output(DirectoryId {
            container: ContainerId("sha256:abc".to_string()),
            path: "/dist".to_string(),
        });
        let resolved = Source::Directory(handle.clone()).resolve().unwrap();
        assert_eq!(resolved, handle);
    }

    #[test]
    fn directory_step_describes_exclusions() {
        let step = Step::Directory {
            path: "/app".to_string(),
            source: Directory::Host(PathBuf::from("/work/project")),
            exclude: vec![".git".to_string(), "node_modules".to_string()],
        };
        assert_eq!(
            step.describe(),
            "copy /work/project to /app (exclude .git, node_modules)"
        );
    }
}
