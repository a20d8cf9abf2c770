use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::container::{Container, ContainerId, DirectoryId};
use crate::error::Result;

/// Final state of an evaluated container chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluated {
    /// Stdout of the last exec step (empty when the chain has none).
    pub stdout: String,
    pub container: ContainerId,
}

impl Evaluated {
    /// Handle to a directory inside the evaluated container.
    pub fn directory(&self, path: impl Into<String>) -> DirectoryId {
        DirectoryId {
            container: self.container.clone(),
            path: path.into(),
        }
    }
}

/// Orchestration client that turns a container chain into a running result.
///
/// Failures are returned as-is; callers do not retry.
pub trait Engine {
    fn evaluate(&self, container: &Container) -> Result<Evaluated>;

    /// Copy a directory out of an evaluated container onto the host.
    fn export_directory(&self, directory: &DirectoryId, dest: &Path) -> Result<PathBuf>;
}
