//! Job names and their dispatch tables.
//!
//! `JobName` is closed; `runnable` and `description` are exhaustive matches so
//! adding a job without wiring it up fails to compile.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::container::{ContainerId, DirectoryId, Source};
use crate::defaults::Defaults;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::jobs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobName {
    Test,
    Build,
    Run,
    Install,
    Dev,
}

impl JobName {
    pub fn all() -> &'static [JobName] {
        &[
            JobName::Test,
            JobName::Build,
            JobName::Run,
            JobName::Install,
            JobName::Dev,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::Test => "test",
            JobName::Build => "build",
            JobName::Run => "run",
            JobName::Install => "install",
            JobName::Dev => "dev",
        }
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        JobName::all()
            .iter()
            .copied()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<String> = JobName::all().iter().map(|j| j.to_string()).collect();
                Error::validation_invalid_argument(
                    "job",
                    format!("Unknown job '{}'", s),
                    Some(s.to_string()),
                    Some(valid.clone()),
                )
                .with_hint(format!("Valid jobs: {}", valid.join(", ")))
            })
    }
}

/// Arguments every job accepts: a source plus positional extras.
#[derive(Debug, Clone, Default)]
pub struct JobArgs {
    pub src: Source,
    /// Positional arguments after the source (`run` takes its task here).
    pub extra: Vec<String>,
    pub package_manager: Option<String>,
    pub node_version: Option<String>,
    pub defaults: Defaults,
}

impl JobArgs {
    pub fn new(src: impl Into<Source>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    pub fn extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }

    pub fn package_manager(mut self, pm: Option<String>) -> Self {
        self.package_manager = pm;
        self
    }

    pub fn node_version(mut self, version: Option<String>) -> Self {
        self.node_version = version;
        self
    }

    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// What a job hands back. Which variant is fixed per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum JobOutput {
    Stdout(String),
    Container(ContainerId),
    Directory(DirectoryId),
}

pub type JobExec = fn(&dyn Engine, &JobArgs) -> Result<JobOutput>;

pub fn runnable(job: JobName) -> JobExec {
    match job {
        JobName::Test => jobs::test,
        JobName::Build => jobs::build,
        JobName::Run => jobs::run,
        JobName::Install => jobs::install,
        JobName::Dev => jobs::dev,
    }
}

pub fn description(job: JobName) -> &'static str {
    match job {
        JobName::Test => "Run tests",
        JobName::Build => "Build the project",
        JobName::Run => "Run a task",
        JobName::Install => "Install dependencies",
        JobName::Dev => "Returns a Container with Node.js installed",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub name: JobName,
    pub description: &'static str,
}

pub fn list() -> Vec<JobInfo> {
    JobName::all()
        .iter()
        .map(|&name| JobInfo {
            name,
            description: description(name),
        })
        .collect()
}

/// Look a job up by name and run it.
pub fn dispatch(name: &str, engine: &dyn Engine, args: &JobArgs) -> Result<JobOutput> {
    let job: JobName = name.parse()?;
    runnable(job)(engine, args)
}
