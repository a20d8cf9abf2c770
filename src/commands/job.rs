use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use nodeci::defaults::{self, Defaults};
use nodeci::docker::DockerEngine;
use nodeci::jobs::{self, JobPlan};
use nodeci::registry::{self, JobArgs, JobName, JobOutput};

use super::CmdResult;

/// Arguments shared by every job command.
#[derive(Args, Debug, Clone)]
pub struct JobCommandArgs {
    /// Project source directory
    #[arg(default_value = ".")]
    pub src: String,

    /// Package manager: npm, yarn, pnpm or bun (PACKAGE_MANAGER wins when set)
    #[arg(long, value_name = "PM")]
    pub package_manager: Option<String>,

    /// Node.js version (NODE_VERSION wins when set)
    #[arg(long, value_name = "VERSION")]
    pub node_version: Option<String>,

    /// Print the resolved step plan instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

impl JobCommandArgs {
    pub fn job_args(&self, extra: Vec<String>, defaults: Defaults) -> JobArgs {
        JobArgs::new(self.src.as_str())
            .extra(extra)
            .package_manager(self.package_manager.clone())
            .node_version(self.node_version.clone())
            .defaults(defaults)
    }
}

#[derive(Serialize)]
pub struct JobRunOutput {
    pub job: JobName,
    pub output: JobOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum JobCommandOutput {
    DryRun(JobPlan),
    Executed(JobRunOutput),
}

/// Plan or run `job` against the docker engine.
pub fn execute(job: JobName, args: &JobCommandArgs, extra: Vec<String>) -> CmdResult<JobCommandOutput> {
    let defaults = defaults::load_defaults();
    let job_args = args.job_args(extra, defaults.clone());

    if args.dry_run {
        let plan = jobs::plan(job, &job_args)?;
        return Ok((JobCommandOutput::DryRun(plan), 0));
    }

    let engine = DockerEngine::from_defaults(&defaults);
    let output = registry::runnable(job)(&engine, &job_args)?;

    Ok((
        JobCommandOutput::Executed(JobRunOutput {
            job,
            output,
            exported: None,
        }),
        0,
    ))
}
