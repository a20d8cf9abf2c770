use clap::Args;

use nodeci::defaults;
use nodeci::docker::DockerEngine;
use nodeci::pipeline::{self, PipelineRunResult};
use nodeci::registry::{JobArgs, JobName};

use super::CmdResult;

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Jobs to run in order (default: test build)
    pub jobs: Vec<String>,

    /// Project source directory
    #[arg(long, default_value = ".")]
    pub src: String,

    /// Task for a `run` job in the pipeline
    #[arg(long)]
    pub task: Option<String>,

    /// Package manager: npm, yarn, pnpm or bun
    #[arg(long, value_name = "PM")]
    pub package_manager: Option<String>,

    /// Node.js version
    #[arg(long, value_name = "VERSION")]
    pub node_version: Option<String>,
}

pub fn run(args: PipelineArgs, _global: &super::GlobalArgs) -> CmdResult<PipelineRunResult> {
    let jobs = args
        .jobs
        .iter()
        .map(|name| name.parse::<JobName>())
        .collect::<nodeci::Result<Vec<_>>>()?;

    let defaults = defaults::load_defaults();
    let engine = DockerEngine::from_defaults(&defaults);
    let job_args = JobArgs::new(args.src.as_str())
        .extra(args.task.into_iter().collect())
        .package_manager(args.package_manager)
        .node_version(args.node_version)
        .defaults(defaults);

    let result = pipeline::run(&engine, &jobs, &job_args);
    let exit_code = result
        .failure
        .map(crate::output::exit_code_for_error)
        .unwrap_or(0);

    Ok((result, exit_code))
}
