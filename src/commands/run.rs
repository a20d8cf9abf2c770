use clap::Args;

use nodeci::registry::JobName;

use super::job::{self, JobCommandArgs, JobCommandOutput};
use super::CmdResult;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Package script to run (e.g. lint, build:docs)
    pub task: Option<String>,

    #[command(flatten)]
    pub job: JobCommandArgs,
}

pub fn run(args: RunArgs, _global: &super::GlobalArgs) -> CmdResult<JobCommandOutput> {
    // The run job rejects a missing task.
    let extra: Vec<String> = args.task.into_iter().collect();
    job::execute(JobName::Run, &args.job, extra)
}
