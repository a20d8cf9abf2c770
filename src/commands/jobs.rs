use clap::Args;
use serde::Serialize;

use nodeci::registry::{self, JobInfo};

use super::CmdResult;

#[derive(Args, Debug)]
pub struct JobsArgs {}

#[derive(Serialize)]
pub struct JobsOutput {
    pub jobs: Vec<JobInfo>,
}

pub fn run(_args: JobsArgs, _global: &super::GlobalArgs) -> CmdResult<JobsOutput> {
    Ok((
        JobsOutput {
            jobs: registry::list(),
        },
        0,
    ))
}
