use nodeci::registry::JobName;

use super::job::{self, JobCommandArgs, JobCommandOutput};
use super::CmdResult;

pub fn run(args: JobCommandArgs, _global: &super::GlobalArgs) -> CmdResult<JobCommandOutput> {
    job::execute(JobName::Install, &args, Vec::new())
}
