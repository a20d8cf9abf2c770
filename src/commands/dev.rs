use nodeci::registry::JobName;

use super::job::{self, JobCommandArgs, JobCommandOutput};
use super::CmdResult;

/// Returns the handle of a container with Node.js and the source in place.
pub fn run(args: JobCommandArgs, _global: &super::GlobalArgs) -> CmdResult<JobCommandOutput> {
    job::execute(JobName::Dev, &args, Vec::new())
}
