use clap::Args;
use std::path::PathBuf;

use nodeci::defaults;
use nodeci::docker::DockerEngine;
use nodeci::engine::Engine;
use nodeci::jobs;
use nodeci::registry::{JobName, JobOutput};

use super::job::{self, JobCommandArgs, JobCommandOutput, JobRunOutput};
use super::CmdResult;

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub job: JobCommandArgs,

    /// Copy the build output to this host directory
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
}

pub fn run(args: BuildArgs, _global: &super::GlobalArgs) -> CmdResult<JobCommandOutput> {
    let export = match args.export {
        Some(dir) if !args.job.dry_run => dir,
        _ => return job::execute(JobName::Build, &args.job, Vec::new()),
    };

    let defaults = defaults::load_defaults();
    let job_args = args.job.job_args(Vec::new(), defaults.clone());
    let engine = DockerEngine::from_defaults(&defaults);

    let output = jobs::build(&engine, &job_args)?;
    let exported = match &output {
        JobOutput::Directory(dir) => engine.export_directory(dir, &export)?,
        other => {
            return Err(nodeci::Error::internal_unexpected(format!(
                "build returned {:?} instead of a directory",
                other
            )))
        }
    };

    Ok((
        JobCommandOutput::Executed(JobRunOutput {
            job: JobName::Build,
            output,
            exported: Some(exported),
        }),
        0,
    ))
}
