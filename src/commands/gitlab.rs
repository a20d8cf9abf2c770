use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use nodeci::gitlab;

use super::CmdResult;

#[derive(Args, Debug)]
pub struct GitlabArgs {
    /// Write the document to a file instead of printing it
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".gitlab-ci.yml")]
    pub write: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct GitlabWriteOutput {
    pub path: PathBuf,
    pub jobs: Vec<String>,
}

pub fn is_print_yaml(args: &GitlabArgs) -> bool {
    args.write.is_none()
}

/// Raw `.gitlab-ci.yml` content for stdout.
pub fn run_yaml(_args: GitlabArgs) -> CmdResult<String> {
    Ok((gitlab::pipeline().to_yaml()?, 0))
}

pub fn run(args: GitlabArgs, _global: &super::GlobalArgs) -> CmdResult<GitlabWriteOutput> {
    let path = args.write.ok_or_else(|| {
        nodeci::Error::validation_missing_argument(vec!["write".to_string()])
    })?;

    let ci = gitlab::pipeline();
    ci.write(&path)?;

    Ok((
        GitlabWriteOutput {
            path,
            jobs: ci.job_names().into_iter().map(str::to_string).collect(),
        },
        0,
    ))
}
