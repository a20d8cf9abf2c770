//! Run several jobs one after another against the same engine.
//!
//! Jobs run in the order given. The first failure stops the run; the jobs
//! after it are reported as skipped.

use serde::Serialize;
use serde_json::Value;

use crate::engine::Engine;
use crate::error::{ErrorCode, Hint};
use crate::registry::{runnable, JobArgs, JobName, JobOutput};

/// Jobs run when none are named.
pub const DEFAULT_JOBS: &[JobName] = &[JobName::Test, JobName::Build];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Success,
    PartialSuccess,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStepResult {
    pub job: JobName,
    pub status: PipelineRunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Details of the failing error, e.g. stderr and exit code of an engine exec.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunResult {
    pub steps: Vec<PipelineStepResult>,
    pub status: PipelineRunStatus,
    pub summary: PipelineRunSummary,
    /// Code of the error that stopped the run.
    #[serde(skip)]
    pub failure: Option<ErrorCode>,
}

impl PipelineRunResult {
    pub fn is_success(&self) -> bool {
        self.status == PipelineRunStatus::Success
    }
}

pub fn run(engine: &dyn Engine, jobs: &[JobName], args: &JobArgs) -> PipelineRunResult {
    let jobs = if jobs.is_empty() { DEFAULT_JOBS } else { jobs };
    let mut results = Vec::with_capacity(jobs.len());
    let mut failed_job: Option<JobName> = None;
    let mut failure = None;

    for &job in jobs {
        if let Some(failed) = failed_job {
            results.push(PipelineStepResult {
                job,
                status: PipelineRunStatus::Skipped,
                output: None,
                error: Some(format!("Skipped because '{}' failed", failed)),
                error_code: None,
                details: Value::Null,
                hints: Vec::new(),
            });
            continue;
        }

        log_status!("pipeline", "Running {}", job);

        match runnable(job)(engine, args) {
            Ok(output) => results.push(PipelineStepResult {
                job,
                status: PipelineRunStatus::Success,
                output: Some(output),
                error: None,
                error_code: None,
                details: Value::Null,
                hints: Vec::new(),
            }),
            Err(err) => {
                log_status!("pipeline", "{} failed: {}", job, err);
                failed_job = Some(job);
                failure = Some(err.code);
                results.push(PipelineStepResult {
                    job,
                    status: PipelineRunStatus::Failed,
                    output: None,
                    error: Some(err.message),
                    error_code: Some(err.code.as_str().to_string()),
                    details: err.details,
                    hints: err.hints,
                });
            }
        }
    }

    let status = derive_overall_status(&results);
    let summary = build_summary(&results, status);

    PipelineRunResult {
        steps: results,
        status,
        summary,
        failure,
    }
}

fn derive_overall_status(results: &[PipelineStepResult]) -> PipelineRunStatus {
    let has_success = results
        .iter()
        .any(|r| r.status == PipelineRunStatus::Success);
    let has_failed = results
        .iter()
        .any(|r| r.status == PipelineRunStatus::Failed);

    match (has_success, has_failed) {
        (true, true) => PipelineRunStatus::PartialSuccess,
        (_, true) => PipelineRunStatus::Failed,
        (true, false) => PipelineRunStatus::Success,
        (false, false) => PipelineRunStatus::Skipped,
    }
}

fn build_summary(results: &[PipelineStepResult], status: PipelineRunStatus) -> PipelineRunSummary {
    let count = |wanted: PipelineRunStatus| results.iter().filter(|r| r.status == wanted).count();

    let next_actions = match status {
        PipelineRunStatus::PartialSuccess | PipelineRunStatus::Failed => {
            vec!["Fix the failing job and re-run the pipeline".to_string()]
        }
        _ => Vec::new(),
    };

    PipelineRunSummary {
        total_steps: results.len(),
        succeeded: count(PipelineRunStatus::Success),
        failed: count(PipelineRunStatus::Failed),
        skipped: count(PipelineRunStatus::Skipped),
        next_actions,
    }
}
