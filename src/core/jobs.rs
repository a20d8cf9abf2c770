//! Node.js CI jobs.
//!
//! Every job starts from the same base chain (pkgx image, Node.js and the
//! package managers, a dependency cache keyed by package manager) and then
//! appends its own steps. The `*_container` builders are pure; the job entry
//! points resolve configuration, build the chain and hand it to an [`Engine`].

use serde::Serialize;

use crate::container::{CacheVolume, Container, Directory, Step};
use crate::defaults::Defaults;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::registry::{JobArgs, JobName, JobOutput};
use crate::settings::JobConfig;

/// Removes generated client bindings that would break a fresh install.
pub const REMOVE_CLIENT_BINDINGS: &str = "[ -f client.gen.ts ] && rm client.gen.ts || true";

/// Where `build` leaves its output for extraction.
pub const BUILD_OUTPUT: &str = "/dist";

const DIST_CACHE: &str = "dist";

fn node_modules(defaults: &Defaults) -> String {
    format!("{}/node_modules", defaults.workdir)
}

fn dist(defaults: &Defaults) -> String {
    format!("{}/dist", defaults.workdir)
}

/// Base image with Node.js, every supported package manager and the dependency cache.
pub fn base(job: JobName, config: &JobConfig, defaults: &Defaults) -> Container {
    Container::new()
        .pipeline(job.as_str())
        .from(&defaults.base_image)
        .with_exec(["apt-get", "update"])
        .with_exec(["apt-get", "install", "-y", "ca-certificates"])
        .with_exec([
            "pkgx".to_string(),
            "install".to_string(),
            config.node_spec(),
            "npm".to_string(),
            "bun".to_string(),
            "pnpm".to_string(),
            "classic.yarnpkg.com".to_string(),
            "rtx".to_string(),
        ])
        .with_exec(["sh", "-c", "echo 'eval \"$(rtx activate bash)\"' >> ~/.bashrc"])
        .with_mounted_cache(
            node_modules(defaults),
            CacheVolume::new(config.package_manager.cache_volume()),
        )
}

fn with_source(ctr: Container, defaults: &Defaults, src: Directory) -> Container {
    ctr.with_directory(&defaults.workdir, src, &defaults.exclude)
        .with_workdir(&defaults.workdir)
}

fn with_dist_cache(ctr: Container, defaults: &Defaults) -> Container {
    ctr.with_mounted_cache(dist(defaults), CacheVolume::new(DIST_CACHE))
}

fn pm_exec(ctr: Container, config: &JobConfig, args: &[&str]) -> Container {
    let pm = config.package_manager.as_str();
    ctr.with_exec(std::iter::once(pm).chain(args.iter().copied()))
}

pub fn install_container(config: &JobConfig, defaults: &Defaults, src: Directory) -> Container {
    let ctr = with_dist_cache(base(JobName::Install, config, defaults), defaults);
    let ctr = with_source(ctr, defaults, src);
    pm_exec(ctr, config, &["install"])
}

pub fn test_container(config: &JobConfig, defaults: &Defaults, src: Directory) -> Container {
    let ctr = with_source(base(JobName::Test, config, defaults), defaults, src);
    let ctr = pm_exec(ctr, config, &["install"]).with_exec(["sh", "-c", REMOVE_CLIENT_BINDINGS]);
    pm_exec(ctr, config, &["run", "test"])
}

pub fn build_container(config: &JobConfig, defaults: &Defaults, src: Directory) -> Container {
    let ctr = base(JobName::Build, config, defaults).with_exec([
        "mkdir".to_string(),
        "-p".to_string(),
        dist(defaults),
    ]);
    let ctr = with_source(with_dist_cache(ctr, defaults), defaults, src)
        .with_exec(["sh", "-c", REMOVE_CLIENT_BINDINGS]);
    let ctr = pm_exec(ctr, config, &["install"]);
    pm_exec(ctr, config, &["run", "build"]).with_exec(["cp", "-r", "dist", BUILD_OUTPUT])
}

pub fn run_container(
    config: &JobConfig,
    defaults: &Defaults,
    src: Directory,
    task: &str,
) -> Container {
    let ctr = with_dist_cache(base(JobName::Run, config, defaults), defaults);
    let ctr = with_source(ctr, defaults, src).with_exec(["sh", "-c", REMOVE_CLIENT_BINDINGS]);
    let ctr = pm_exec(ctr, config, &["install"]);
    pm_exec(ctr, config, &["run", task])
}

pub fn dev_container(config: &JobConfig, defaults: &Defaults, src: Directory) -> Container {
    let ctr = with_dist_cache(base(JobName::Dev, config, defaults), defaults);
    with_source(ctr, defaults, src)
}

fn require_task(args: &JobArgs) -> Result<&str> {
    args.extra
        .first()
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            Error::validation_missing_argument(vec!["task".to_string()])
                .with_hint("Name the package script to run: nodeci run <task>")
        })
}

/// Resolve configuration and source, then build the chain for `job`.
pub fn container_for(job: JobName, args: &JobArgs) -> Result<(JobConfig, Container)> {
    let task = match job {
        JobName::Run => Some(require_task(args)?),
        _ => None,
    };

    let config = JobConfig::from_env(
        args.package_manager.as_deref(),
        args.node_version.as_deref(),
        &args.defaults,
    )?;
    let src = args.src.resolve()?;
    let defaults = &args.defaults;

    let ctr = match (job, task) {
        (JobName::Install, _) => install_container(&config, defaults, src),
        (JobName::Test, _) => test_container(&config, defaults, src),
        (JobName::Build, _) => build_container(&config, defaults, src),
        (JobName::Run, Some(task)) => run_container(&config, defaults, src, task),
        (JobName::Run, None) => {
            return Err(Error::validation_missing_argument(vec!["task".to_string()]))
        }
        (JobName::Dev, _) => dev_container(&config, defaults, src),
    };

    Ok((config, ctr))
}

/// Resolved chain of a job, without running it.
#[derive(Debug, Clone, Serialize)]
pub struct JobPlan {
    pub job: JobName,
    pub config: JobConfig,
    pub container_id: String,
    pub steps: Vec<Step>,
    pub commands: Vec<String>,
}

pub fn plan(job: JobName, args: &JobArgs) -> Result<JobPlan> {
    let (config, ctr) = container_for(job, args)?;
    Ok(JobPlan {
        job,
        config,
        container_id: ctr.id(),
        commands: ctr.describe(),
        steps: ctr.steps().to_vec(),
    })
}

fn evaluate(job: JobName, engine: &dyn Engine, args: &JobArgs) -> Result<crate::engine::Evaluated> {
    let (config, ctr) = container_for(job, args)?;
    log_status!(
        "job",
        "{} with {} on node {}",
        job,
        config.package_manager,
        config.node_version
    );
    engine.evaluate(&ctr)
}

pub fn install(engine: &dyn Engine, args: &JobArgs) -> Result<JobOutput> {
    let evaluated = evaluate(JobName::Install, engine, args)?;
    Ok(JobOutput::Container(evaluated.container))
}

pub fn test(engine: &dyn Engine, args: &JobArgs) -> Result<JobOutput> {
    let evaluated = evaluate(JobName::Test, engine, args)?;
    Ok(JobOutput::Stdout(evaluated.stdout))
}

pub fn build(engine: &dyn Engine, args: &JobArgs) -> Result<JobOutput> {
    let evaluated = evaluate(JobName::Build, engine, args)?;
    Ok(JobOutput::Directory(evaluated.directory(BUILD_OUTPUT)))
}

pub fn run(engine: &dyn Engine, args: &JobArgs) -> Result<JobOutput> {
    let evaluated = evaluate(JobName::Run, engine, args)?;
    Ok(JobOutput::Stdout(evaluated.stdout))
}

pub fn dev(engine: &dyn Engine, args: &JobArgs) -> Result<JobOutput> {
    let evaluated = evaluate(JobName::Dev, engine, args)?;
    Ok(JobOutput::Container(evaluated.container))
}
