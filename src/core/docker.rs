//! [`Engine`] backed by the `docker` CLI.
//!
//! A chain is replayed against one long-lived container: every cache volume is
//! mounted up front as a named volume, exec steps run through `docker exec`
//! with the workdir and environment accumulated so far, and directories are
//! staged on the host (honoring exclusions) before `docker cp`. The finished
//! container is committed to an image whose id becomes the [`ContainerId`].

use std::path::{Path, PathBuf};

use crate::container::{Container, ContainerId, Directory, DirectoryId, Step};
use crate::defaults::Defaults;
use crate::engine::{Engine, Evaluated};
use crate::error::{Error, ExecFailedDetails, Result};
use crate::utils::command::{self, CommandOutput};
use crate::utils::{io, shell};

pub struct DockerEngine {
    program: String,
}

/// Working directory and environment in effect at a given step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ExecContext {
    workdir: Option<String>,
    env: Vec<(String, String)>,
}

impl ExecContext {
    fn set_env(&mut self, name: &str, value: &str) {
        self.env.retain(|(k, _)| k != name);
        self.env.push((name.to_string(), value.to_string()));
    }
}

impl DockerEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_defaults(defaults: &Defaults) -> Self {
        Self::new(defaults.engine.docker_bin.clone())
    }

    fn docker(&self, args: &[String]) -> Result<CommandOutput> {
        command::capture(&self.program, args)
            .map_err(|e| Error::engine_unavailable(&self.program, e.to_string()))
    }

    /// Run a docker subcommand that must succeed; returns trimmed stdout.
    fn docker_ok(&self, args: &[String], container: Option<&str>) -> Result<String> {
        let output = self.docker(args)?;
        if !output.success {
            return Err(Error::engine_exec_failed(ExecFailedDetails {
                command: format!("{} {}", self.program, shell::quote_args(args)),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
                container: container.map(str::to_string),
            }));
        }
        Ok(output.stdout.trim().to_string())
    }

    fn replay(&self, container: &Container, name: &str) -> Result<(String, ExecContext)> {
        let mut ctx = ExecContext::default();
        let mut stdout = String::new();
        let mut seen_from = false;

        for step in container.steps() {
            let label = container.pipeline_name().unwrap_or("engine");
            log_status!("engine", "{}: {}", label, step.describe());

            match step {
                Step::From { .. } if !seen_from => seen_from = true,
                Step::From { image } => {
                    return Err(Error::validation_invalid_argument(
                        "container",
                        format!("Chain switches base image to '{}' mid-way", image),
                        None,
                        None,
                    ));
                }
                Step::Exec { args } => {
                    let output = self.docker(&exec_args(name, &ctx, args))?;
                    if !output.success {
                        return Err(Error::engine_exec_failed(ExecFailedDetails {
                            command: shell::quote_args(args),
                            exit_code: output.exit_code,
                            stdout: output.stdout,
                            stderr: output.stderr,
                            container: Some(name.to_string()),
                        }));
                    }
                    stdout = output.stdout;
                }
                // Mounted when the container starts.
                Step::MountCache { .. } => {}
                Step::EnvVariable { name: key, value } => ctx.set_env(key, value),
                Step::Directory {
                    path,
                    source,
                    exclude,
                } => self.copy_in(name, path, source, exclude)?,
                Step::Workdir { path } => {
                    self.docker_ok(&mkdir_args(name, path), Some(name))?;
                    ctx.workdir = Some(path.clone());
                }
            }
        }

        Ok((stdout, ctx))
    }

    fn copy_in(&self, name: &str, path: &str, source: &Directory, exclude: &[String]) -> Result<()> {
        let stage = tempfile::TempDir::new()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create staging dir".to_string())))?;
        let staged = stage.path().join("src");

        match source {
            Directory::Host(host) => {
                io::copy_dir_filtered(host, &staged, exclude)?;
            }
            Directory::Output(id) => {
                let raw = stage.path().join("raw");
                self.export_directory(id, &raw)?;
                io::copy_dir_filtered(&raw, &staged, exclude)?;
            }
        }

        self.docker_ok(&mkdir_args(name, path), Some(name))?;
        self.docker_ok(
            &[
                "cp".to_string(),
                format!("{}/.", staged.display()),
                format!("{}:{}", name, path),
            ],
            Some(name),
        )?;
        Ok(())
    }
}

impl Engine for DockerEngine {
    fn evaluate(&self, container: &Container) -> Result<Evaluated> {
        let image = container.base_image().ok_or_else(|| {
            Error::validation_invalid_argument(
                "container",
                "Container has no base image (missing `from` step)",
                None,
                None,
            )
        })?;

        let name = container_name(container);
        self.docker_ok(&start_args(container, &name, image), None)?;

        let result = self.replay(container, &name).and_then(|(stdout, ctx)| {
            let image_id = self.docker_ok(&commit_args(&name, &ctx), Some(name.as_str()))?;
            Ok(Evaluated {
                stdout,
                container: ContainerId(image_id),
            })
        });

        if let Err(err) = self.docker(&["rm".to_string(), "-f".to_string(), name.clone()]) {
            log_status!("engine", "Failed to remove {}: {}", name, err);
        }

        result
    }

    fn export_directory(&self, directory: &DirectoryId, dest: &Path) -> Result<PathBuf> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
            })?;
        }

        let created = self.docker_ok(
            &["create".to_string(), directory.container.0.clone()],
            None,
        )?;

        let copied = self.docker_ok(
            &[
                "cp".to_string(),
                format!("{}:{}/.", created, directory.path),
                dest.display().to_string(),
            ],
            Some(created.as_str()),
        );

        if let Err(err) = self.docker(&["rm".to_string(), created.clone()]) {
            log_status!("engine", "Failed to remove {}: {}", created, err);
        }

        copied.map(|_| dest.to_path_buf())
    }
}

fn container_name(container: &Container) -> String {
    let id = container.id();
    format!("nodeci-{}-{}", &id[..12], std::process::id())
}

fn start_args(container: &Container, name: &str, image: &str) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--entrypoint".to_string(),
        "sleep".to_string(),
    ];

    for step in container.steps() {
        if let Step::MountCache { path, volume } = step {
            args.push("-v".to_string());
            args.push(format!("{}:{}", volume.name, path));
        }
    }

    args.push(image.to_string());
    args.push("infinity".to_string());
    args
}

fn exec_args(name: &str, ctx: &ExecContext, argv: &[String]) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if let Some(workdir) = &ctx.workdir {
        args.push("-w".to_string());
        args.push(workdir.clone());
    }
    for (key, value) in &ctx.env {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }
    args.push(name.to_string());
    args.extend(argv.iter().cloned());
    args
}

fn mkdir_args(name: &str, path: &str) -> Vec<String> {
    vec![
        "exec".to_string(),
        name.to_string(),
        "mkdir".to_string(),
        "-p".to_string(),
        path.to_string(),
    ]
}

/// Commit keeps the accumulated workdir and env on the resulting image.
fn commit_args(name: &str, ctx: &ExecContext) -> Vec<String> {
    let mut args = vec!["commit".to_string()];
    if let Some(workdir) = &ctx.workdir {
        args.push("--change".to_string());
        args.push(format!("WORKDIR {}", workdir));
    }
    for (key, value) in &ctx.env {
        args.push("--change".to_string());
        args.push(format!("ENV {}={}", key, value));
    }
    args.push(name.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::CacheVolume;

    fn sample() -> Container {
        Container::new()
            .from("pkgxdev/pkgx:latest")
            .with_exec(["apt-get", "update"])
            .with_mounted_cache("/app/node_modules", CacheVolume::new("node_modules_npm"))
            .with_mounted_cache("/app/dist", CacheVolume::new("dist"))
            .with_workdir("/app")
            .with_exec(["npm", "install"])
    }

    #[test]
    fn start_args_mount_every_cache_volume() {
        let args = start_args(&sample(), "nodeci-test", "pkgxdev/pkgx:latest");
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--name",
                "nodeci-test",
                "--entrypoint",
                "sleep",
                "-v",
                "node_modules_npm:/app/node_modules",
                "-v",
                "dist:/app/dist",
                "pkgxdev/pkgx:latest",
                "infinity",
            ]
        );
    }

    #[test]
    fn exec_args_carry_workdir_and_env() {
        let mut ctx = ExecContext::default();
        ctx.workdir = Some("/app".to_string());
        ctx.set_env("CI", "1");
        ctx.set_env("CI", "true");

        let args = exec_args("box", &ctx, &["npm".to_string(), "test".to_string()]);
        assert_eq!(
            args,
            vec!["exec", "-w", "/app", "-e", "CI=true", "box", "npm", "test"]
        );
    }

    #[test]
    fn exec_args_without_context() {
        let args = exec_args("box", &ExecContext::default(), &["ls".to_string()]);
        assert_eq!(args, vec!["exec", "box", "ls"]);
    }

    #[test]
    fn commit_args_preserve_workdir() {
        let ctx = ExecContext {
            workdir: Some("/app".to_string()),
            env: vec![("NODE_ENV".to_string(), "production".to_string())],
        };
        assert_eq!(
            commit_args("box", &ctx),
            vec![
                "commit",
                "--change",
                "WORKDIR /app",
                "--change",
                "ENV NODE_ENV=production",
                "box",
            ]
        );
    }

    #[test]
    fn container_name_is_derived_from_chain() {
        let name = container_name(&sample());
        assert!(name.starts_with("nodeci-"));
        assert!(name.contains(&sample().id()[..12]));
    }

    #[test]
    fn missing_binary_is_engine_unavailable() {
        let engine = DockerEngine::new("nonexistent-docker-xyz");
        let err = engine.evaluate(&sample()).unwrap_err();
        assert_eq!(err.code.as_str(), "engine.unavailable");
    }

    #[test]
    fn chain_without_base_image_is_rejected() {
        let engine = DockerEngine::new("nonexistent-docker-xyz");
        let err = engine
            .evaluate(&Container::new().with_exec(["true"]))
            .unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }
}
