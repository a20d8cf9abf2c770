use clap::{CommandFactory, Parser, Subcommand};

use commands::GlobalArgs;

#[derive(Debug, Clone, Copy)]
enum ResponseMode {
    Json,
    Raw,
}

mod commands;
mod output;
mod tty;

use commands::{build, gitlab, job, jobs, pipeline, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "nodeci")]
#[command(version = VERSION)]
#[command(about = "CI jobs for Node.js projects, run in containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install dependencies
    Install(job::JobCommandArgs),
    /// Run tests
    Test(job::JobCommandArgs),
    /// Build the project
    Build(build::BuildArgs),
    /// Run a task
    Run(run::RunArgs),
    /// Returns a Container with Node.js installed
    Dev(job::JobCommandArgs),
    /// Run several jobs in order, stopping at the first failure
    Pipeline(pipeline::PipelineArgs),
    /// List available jobs
    Jobs(jobs::JobsArgs),
    /// Print or write the GitLab CI document
    Gitlab(gitlab::GitlabArgs),
    /// List available commands (alias for --help)
    List,
}

fn response_mode(command: &Commands) -> ResponseMode {
    match command {
        Commands::Gitlab(args) if gitlab::is_print_yaml(args) => ResponseMode::Raw,
        Commands::List => ResponseMode::Raw,
        _ => ResponseMode::Json,
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    if matches!(cli.command, Commands::List) {
        let mut cmd = Cli::command();
        if cmd.print_help().is_err() {
            return std::process::ExitCode::from(1);
        }
        println!();
        return std::process::ExitCode::SUCCESS;
    }

    if let ResponseMode::Raw = response_mode(&cli.command) {
        return match commands::run_raw(cli.command, &global) {
            Ok((content, exit_code)) => {
                print!("{}", content);
                std::process::ExitCode::from(exit_code_to_u8(exit_code))
            }
            Err(err) => {
                let exit_code = output::exit_code_for_error(err.code);
                let _ = output::print_result::<serde_json::Value>(Err(err));
                std::process::ExitCode::from(exit_code_to_u8(exit_code))
            }
        };
    }

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
