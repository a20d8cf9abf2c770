pub type CmdResult<T> = nodeci::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod build;
pub mod dev;
pub mod gitlab;
pub mod install;
pub mod job;
pub mod jobs;
pub mod pipeline;
pub mod run;

pub(crate) fn run_raw(
    command: crate::Commands,
    _global: &GlobalArgs,
) -> nodeci::Result<(String, i32)> {
    match command {
        crate::Commands::Gitlab(args) => gitlab::run_yaml(args),
        _ => Err(nodeci::Error::validation_invalid_argument(
            "output_mode",
            "Command does not support raw output",
            None,
            None,
        )),
    }
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (nodeci::Result<serde_json::Value>, i32) {
    crate::tty::status("nodeci is working...");

    match command {
        crate::Commands::Install(args) => dispatch!(args, global, install),
        crate::Commands::Test(args) => dispatch!(args, global, test),
        crate::Commands::Build(args) => dispatch!(args, global, build),
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Dev(args) => dispatch!(args, global, dev),
        crate::Commands::Pipeline(args) => dispatch!(args, global, pipeline),
        crate::Commands::Jobs(args) => dispatch!(args, global, jobs),
        crate::Commands::Gitlab(args) => dispatch!(args, global, gitlab),

        // Special case: List uses raw output mode
        crate::Commands::List => {
            let err = nodeci::Error::validation_invalid_argument(
                "output_mode",
                "List command uses raw output mode",
                None,
                None,
            );
            crate::output::map_cmd_result_to_json::<serde_json::Value>(Err(err))
        }
    }
}
