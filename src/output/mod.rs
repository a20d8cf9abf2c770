//! CLI output: JSON envelope and exit codes.

mod response;

pub use response::*;
