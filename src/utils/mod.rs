//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Process execution with error handling
//! - `io` - File I/O and filtered directory copies
//! - `shell` - Shell quoting for rendered commands

pub mod command;
pub mod io;
pub mod shell;
