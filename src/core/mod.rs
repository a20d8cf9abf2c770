// Public modules
pub mod container;
pub mod defaults;
pub mod docker;
pub mod engine;
pub mod error;
pub mod gitlab;
pub mod jobs;
pub mod pipeline;
pub mod registry;
pub mod settings;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
