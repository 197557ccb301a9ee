// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod remote;
pub mod processing;
pub mod commands;

// Public exports for external consumers
pub use core::{AppConfig, QueueItem, RunOptions, Variant, VariantSet};
pub use processing::{ItemOutcome, RunSummary, Stage};
pub use utils::{OptimizerError, OptimizerResult};
pub use commands::*;

// This library file is used as a public API for consuming this crate as a library.
// The command line entry point is in main.rs.
