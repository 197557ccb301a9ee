//! Core types, configuration and progress tracking.
//!
//! This module contains the fundamental types used throughout the crate:
//! - [`AppConfig`]: Remote store, public url and variant settings
//! - [`VariantSet`]: The five names an image is stored under
//! - [`QueueItem`]: One image waiting to be optimized
//! - [`RunOptions`]: Force, dry run, limit and single image options
//! - [`ProgressTracker`]: Periodic time estimates during a run

pub mod config;
mod types;
mod variants;
mod progress;

pub use config::{AppConfig, ListingDialect, TransformConfig, load_config};
pub use types::{Dimensions, ImageConfig, QueueItem, RunOptions, join_remote};
pub use variants::{Variant, VariantSet, is_original, is_popup};
pub use progress::{
    LogSink,
    NullSink,
    ProgressEstimate,
    ProgressSink,
    ProgressTracker,
    REPORT_INTERVAL,
};
