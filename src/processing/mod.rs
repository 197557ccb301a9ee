//! The synchronization pipeline.
//!
//! - [`QueueBuilder`]: Finds remote images that still need optimization
//! - [`SyncEngine`]: Backup, transform, upload and rollback per image
//! - [`transform`]: The external image transform service

mod engine;
mod queue;
pub mod transform;

pub use engine::{ItemOutcome, RunSummary, Stage, SyncEngine};
pub use queue::QueueBuilder;
pub use transform::{ImageSource, SourceHandle, TinifyClient, TransformService};
