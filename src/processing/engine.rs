// src/processing/engine.rs

//! Backup, transform, upload and rollback for queued images.
//!
//! Items are handled strictly one after another over the single remote
//! session the engine owns. Every item ends in an [`ItemOutcome`]; only
//! failures to start a run are returned as errors.

use std::fmt;
use std::fs::File;
use std::path::Path;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::core::{
    AppConfig,
    Dimensions,
    ImageConfig,
    NullSink,
    ProgressSink,
    ProgressTracker,
    QueueItem,
    Variant,
    VariantSet,
    join_remote,
};
use crate::processing::transform::{ImageSource, TransformService};
use crate::remote::RemoteStore;
use crate::utils::{
    OptimizerError,
    OptimizerResult,
    RemoteError,
    ScratchFile,
    get_extension,
    validate_input_path,
};

/// Step of the per-item state machine an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Backup,
    TransformUpload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup => f.write_str("backup"),
            Self::TransformUpload => f.write_str("transform/upload"),
        }
    }
}

/// How a queue item ended.
#[derive(Debug)]
pub enum ItemOutcome {
    /// All four variants were uploaded
    Optimized,
    /// Dry run, nothing was touched
    Skipped,
    /// The item was abandoned; for transform/upload failures the backup
    /// has been rolled back
    Failed { stage: Stage, cause: OptimizerError },
    /// Transform/upload failed and the rollback failed too: either the backup
    /// could not be removed or the dropped session could not be reopened
    RollbackFailed {
        cause: OptimizerError,
        rollback: OptimizerError,
    },
}

/// Totals for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub queued: usize,
    pub optimized: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rollback_failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Optimized => self.optimized += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
            ItemOutcome::RollbackFailed { .. } => self.rollback_failed += 1,
        }
    }
}

/// Whether the backup was written by this item or was already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backup {
    Created,
    Existing,
}

/// Drives the per-item state machine against one remote session and one
/// transform service.
pub struct SyncEngine<S, T> {
    store: S,
    transform: T,
    base_url: Url,
    image_settings: ImageConfig,
    dry_run: bool,
    sink: Box<dyn ProgressSink>,
}

impl<S: RemoteStore, T: TransformService> SyncEngine<S, T> {
    pub fn new(store: S, transform: T, config: &AppConfig, dry_run: bool) -> OptimizerResult<Self> {
        Ok(Self {
            store,
            transform,
            base_url: directory_url(&config.base_url)?,
            image_settings: config.image_settings.clone(),
            dry_run,
            sink: Box::new(NullSink),
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Processes the whole queue in order.
    pub fn run(&mut self, queue: &[QueueItem]) -> RunSummary {
        let mut summary = RunSummary {
            queued: queue.len(),
            ..RunSummary::default()
        };
        let mut tracker = ProgressTracker::new(queue.len());

        for item in queue {
            let outcome = self.process_item(item);
            summary.record(&outcome);
            self.sink.item_finished(item, &outcome);

            if let Some(estimate) = tracker.record() {
                self.sink.estimate(&estimate);
            }
        }

        summary
    }

    /// Runs one item through backup, transform/upload and, on failure, rollback.
    pub fn process_item(&mut self, item: &QueueItem) -> ItemOutcome {
        let variants = VariantSet::from_filename(&item.filename);

        if self.dry_run {
            info!("Optimizing {} (dry run)", item.sibling(&variants.product));
            return ItemOutcome::Skipped;
        }

        let backup = match self.backup(item, &variants) {
            Ok(backup) => backup,
            Err(cause) => {
                return ItemOutcome::Failed {
                    stage: Stage::Backup,
                    cause,
                };
            }
        };

        let result = match self.source_url(item) {
            Ok(url) => self.transform_upload(&item.directory, &variants, ImageSource::Url(url)),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => ItemOutcome::Optimized,
            Err(cause) => self.rollback(item, &variants, backup, cause),
        }
    }

    /// Optimizes a local image into `target_dir` without touching existing
    /// remote files first.
    ///
    /// Uploads the four derived variants and then the untouched local file
    /// as the original.
    pub fn upload_local(&mut self, local: &Path, target_dir: &str) -> OptimizerResult<VariantSet> {
        validate_input_path(local)?;
        let variants = VariantSet::from_filename(&local.to_string_lossy());
        let bytes = std::fs::read(local)?;

        self.transform_upload(target_dir, &variants, ImageSource::Bytes(bytes))?;

        let original_path = join_remote(target_dir, &variants.original);
        let mut original = File::open(local)?;
        self.store.put(&original_path, &mut original)?;
        debug!("Uploaded {}", original_path);

        Ok(variants)
    }

    pub fn close(&mut self) {
        self.store.close();
    }

    // ── States ──────────────────────────────────────────────────────────────────────

    fn backup(&mut self, item: &QueueItem, variants: &VariantSet) -> OptimizerResult<Backup> {
        if item.filename == variants.original {
            debug!("{} is already the original backup", item);
            return Ok(Backup::Existing);
        }

        let source = item.remote_path();
        let target = item.sibling(&variants.original);
        debug!("Copying {} to {}", source, target);

        let bytes = self.store.get(&source)?;
        let mut scratch = ScratchFile::new(get_extension(&item.filename).as_deref())?;
        let staged = scratch.stage(&bytes)?;
        self.store.put(&target, staged)?;

        Ok(Backup::Created)
    }

    fn transform_upload(
        &mut self,
        directory: &str,
        variants: &VariantSet,
        source: ImageSource,
    ) -> OptimizerResult<()> {
        let handle = self.transform.submit(source)?;
        let mut scratch = ScratchFile::new(get_extension(&variants.product).as_deref())?;

        for variant in Variant::DERIVED {
            let dimensions = self.dimensions(variant);
            let bytes = self.transform.fit(&handle, dimensions)?;
            let target = join_remote(directory, variants.get(variant));

            let staged = scratch.stage(&bytes)?;
            self.store.put(&target, staged)?;
            debug!("Uploaded {} ({}, {} bytes)", target, dimensions, bytes.len());
        }

        Ok(())
    }

    fn rollback(
        &mut self,
        item: &QueueItem,
        variants: &VariantSet,
        backup: Backup,
        cause: OptimizerError,
    ) -> ItemOutcome {
        warn!("Optimizing {} failed: {}", item, cause);

        // never delete an original this item did not create, but leave the
        // session usable for the next item
        if backup == Backup::Existing {
            if cause.is_transport() {
                if let Err(e) = self.store.reconnect() {
                    return ItemOutcome::RollbackFailed {
                        cause,
                        rollback: e.into(),
                    };
                }
            }
            return ItemOutcome::Failed {
                stage: Stage::TransformUpload,
                cause,
            };
        }

        let backup_path = item.sibling(&variants.original);
        match self.remove_backup(&backup_path, cause.is_transport()) {
            Ok(()) => {
                debug!("Rolled back {}", backup_path);
                ItemOutcome::Failed {
                    stage: Stage::TransformUpload,
                    cause,
                }
            }
            Err(rollback) => ItemOutcome::RollbackFailed { cause, rollback },
        }
    }

    /// Deletes the backup. A dead connection gets exactly one reconnect.
    fn remove_backup(&mut self, path: &str, reconnect_first: bool) -> OptimizerResult<()> {
        if reconnect_first {
            self.store.reconnect()?;
            self.store.delete(path)?;
            return Ok(());
        }

        match self.store.delete(path) {
            Err(RemoteError::Transport(reason)) => {
                warn!("Connection lost while deleting {}: {}", path, reason);
                self.store.reconnect()?;
                self.store.delete(path)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
            Ok(()) => Ok(()),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────────────────

    fn dimensions(&self, variant: Variant) -> Dimensions {
        match variant {
            Variant::Popup => self.image_settings.popup,
            Variant::Thumbnail => self.image_settings.thumbnail,
            Variant::Related => self.image_settings.related,
            Variant::Product | Variant::Original => self.image_settings.product,
        }
    }

    /// Public url the transform service fetches the item's source from.
    ///
    /// Every path component is appended as its own percent-encoded segment,
    /// so names containing `#`, `?` or `:` stay part of the path.
    pub fn source_url(&self, item: &QueueItem) -> OptimizerResult<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| OptimizerError::processing(format!("Cannot build url for {item}: base url has no path")))?
            .pop_if_empty()
            .extend(
                item.directory
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .chain([item.filename.as_str()]),
            );
        Ok(url.into())
    }
}

/// Parses `base_url` as the root remote paths are appended under.
fn directory_url(base_url: &str) -> OptimizerResult<Url> {
    let normalized = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| OptimizerError::validation(format!("Invalid base url '{base_url}': {e}")))
}
