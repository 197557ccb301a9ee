//! Command handlers for the optimizer.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::{AppConfig, LogSink, ProgressSink, RunOptions, VariantSet};
use crate::processing::{QueueBuilder, RunSummary, SyncEngine, TinifyClient, TransformService};
use crate::remote::{FtpStore, RemoteStore};
use crate::utils::{OptimizerError, OptimizerResult};

/// Scans the configured FTP directories and optimizes every queued image.
///
/// The pipeline is blocking, so it runs on tokio's blocking thread pool.
///
/// # Arguments
/// * `config` - Remote store, public url and variant settings
/// * `options` - Force, dry run, limit and single image options
///
/// # Returns
/// Per-outcome totals. Failing items do not make this an error; only a
/// failure to connect does.
pub async fn optimize_remote(config: AppConfig, options: RunOptions) -> OptimizerResult<RunSummary> {
    tokio::task::spawn_blocking(move || -> OptimizerResult<RunSummary> {
        log_settings(&config, &options);

        let store = FtpStore::from_config(&config)?;
        let transform = TinifyClient::new(&config.transform)?;
        optimize_with(store, transform, &config, &options, Box::new(LogSink))
    })
    .await
    .map_err(|e| OptimizerError::processing(format!("Task panicked: {e}")))?
}

/// Optimizes a local image straight into `target_dir` on the FTP server.
///
/// Used for images that do not exist remotely yet, so there is nothing to
/// back up or roll back.
pub async fn upload_image(
    config: AppConfig,
    local: PathBuf,
    target_dir: String,
) -> OptimizerResult<VariantSet> {
    tokio::task::spawn_blocking(move || -> OptimizerResult<VariantSet> {
        let store = FtpStore::from_config(&config)?;
        let transform = TinifyClient::new(&config.transform)?;
        upload_with(store, transform, &config, &local, &target_dir)
    })
    .await
    .map_err(|e| OptimizerError::processing(format!("Task panicked: {e}")))?
}

/// Builds the queue and runs it through the engine over an already opened
/// session.
pub fn optimize_with<S, T>(
    mut store: S,
    transform: T,
    config: &AppConfig,
    options: &RunOptions,
    sink: Box<dyn ProgressSink>,
) -> OptimizerResult<RunSummary>
where
    S: RemoteStore,
    T: TransformService,
{
    let queue = QueueBuilder::new(&config.directories, config.listing_dialect, options)
        .build(&mut store);
    info!("Optimizing {} images", queue.len());

    let mut engine = SyncEngine::new(store, transform, config, options.dry_run)?.with_sink(sink);
    let summary = engine.run(&queue);
    engine.close();

    if summary.rollback_failed > 0 {
        warn!(
            "{} images kept a backup without new variants, see errors above",
            summary.rollback_failed
        );
    }
    info!(
        "Done: {} optimized, {} skipped, {} failed of {} queued",
        summary.optimized,
        summary.skipped,
        summary.failed + summary.rollback_failed,
        summary.queued
    );

    Ok(summary)
}

/// Direct upload over an already opened session.
pub fn upload_with<S, T>(
    store: S,
    transform: T,
    config: &AppConfig,
    local: &Path,
    target_dir: &str,
) -> OptimizerResult<VariantSet>
where
    S: RemoteStore,
    T: TransformService,
{
    debug!("Uploading {} to {}", local.display(), target_dir);
    let mut engine = SyncEngine::new(store, transform, config, false)?;
    let result = engine.upload_local(local, target_dir);
    engine.close();

    if let Ok(variants) = &result {
        info!("Uploaded {} variants of {}", variants.product, local.display());
    }
    result
}

fn log_settings(config: &AppConfig, options: &RunOptions) {
    debug!("Force: {}", options.force);
    debug!("Dry run: {}", options.dry_run);
    if let Some(limit) = options.effective_limit() {
        debug!("Limit: {}", limit);
    }
    if let Some(image) = &options.explicit_image {
        debug!("Image: {}", image);
    }
    debug!("Host: {}", config.host);
    debug!("Base URL: {}", config.base_url);
    debug!("Directories: {:?}", config.directories);
    debug!("Image config: {:?}", config.image_settings);
}
