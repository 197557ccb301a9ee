// This is the primary entry point for the FTP Image Optimizer.
// The lib.rs file serves as the public API for library consumers.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ftp_image_optimizer::core::config::{DEFAULT_CONFIG_PATH, load_config};
use ftp_image_optimizer::utils::InstanceLock;
use ftp_image_optimizer::{RunOptions, optimize_remote, upload_image};

#[derive(Parser, Debug)]
#[command(
    name = "ftp-image-optimizer",
    version,
    about = "Optimize and resize product images on an FTP server",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    optimize: OptimizeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the configured directories and optimize new images (default)
    Optimize(OptimizeArgs),
    /// Optimize a local image straight into a remote directory
    Upload {
        /// Local image file
        file: PathBuf,
        /// Remote directory to upload the variants to
        remote_dir: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct OptimizeArgs {
    /// Re-optimize images that already have variants
    #[arg(long)]
    force: bool,

    /// Only report what would be optimized
    #[arg(long)]
    dry_run: bool,

    /// Maximum number of images to optimize
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Optimize a single image, given as an absolute remote path
    #[arg(long, value_name = "ABSOLUTE PATH")]
    image: Option<String>,
}

impl From<OptimizeArgs> for RunOptions {
    fn from(args: OptimizeArgs) -> Self {
        RunOptions {
            force: args.force,
            dry_run: args.dry_run,
            limit: args.limit,
            explicit_image: args.image,
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let _lock = InstanceLock::acquire().context("Failed to acquire the instance lock")?;
    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Command::Upload { file, remote_dir }) => {
            upload_image(config, file, remote_dir)
                .await
                .context("Direct upload failed")?;
        }
        Some(Command::Optimize(args)) => {
            optimize_remote(config, args.into())
                .await
                .context("Optimization run failed")?;
        }
        None => {
            optimize_remote(config, cli.optimize.into())
                .await
                .context("Optimization run failed")?;
        }
    }

    info!("=== Finished ===");
    Ok(())
}
