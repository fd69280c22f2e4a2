use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use upload_optimizer::{batch, config, editor, imaging::RustCodec, output, profile, types};

/// Which constraints to apply.
#[derive(clap::Args, Clone)]
struct FieldArgs {
    /// Field whose constraints apply (a `[fields.*]` table)
    #[arg(long, default_value = config::DEFAULT_FIELD)]
    field: String,

    /// Variant of the field (a `[variants.<field>.*]` table)
    #[arg(long)]
    variant: Option<String>,
}

#[derive(Parser)]
#[command(name = "upload-optimizer")]
#[command(about = "Adaptive WebP optimization for uploaded images")]
#[command(long_about = "\
Adaptive WebP optimization for uploaded images

Each file is treated as an upload to a named field: checked against the
field's size limit and allowed formats, downscaled to fit the field's box,
and re-encoded as WebP. The encoder quality starts high and steps down until
the output fits the field's byte budget.

Compression tiers (by original size):

  >= 5 MB    quality 75 → 50, step 5, target 80% smaller
  >= 3 MB    quality 80 → 60, step 4, target 70% smaller
  >= 1 MB    quality 85 → 70, step 3, target 50% smaller
  >= 512 KB  quality 90 → 80, step 2, target 30% smaller
   < 512 KB  quality 95 → 90, step 1, target 10% smaller

Animated GIFs, images below the field's minimum dimensions and files that
don't decode are kept as uploaded.

Run 'upload-optimizer gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "upload-optimizer.toml", global = true)]
    config: PathBuf,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and optimize image files
    Optimize {
        #[command(flatten)]
        field: FieldArgs,

        /// Directory for optimized outputs
        #[arg(long, default_value = "optimized")]
        out_dir: PathBuf,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,

        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Run pre-flight validation only
    Check {
        #[command(flatten)]
        field: FieldArgs,

        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the compression profile for an upload size in bytes
    Profile { bytes: u64 },
    /// Prepare a rich-text editor upload
    EditorUpload {
        /// Storage root the upload key is resolved against
        #[arg(long, default_value = "media")]
        out_dir: PathBuf,

        path: PathBuf,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Optimize {
            field,
            out_dir,
            json,
            paths,
        } => {
            let config = config::load_config(&cli.config)?;
            let constraints = config.constraints(&field.field, field.variant.as_deref())?;
            init_thread_pool(&config.processing);

            let files = batch::collect_inputs(&paths);
            let outcomes = batch::optimize_files(&files, &field.field, constraints, &out_dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                output::print_optimize_report(&outcomes);
            }
        }
        Command::Check { field, paths } => {
            let config = config::load_config(&cli.config)?;
            let constraints = config.constraints(&field.field, field.variant.as_deref())?;

            let files = batch::collect_inputs(&paths);
            let outcomes = batch::check_files(&files, &field.field, constraints)?;
            output::print_check_report(&outcomes);

            let rejected = outcomes.iter().filter(|o| o.is_rejected()).count();
            if rejected > 0 {
                return Err(format!("{rejected} file(s) failed validation").into());
            }
        }
        Command::Profile { bytes } => {
            output::print_profile(bytes, &profile::select_profile(bytes));
        }
        Command::EditorUpload { out_dir, path } => {
            let config = config::load_config(&cli.config)?;
            let upload = types::UploadDescriptor::from_path(&path)?;
            let now = chrono::Local::now().naive_local();

            let prepared =
                editor::prepare_inline_upload(&RustCodec::new(), &upload, &config.editor, now)?;
            let target = out_dir.join(&prepared.storage_path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &prepared.data)?;
            output::print_inline_upload(&path.display().to_string(), &prepared);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. Reports go to stdout.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
