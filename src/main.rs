use clap::{Parser, Subcommand};
use photo_finish::capture::begin_capture;
use photo_finish::config::{self, PipelineConfig};
use photo_finish::descriptor::{DescribedCapture, load_capture};
use photo_finish::imaging::AspectRatio;
use photo_finish::options::{QualityPrioritization, TakePhotoOptions};
use photo_finish::output::{self, BatchEntry, BatchFailure};
use photo_finish::process::{PhotoPostProcessor, destination_path};
use photo_finish::types::{CaptureResult, ProcessingRequest};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Photo settings that override config and descriptor options.
#[derive(clap::Args, Clone)]
struct PhotoArgs {
    /// Output width in pixels (0 keeps the captured size)
    #[arg(long)]
    target_width: Option<u32>,

    /// Output aspect ratio: 4:3, 1:1, 16:9 or a number
    #[arg(long)]
    aspect_ratio: Option<AspectRatio>,

    /// JPEG quality tier: speed, balanced or quality
    #[arg(long)]
    quality_prioritization: Option<QualityPrioritization>,
}

#[derive(Parser)]
#[command(name = "photo-finish")]
#[command(about = "Post-process captured camera photos")]
#[command(long_about = "\
Post-process captured camera photos

Each capture is described by a small JSON file pointing at the raw pixel
bytes the camera delivered:

  {
    \"source\": \"IMG_0001.jpg\",
    \"format\": \"jpeg\",
    \"exifOrientation\": 6,
    \"isMirrored\": false,
    \"options\": { \"targetWidth\": 1080, \"aspectRatio\": 1.0 }
  }

JPEG captures are oriented upright, resized, cropped and re-encoded.
RAW_SENSOR captures are wrapped in a DNG container.

Settings resolve as: stock defaults → photo-finish.toml → descriptor
options → command-line flags.

Run 'photo-finish gen-config' to generate a documented photo-finish.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "photo-finish.toml", global = true)]
    config: PathBuf,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one capture descriptor
    Process {
        /// Capture descriptor (JSON)
        descriptor: PathBuf,

        /// Output file (default: the descriptor's filePath, else a temp file)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Seconds to wait for the pipeline before giving up
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        photo: PhotoArgs,
    },
    /// Process many capture descriptors in parallel
    Batch {
        /// Capture descriptors (JSON)
        #[arg(required = true)]
        descriptors: Vec<PathBuf>,

        /// Write captures without a filePath to <DIR>/<descriptor name>.jpg
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        photo: PhotoArgs,
    },
    /// Print the EXIF orientation table
    Orientations,
    /// Print a stock photo-finish.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Process {
            descriptor,
            output: output_path,
            timeout,
            json,
            photo,
        } => {
            let config = config::load_config(&cli.config)?;
            let DescribedCapture {
                capture, options, ..
            } = load_capture(&descriptor)?;
            let request = build_request(&config, options.as_ref(), &photo, output_path.as_deref())?;

            let processor = Arc::new(PhotoPostProcessor::from_config(&config.output));
            let (pending, handle) = begin_capture(request);
            pending.complete(processor, capture);
            let photo = handle.wait_timeout(Duration::from_secs(timeout))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&photo)?);
            } else {
                output::print_processed(&descriptor, &photo);
            }
        }
        Command::Batch {
            descriptors,
            output_dir,
            json,
            photo,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let jobs = prepare_batch(&config, &descriptors, output_dir.as_deref(), &photo)?;

            let processor = PhotoPostProcessor::from_config(&config.output);
            let entries: Vec<BatchEntry> = jobs
                .into_par_iter()
                .map(|(descriptor, job)| {
                    let outcome = job.and_then(|(capture, request)| {
                        processor.process(capture, &request).map_err(|e| BatchFailure {
                            code: e.code(),
                            message: e.to_string(),
                        })
                    });
                    BatchEntry {
                        descriptor,
                        outcome,
                    }
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&batch_json(&entries))?);
            } else {
                output::print_batch(&entries);
            }
            let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} captures failed", entries.len()).into());
            }
        }
        Command::Orientations => {
            output::print_orientation_table();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("photo_finish={level}"))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
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

/// Resolve settings for one capture: descriptor options replace the config
/// defaults as a whole, then individual flags override.
fn build_request(
    config: &PipelineConfig,
    options: Option<&TakePhotoOptions>,
    photo: &PhotoArgs,
    output: Option<&Path>,
) -> std::io::Result<ProcessingRequest> {
    let mut options = options
        .cloned()
        .unwrap_or_else(|| config.photo.to_options());
    if let Some(width) = photo.target_width {
        options.target_width = width;
    }
    if let Some(ratio) = photo.aspect_ratio {
        options.aspect_ratio = ratio;
    }
    if let Some(tier) = photo.quality_prioritization {
        options.quality_prioritization = tier;
    }

    let mut request = options.to_request();
    if let Some(path) = output {
        request.output_path = Some(path.to_path_buf());
    }
    if let Some(path) = request.output_path.take() {
        request.output_path = Some(std::path::absolute(path)?);
    }
    Ok(request)
}

type BatchJob = Result<(CaptureResult, ProcessingRequest), BatchFailure>;

/// Load every descriptor and resolve its request.
///
/// Unreadable descriptors become per-entry failures; two captures that
/// would write the same file abort the whole batch before anything runs.
/// Paths are compared after RAW captures have been moved to `.dng`.
fn prepare_batch(
    config: &PipelineConfig,
    descriptors: &[PathBuf],
    output_dir: Option<&Path>,
    photo: &PhotoArgs,
) -> Result<Vec<(PathBuf, BatchJob)>, Box<dyn std::error::Error>> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(descriptors.len());

    for path in descriptors {
        let job = match load_capture(path) {
            Ok(described) => {
                let fallback = output_dir
                    .filter(|_| described.options.as_ref().is_none_or(|o| o.file_path.is_empty()))
                    .map(|dir| batch_output_path(dir, path, described.capture.format.is_raw()));
                let request =
                    build_request(config, described.options.as_ref(), photo, fallback.as_deref())?;
                if let Some(out) = &request.output_path {
                    let destination = destination_path(out, &described.capture.format);
                    if !seen.insert(destination.clone()) {
                        return Err(format!(
                            "duplicate output path {} (from {})",
                            destination.display(),
                            path.display()
                        )
                        .into());
                    }
                }
                Ok((described.capture, request))
            }
            Err(e) => Err(BatchFailure {
                code: "capture/invalid-descriptor",
                message: e.to_string(),
            }),
        };
        jobs.push((path.clone(), job));
    }
    Ok(jobs)
}

fn batch_output_path(dir: &Path, descriptor: &Path, raw: bool) -> PathBuf {
    let stem = descriptor
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string());
    dir.join(stem).with_extension(if raw { "dng" } else { "jpg" })
}

fn batch_json(entries: &[BatchEntry]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(photo) => serde_json::json!({
                "descriptor": entry.descriptor,
                "photo": photo,
            }),
            Err(failure) => serde_json::json!({
                "descriptor": entry.descriptor,
                "error": { "code": failure.code, "message": failure.message },
            }),
        })
        .collect();
    serde_json::Value::Array(items)
}
