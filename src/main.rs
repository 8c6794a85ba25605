//! video-splitter
//!
//! Cuts a long recording into parts of bounded length by stream copy,
//! without re-encoding.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_splitter::config_file::{generate_default_config, ConfigFile};
use video_splitter::{LogFormat, MediaInfo, Result, SplitConfig, SplitError};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "video-splitter";

/// Split long videos into parts without re-encoding.
#[derive(Parser, Debug)]
#[command(name = "video-splitter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a file into parts
    Split {
        /// Input media file
        input: PathBuf,

        /// Maximum part length (seconds, MM:SS or HH:MM:SS)
        #[arg(long, value_parser = parse_duration)]
        max_chunk: Option<f64>,

        /// Trailing parts shorter than this are merged into the previous one
        #[arg(long, value_parser = parse_duration)]
        min_chunk: Option<f64>,

        /// Directory for the parts (default: next to the input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Parts to extract concurrently
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show file name, duration, size and streams
    Info {
        /// Input media file
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write it
        path: PathBuf,
    },
}

/// Parse `SS`, `MM:SS` or `HH:MM:SS` (seconds may be fractional).
fn parse_duration(s: &str) -> std::result::Result<f64, String> {
    let fields: Vec<&str> = s.trim().split(':').collect();
    if fields.len() > 3 || fields.iter().any(|f| f.is_empty()) {
        return Err(format!("invalid duration: {:?}", s));
    }

    let (last, rest) = fields
        .split_last()
        .ok_or_else(|| format!("invalid duration: {:?}", s))?;
    let mut total: f64 = last
        .parse()
        .map_err(|_| format!("invalid seconds in {:?}", s))?;

    for (unit, field) in [60.0, 3600.0].iter().zip(rest.iter().rev()) {
        let value: u64 = field
            .parse()
            .map_err(|_| format!("invalid field {:?} in {:?}", field, s))?;
        total += value as f64 * unit;
    }

    if !total.is_finite() || total < 0.0 {
        return Err(format!("duration must be non-negative: {:?}", s));
    }
    Ok(total)
}

fn format_hms(secs: f64) -> String {
    let total = secs.max(0.0);
    let whole = total as u64;
    format!(
        "{:02}:{:02}:{:05.2}",
        whole / 3600,
        (whole / 60) % 60,
        total - (whole - whole % 60) as f64
    )
}

fn load_config(path: Option<&Path>) -> Result<SplitConfig> {
    match path {
        Some(path) => ConfigFile::from_file(path)
            .map(ConfigFile::into_split_config)
            .map_err(|e| SplitError::Config(format!("{}: {}", path.display(), e))),
        None => Ok(SplitConfig::default()),
    }
}

/// Initialize logging with tracing
fn init_logging(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("video_splitter={level},ffmpeg={level}").into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_info(info: &MediaInfo) {
    let duration = info
        .duration_secs
        .map(|d| format!("{:.2}s ({})", d, format_hms(d)))
        .unwrap_or_else(|| "unknown".to_string());

    println!("{}", info.filename);
    println!("  format:   {}", info.format_name);
    println!("  duration: {}", duration);
    println!("  size:     {} bytes", info.file_size);
    for s in &info.streams {
        println!(
            "  #{} {} {} (time base {})",
            s.index, s.media_type, s.codec, s.time_base
        );
    }
}

async fn run(cli: Cli, mut config: SplitConfig) -> Result<()> {
    match cli.command {
        Command::Split {
            input,
            max_chunk,
            min_chunk,
            output_dir,
            jobs,
        } => {
            if let Some(max) = max_chunk {
                config.max_chunk_secs = max;
            }
            if let Some(min) = min_chunk {
                config.min_chunk_secs = min;
            }
            if output_dir.is_some() {
                config.output_dir = output_dir;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            tracing::debug!("Configuration: {:?}", config);

            let parts = video_splitter::split_async(&input, &config).await?;
            for part in parts {
                println!("{}", part.display());
            }
            Ok(())
        }
        Command::Info { input, json } => {
            let info = tokio::task::spawn_blocking(move || video_splitter::probe_media_info(input))
                .await
                .map_err(|e| SplitError::Join(e.to_string()))??;
            if json {
                let out = serde_json::to_string_pretty(&info)
                    .map_err(|e| SplitError::Config(format!("JSON encoding failed: {}", e)))?;
                println!("{}", out);
            } else {
                print_info(&info);
            }
            Ok(())
        }
        Command::InitConfig { path } => {
            if path.exists() {
                return Err(SplitError::Config(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            generate_default_config(&path)
                .map_err(|e| SplitError::Config(format!("{}: {}", path.display(), e)))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, config.log_format);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::info!("FFmpeg version: {}", video_splitter::ffmpeg_version_info());

    if let Err(e) = video_splitter::init() {
        eprintln!("{}: {}", APP_NAME, e);
        return ExitCode::FAILURE;
    }
    video_splitter::install_log_filter();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            if let SplitError::ChunkFailed { completed, .. } = &e {
                for part in completed {
                    eprintln!("  completed: {}", part.display());
                }
            }
            ExitCode::FAILURE
        }
    }
}
