mod args;
mod report;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segmenter_core::{
    load_config, load_config_or_default, validate_config, Config, ConfigError, ConverterError,
    DirectoryWalker, SegmentConverter,
};

use args::Args;

/// Failures that stop the run before any file is converted.
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    TranscoderUnavailable(#[source] ConverterError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) | CliError::Config(_) => 2,
            CliError::TranscoderUnavailable(_) | CliError::Other(_) => 1,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<u8, CliError> {
    let metadata = tokio::fs::metadata(&args.path)
        .await
        .map_err(|e| metadata_error(&args.path, e))?;

    let config = resolve_config(&args)?;
    let converter_config = &config.converter;
    debug!(?converter_config, "Resolved converter configuration");

    let walker = DirectoryWalker::from_config(converter_config).recursive(args.recursive);

    if metadata.is_dir() {
        let files = walker
            .eligible_files(&args.path)
            .await
            .with_context(|| format!("Failed to list '{}'", args.path.display()))?;
        if files.is_empty() {
            println!("No M4A files found in '{}'.", args.path.display());
            return Ok(0);
        }
        check_transcoder(walker.converter()).await?;

        let batch = walker
            .convert_directory(&args.path)
            .await
            .with_context(|| format!("Failed to convert '{}'", args.path.display()))?;
        Ok(report::print_batch(&batch))
    } else {
        let converter = walker.converter();
        check_transcoder(converter).await?;

        let result = converter.convert_file(&args.path).await;
        let name = display_name(&args.path);
        println!("{}", report::result_line(&name, &result));
        let failed = usize::from(!result.success());
        println!("{}", report::summary_line(1 - failed, failed));
        Ok(report::exit_code(failed))
    }
}

/// Only a missing path is a usage error; anything else (permissions, I/O) is reported as is.
fn metadata_error(path: &Path, e: std::io::Error) -> CliError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CliError::Usage(format!("'{}' does not exist", path.display()))
    } else {
        CliError::Other(anyhow::Error::new(e).context(format!("Failed to read '{}'", path.display())))
    }
}

/// Loads the config file (if any) and applies command-line overrides on top.
fn resolve_config(args: &Args) -> Result<Config, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_config_or_default(None)?,
    };

    let converter = &mut config.converter;
    if let Some(seconds) = args.segment_time {
        converter.segment_seconds = seconds;
    }
    if let Some(jobs) = args.jobs {
        converter.max_parallel_conversions = jobs as usize;
    }
    if let Some(timeout) = args.timeout {
        converter.timeout_secs = Some(timeout);
    }
    if let Some(ffmpeg) = &args.ffmpeg {
        converter.ffmpeg_path = ffmpeg.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

/// Verifies the transcoder once so a missing binary fails before any output is created.
async fn check_transcoder(converter: &SegmentConverter) -> Result<(), CliError> {
    let transcoder = converter.transcoder();
    transcoder
        .validate()
        .await
        .map_err(CliError::TranscoderUnavailable)?;
    info!(transcoder = transcoder.name(), "Transcoder available");
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
