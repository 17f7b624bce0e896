//! CLI command definitions and argument parsing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use pf_core::{CaptureError, CaptureOutcome, DirectoryExport, FfmpegVideo, SourceError, ThumbnailCapture};

use crate::config::{CliOverrides, Config};
use crate::output::{CaptureOutput, OutputFormat, OutputFormatter, ProbeOutput, SuccessMessage};
use crate::ExitCode;

/// posterframe - capture a JPEG thumbnail from the middle of a video
#[derive(Parser, Debug)]
#[command(name = "posterframe")]
#[command(version, about = "Capture a JPEG thumbnail from the middle of a video")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let formatter = formatter_for(&config);
        let config_path = self.config.clone();

        match self.command {
            Commands::Capture(args) => args.execute(config, &formatter).await,
            Commands::Probe(args) => args.execute(&config, &formatter).await,
            Commands::Config(args) => args.execute(&config, config_path.as_deref(), &formatter),
        }
    }
}

/// Build the formatter from the resolved output settings
pub fn formatter_for(config: &Config) -> OutputFormatter {
    let format = config.output.format.parse().unwrap_or_default();
    OutputFormatter::new(format, config.output.verbose)
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture the middle frame of a video and export it as JPEG
    Capture(CaptureArgs),
    /// Show video metadata and the frame time a capture would use
    Probe(ProbeArgs),
    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the capture command
#[derive(Parser, Debug)]
pub struct CaptureArgs {
    /// Video file to capture from
    pub video: PathBuf,

    /// Directory the thumbnail is written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Capture on request once metadata is available, without the auto delay
    #[arg(long)]
    pub manual: bool,

    /// JPEG quality in (0, 1]
    #[arg(long)]
    pub quality: Option<f32>,

    /// Delay after the seek completes before grabbing the frame
    #[arg(long = "settle-ms")]
    pub settle_ms: Option<u64>,

    /// Delay after metadata loads before the automatic capture
    #[arg(long = "auto-delay-ms")]
    pub auto_delay_ms: Option<u64>,

    /// Name of the exported file
    #[arg(long)]
    pub file_name: Option<String>,
}

impl CaptureArgs {
    pub async fn execute(self, config: Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let config = config.with_overrides(&CliOverrides {
            quality: self.quality,
            settle_delay_ms: self.settle_ms,
            auto_delay_ms: self.auto_delay_ms,
            file_name: self.file_name.clone(),
            ..Default::default()
        });
        if let Err(e) = config.validate() {
            formatter.error(&e.to_string());
            return Ok(ExitCode::InvalidInput);
        }
        if !self.video.is_file() {
            formatter.error(&format!("Video file not found: {}", self.video.display()));
            return Ok(ExitCode::InvalidInput);
        }

        let video = Arc::new(FfmpegVideo::new(&self.video, config.ffmpeg.clone()));
        let capture = Arc::new(ThumbnailCapture::attach(config.capture.clone(), video.clone()));

        // The trigger listens before the video starts loading
        let task = if self.manual {
            capture.spawn_request_capture()
        } else {
            capture.spawn_auto_capture()
        };
        let abort = task.abort_handle();

        formatter.progress(&format!("Probing {}", self.video.display()));
        match video.load().await {
            Ok(meta) => formatter.info(&format!(
                "{}x{}, midpoint {}",
                meta.width,
                meta.height,
                meta.midpoint()
                    .map(|m| format!("{m:.2}s"))
                    .unwrap_or_else(|| "unknown".to_string())
            )),
            Err(e) => {
                abort.abort();
                return Ok(report_source_error(formatter, &e, ExitCode::InvalidInput));
            }
        }

        formatter.progress("Capturing middle frame");
        let join = task.join();
        tokio::pin!(join);
        let result = tokio::select! {
            result = &mut join => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling capture");
                abort.abort();
                join.await
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(CaptureError::Source(e)) => {
                return Ok(report_source_error(formatter, &e, ExitCode::GeneralError));
            }
            Err(e) => {
                formatter.error(&format!("Capture failed: {e}"));
                return Ok(ExitCode::GeneralError);
            }
        };

        let receipt = if outcome.is_captured() {
            formatter.progress(&format!("Writing to {}", self.out.display()));
            let sink = DirectoryExport::new(&self.out);
            capture
                .export(&sink)
                .await
                .with_context(|| format!("Failed to export thumbnail to {}", self.out.display()))?
        } else {
            debug!(?outcome, "nothing to export");
            None
        };

        let report = CaptureOutput::new(&self.video, &outcome, receipt.as_ref(), capture.controls());
        if !formatter.is_quiet() {
            println!("{}", formatter.format_capture(&report));
        }

        Ok(exit_code_for(&outcome))
    }
}

/// Exit code for a finished capture
pub fn exit_code_for(outcome: &CaptureOutcome) -> ExitCode {
    match outcome {
        CaptureOutcome::Captured(_) => ExitCode::Success,
        CaptureOutcome::Skipped(_) | CaptureOutcome::Abandoned | CaptureOutcome::Cancelled => {
            ExitCode::NothingCaptured
        }
    }
}

/// Print a source failure and pick its exit code. A tool that cannot be
/// started always maps to `ToolMissing`; everything else to `fallback`.
fn report_source_error(formatter: &OutputFormatter, error: &SourceError, fallback: ExitCode) -> ExitCode {
    let code = if error.is_tool_missing() {
        ExitCode::ToolMissing
    } else {
        fallback
    };
    formatter.report_error(error, code);
    code
}

/// Arguments for the probe command
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Video file to inspect
    pub video: PathBuf,
}

impl ProbeArgs {
    pub async fn execute(self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        if !self.video.is_file() {
            formatter.error(&format!("Video file not found: {}", self.video.display()));
            return Ok(ExitCode::InvalidInput);
        }

        let video = FfmpegVideo::new(&self.video, config.ffmpeg.clone());
        let meta = match video.load().await {
            Ok(meta) => meta,
            Err(e) => return Ok(report_source_error(formatter, &e, ExitCode::InvalidInput)),
        };

        if !formatter.is_quiet() {
            println!("{}", formatter.format_probe(&ProbeOutput::new(&self.video, &meta)));
        }
        Ok(ExitCode::Success)
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigArgs {
    pub fn execute(
        self,
        config: &Config,
        custom_path: Option<&Path>,
        formatter: &OutputFormatter,
    ) -> anyhow::Result<ExitCode> {
        let path = custom_path.map(Path::to_path_buf).or_else(Config::default_path);

        match self.command {
            ConfigCommand::Show => {
                let loaded_from = path.as_deref().filter(|p| p.exists());
                if !formatter.is_quiet() {
                    println!("{}", formatter.format_config(config, loaded_from));
                }
                Ok(ExitCode::Success)
            }
            ConfigCommand::Path => {
                let Some(path) = path else {
                    formatter.error("No configuration directory available on this platform");
                    return Ok(ExitCode::GeneralError);
                };
                match formatter.format() {
                    OutputFormat::Table => println!("{}", path.display()),
                    OutputFormat::Json => println!(
                        "{}",
                        formatter.format_success(&SuccessMessage::new(path.display().to_string()), "config path")
                    ),
                    OutputFormat::Quiet => {}
                }
                Ok(ExitCode::Success)
            }
            ConfigCommand::Init { force } => {
                let Some(path) = path else {
                    formatter.error("No configuration directory available on this platform");
                    return Ok(ExitCode::GeneralError);
                };
                if write_sample_config(&path, force)? {
                    formatter.success(&format!("Wrote {}", path.display()));
                    if formatter.format() == OutputFormat::Json {
                        println!(
                            "{}",
                            formatter.format_success(
                                &SuccessMessage::new(format!("Wrote {}", path.display())),
                                "config init"
                            )
                        );
                    }
                } else {
                    formatter.warning(&format!(
                        "{} already exists; use --force to overwrite",
                        path.display()
                    ));
                }
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Write the commented sample configuration. Returns false when the file
/// exists and `force` is not set.
pub fn write_sample_config(path: &Path, force: bool) -> anyhow::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, Config::sample_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
