// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — command-line host.
//
// Entry point. Initialises logging, reads the job from flags or a JSON file,
// and runs it over one photographed page.

mod job;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use scanwerk_core::human_errors::humanize_error;
use scanwerk_core::{FilterConfig, ScanConfig};

use job::{BackgroundJob, CliError, CliResult, Job};

#[derive(Parser)]
#[command(name = "scanwerk")]
#[command(about = "Straighten, enhance and clean up photographed handwritten pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crop, filter and optionally remove the background of one page.
    Process(ProcessArgs),

    /// Print the default engine configuration as JSON.
    Config,
}

#[derive(Debug, Clone, Args)]
struct ProcessArgs {
    /// Path to the input photo (any format the `image` crate decodes).
    #[arg(long)]
    input: PathBuf,

    /// Path to write the finished page (PNG).
    #[arg(long)]
    output: PathBuf,

    /// JSON job file; replaces all of the job flags below.
    #[arg(long)]
    job: Option<PathBuf>,

    /// JSON engine configuration (size limits, resampling, tolerance mapping).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Crop corners in CSS pixels, any order: "x,y;x,y;x,y;x,y".
    #[arg(long)]
    corners: Option<String>,

    /// Device pixel ratio between the image and the corner coordinates.
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Brightness, -100..=100.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    brightness: i32,

    /// Contrast, -100..=100.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    contrast: i32,

    /// Saturation, -100..=100.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    saturation: i32,

    /// Convert to pure black and white.
    #[arg(long)]
    bw: bool,

    /// Background colour to remove: "r,g,b".
    #[arg(long, conflicts_with = "sample_at")]
    background: Option<String>,

    /// Remove the background colour found at this CSS point: "x,y".
    #[arg(long)]
    sample_at: Option<String>,

    /// Background removal tolerance, 0..=50.
    #[arg(long, default_value_t = 10.0)]
    tolerance: f64,
}

impl ProcessArgs {
    fn to_job(&self) -> CliResult<Job> {
        if let Some(path) = &self.job {
            return Job::from_json_str(&read_text(path)?);
        }

        let corners = self
            .corners
            .as_deref()
            .map(job::parse_corners)
            .transpose()?;
        let color = self.background.as_deref().map(job::parse_rgb).transpose()?;
        let sample_at = self.sample_at.as_deref().map(job::parse_point).transpose()?;
        let background = (color.is_some() || sample_at.is_some()).then_some(BackgroundJob {
            color,
            sample_at,
            tolerance: self.tolerance,
        });

        Ok(Job {
            corners,
            dpr: self.dpr,
            filters: FilterConfig {
                brightness: self.brightness,
                contrast: self.contrast,
                saturation: self.saturation,
                black_and_white: self.bw,
            },
            background,
        })
    }

    fn engine_config(&self) -> CliResult<ScanConfig> {
        match &self.config {
            Some(path) => Ok(ScanConfig::from_json_str(&read_text(path)?)?),
            None => Ok(ScanConfig::default()),
        }
    }
}

fn read_text(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|err| CliError::Scan(err.into()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Process(args) => process(&args),
        Commands::Config => print_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "scanwerk failed");
            match &err {
                CliError::Scan(scan) => {
                    let human = humanize_error(scan);
                    eprintln!("{}\n{}", human.message, human.suggestion);
                }
                other => eprintln!("{other}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn process(args: &ProcessArgs) -> CliResult<()> {
    let job = args.to_job()?;
    let config = args.engine_config()?;
    tracing::debug!(?job, "Job resolved");
    job::run(&args.input, &args.output, &job, &config)
}

fn print_config() -> CliResult<()> {
    println!("{}", ScanConfig::default().to_json_string()?);
    Ok(())
}
