//! pngopt - Quantize PNG files to indexed PNGs
//!
//! A command-line tool that rewrites PNG images with a palette of at most
//! 256 colors. Directories are processed recursively.

use clap::Parser;
use pngopt::{
    process_target, Fallback, OptimizeOptions, OutputMode, DEFAULT_COLOR_LIMIT, MAX_PALETTE_SIZE,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pngopt")]
#[command(version)]
#[command(about = "Quantize PNG images into indexed PNGs", long_about = None)]
struct Cli {
    /// PNG file or directory to optimize
    target: PathBuf,

    /// Maximum number of colors; values outside 1-256 are clamped
    #[arg(
        short = 'c',
        long = "color",
        default_value_t = DEFAULT_COLOR_LIMIT as i64,
        allow_negative_numbers = true
    )]
    colors: i64,

    /// Overwrite the input instead of writing <name>_opt.png
    #[arg(long)]
    in_place: bool,

    /// Fail on chunks whose stored CRC does not match
    #[arg(long)]
    verify_crc: bool,

    /// Helper script run when a single file cannot be decoded
    #[arg(long, value_name = "PATH", conflicts_with = "no_fallback")]
    fallback: Option<PathBuf>,

    /// Never run a fallback helper
    #[arg(long)]
    no_fallback: bool,

    /// Log decode and palette details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pngopt=debug"
    } else {
        "pngopt=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let opts = OptimizeOptions {
        color_limit: cli.colors.clamp(1, MAX_PALETTE_SIZE as i64) as u16,
        decode: pngopt::DecodeOptions {
            verify_crc: cli.verify_crc,
        },
        output: if cli.in_place {
            OutputMode::InPlace
        } else {
            OutputMode::Sibling
        },
    };

    let fallback = if cli.no_fallback {
        Fallback::disabled()
    } else if let Some(helper) = cli.fallback {
        Fallback {
            helper: Some(helper),
        }
    } else {
        Fallback::default()
    };

    let report = process_target(&cli.target, &opts, &fallback);

    for (input, output) in report.optimized() {
        println!("Optimized {} -> {}", input.display(), output.display());
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{} of {} entries failed",
            report.failures.len(),
            report.failures.len() + report.outcomes.len()
        );
        ExitCode::FAILURE
    }
}
