use crate::utils::Result;
use chrono::Datelike;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="haplobuilder",
          version=&**FULL_VERSION,
          about="Haplotype resolution against a trained pattern library",
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) {}. This program comes with ABSOLUTELY NO WARRANTY.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Resolve genotypes into haplotype pairs")]
    Resolve(ResolveArgs),
    #[clap(about = "Re-estimate pattern frequencies with EM")]
    Train(TrainArgs),
    #[clap(about = "Pattern library validator")]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct ResolveArgs {
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "patterns")]
    #[clap(help = "Pattern library TSV (start, alleles, frequency, [transition_prob])")]
    #[clap(value_name = "PATTERNS")]
    #[arg(value_parser = check_file_exists)]
    pub patterns_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genotypes")]
    #[clap(help = "Genotype TSV (id, haplotype0, haplotype1, [phased])")]
    #[clap(value_name = "GENOTYPES")]
    #[arg(value_parser = check_file_exists)]
    pub genotypes_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "alternatives")]
    #[clap(help = "Number of alternative haplotype pairs to report per genotype")]
    #[clap(value_name = "ALTERNATIVES")]
    #[clap(default_value = "0")]
    pub alternatives: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "timing")]
    #[clap(help = "Log the time spent in each stage at debug level")]
    pub timing: bool,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct TrainArgs {
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "patterns")]
    #[clap(help = "Initial pattern library TSV")]
    #[clap(value_name = "PATTERNS")]
    #[arg(value_parser = check_file_exists)]
    pub patterns_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genotypes")]
    #[clap(help = "Training cohort genotype TSV")]
    #[clap(value_name = "GENOTYPES")]
    #[arg(value_parser = check_file_exists)]
    pub genotypes_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(long = "iterations")]
    #[clap(help = "Maximum number of EM iterations")]
    #[clap(value_name = "ITERATIONS")]
    #[clap(default_value = "10")]
    pub iterations: usize,

    #[clap(long = "min-freq")]
    #[clap(help = "Drop non-head patterns below this frequency after each iteration")]
    #[clap(value_name = "MIN_FREQ")]
    #[clap(default_value = "0.0")]
    #[arg(value_parser = ensure_unit_float)]
    pub min_freq: f64,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "tolerance")]
    #[clap(help = "Stop once the cohort log-likelihood improves by less than this")]
    #[clap(value_name = "TOLERANCE")]
    #[clap(default_value = "1e-6")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub tolerance: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "timing")]
    #[clap(help = "Log the time spent in each stage at debug level")]
    pub timing: bool,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "patterns")]
    #[clap(help = "Pattern library TSV")]
    #[clap(value_name = "PATTERNS")]
    #[arg(value_parser = check_file_exists)]
    pub patterns_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genotypes")]
    #[clap(help = "Genotype TSV providing the loci and allele catalogue")]
    #[clap(value_name = "GENOTYPES")]
    #[arg(value_parser = check_file_exists)]
    pub genotypes_path: PathBuf,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn ensure_non_negative_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value.is_nan() || value < 0.0 {
        Err(format!("The value must be non-negative, got: {}", value))
    } else {
        Ok(value)
    }
}
