use crate::builder::{HaploBuilder, Trellis};
use crate::cli::ValidateArgs;
use crate::genotype::HaploData;
use crate::pattern::PatternLibrary;
use crate::utils::{median, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryReport {
    pub pattern_num: usize,
    pub head_num: usize,
    pub head_len: usize,
    /// Patterns that can never be extended although they stop short of the last locus.
    pub dead_ends: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub lengths: Stats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Compiles the library against the cohort and tries every genotype.
pub fn validate_library(library: PatternLibrary, data: HaploData) -> Result<LibraryReport> {
    let mut builder = HaploBuilder::new(library, data);
    builder.initialize()?;

    let len = builder.genotype_len();
    let library = builder.library();
    let lengths: Vec<usize> = library.iter().map(|p| p.len()).collect();
    let dead_ends = library
        .iter()
        .filter(|p| p.end() < len && p.successors.iter().all(Option::is_none))
        .count();

    let mut trellis = Trellis::new();
    let mut resolved = 0;
    let mut unresolved = 0;
    for genotype in builder.data().genotypes() {
        if builder.resolve_with(genotype, &mut trellis)?.is_resolved() {
            resolved += 1;
        } else {
            log::warn!("Genotype {} cannot be explained by the library", genotype.id);
            unresolved += 1;
        }
    }

    Ok(LibraryReport {
        pattern_num: library.len(),
        head_num: builder.heads().len(),
        head_len: builder.head_len(),
        dead_ends,
        resolved,
        unresolved,
        lengths: calculate_stats(&lengths),
    })
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let library = PatternLibrary::from_path(&args.patterns_path)?;
    let data = HaploData::from_path(&args.genotypes_path)?;
    let report = validate_library(library, data)?;

    log::info!(
        "Patterns: {}, heads: {} of length {}, dead ends: {}",
        report.pattern_num,
        report.head_num,
        report.head_len,
        report.dead_ends
    );
    log::info!(
        "Pattern lengths - Range: [{},{}], Median: {:.2}, Mean: {:.2}, StdDev: {:.2}",
        report.lengths.min,
        report.lengths.max,
        report.lengths.median,
        report.lengths.mean,
        report.lengths.std_dev
    );

    let total = report.resolved + report.unresolved;
    match report.unresolved {
        0 => log::info!("Validation successful. Genotypes resolved={}", report.resolved),
        _ => log::info!(
            "Validation incomplete. Genotypes resolved={} ({:.2}%), unresolved={} ({:.2}%)",
            report.resolved,
            report.resolved as f64 / total as f64 * 100.0,
            report.unresolved,
            report.unresolved as f64 / total as f64 * 100.0
        ),
    }
    Ok(())
}

fn calculate_stats(data: &[usize]) -> Stats {
    let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
    let len = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / len;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len;
    Stats {
        min: data.iter().copied().min().unwrap_or(0),
        max: data.iter().copied().max().unwrap_or(0),
        mean,
        median: median(&values).unwrap_or(0.0),
        std_dev: variance.sqrt(),
    }
}
