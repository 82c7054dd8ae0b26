use crate::builder::HaploBuilder;
use crate::cli::TrainArgs;
use crate::genotype::HaploData;
use crate::pattern::PatternLibrary;
use crate::utils::{create_writer, open_text_writer, Diagnostics, Result};
use std::io::Write;

/// Settings of one training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainParams {
    pub iterations: usize,
    pub min_freq: f64,
    pub tolerance: f64,
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub iterations: usize,
    pub log_likelihoods: Vec<f64>,
    pub pruned: usize,
    pub converged: bool,
}

/// Runs EM iterations on an initialized builder until `tolerance` or `iterations` is reached.
pub fn train_library(builder: &mut HaploBuilder, params: &TrainParams) -> Result<TrainSummary> {
    let mut summary = TrainSummary {
        iterations: 0,
        log_likelihoods: Vec::new(),
        pruned: 0,
        converged: false,
    };
    let mut baseline: Option<f64> = None;
    for iteration in 1..=params.iterations {
        let log_likelihood = if params.threads > 1 {
            builder.adjust_parallel(params.min_freq, params.threads)?
        } else {
            builder.adjust(params.min_freq)?
        };
        summary.iterations = iteration;
        if log_likelihood == f64::NEG_INFINITY {
            log::warn!("Iteration {}: no genotype could be resolved, stopping", iteration);
            break;
        }
        let pruned = if params.min_freq > 0.0 {
            builder.prune(params.min_freq)?
        } else {
            0
        };
        summary.pruned += pruned;
        log::info!(
            "Iteration {}: log-likelihood {:.6}, {} patterns pruned",
            iteration,
            log_likelihood,
            pruned
        );
        summary.log_likelihoods.push(log_likelihood);

        // a pruned library starts a new comparison
        let improvement = baseline.map(|previous| log_likelihood - previous);
        baseline = (pruned == 0).then_some(log_likelihood);
        if let Some(improvement) = improvement {
            if improvement < -params.tolerance {
                log::warn!(
                    "Iteration {}: log-likelihood decreased by {:.3e}",
                    iteration,
                    -improvement
                );
            }
            if improvement.abs() < params.tolerance {
                summary.converged = true;
                break;
            }
        }
    }
    Ok(summary)
}

pub fn train(args: TrainArgs) -> Result<()> {
    let diagnostics = Diagnostics::new(args.timing);
    let library = PatternLibrary::from_path(&args.patterns_path)?;
    let data = HaploData::from_path(&args.genotypes_path)?;
    log::info!(
        "Training {} patterns on {} genotypes over {} loci",
        library.len(),
        data.genotype_num(),
        data.genotype_len()
    );

    let mut builder = HaploBuilder::new(library, data).with_diagnostics(diagnostics.clone());
    builder.initialize()?;
    let params = TrainParams {
        iterations: args.iterations,
        min_freq: args.min_freq,
        tolerance: args.tolerance,
        threads: args.num_threads,
    };
    let summary = diagnostics.timed("Training", || train_library(&mut builder, &params))?;
    if summary.converged {
        log::info!("Converged after {} iterations", summary.iterations);
    } else {
        log::info!("Stopped after {} iterations", summary.iterations);
    }

    let library = builder.into_library();
    let mut writer = create_writer(&args.output_prefix, "patterns.tsv", open_text_writer)?;
    library.write(&mut writer)?;
    writer.flush().map_err(|e| e.to_string())?;
    log::info!(
        "Wrote {} patterns ({} pruned)",
        library.len(),
        summary.pruned
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::Genotype;
    use crate::pattern::HaploPattern;
    use std::io::Cursor;

    const LIBRARY: &str = "\
0\tA\t0.5
0\ta\t0.5
0\tAB\t0.25
0\tAb\t0.25
0\taB\t0.25
0\tab\t0.25
";

    fn builder(pairs: &[(&str, &str)]) -> HaploBuilder {
        let library = PatternLibrary::from_reader(Cursor::new(LIBRARY)).unwrap();
        let genotypes = pairs
            .iter()
            .enumerate()
            .map(|(i, (h0, h1))| Genotype::from_strs(&format!("g{}", i), h0, h1).unwrap())
            .collect();
        let data = HaploData::from_genotypes(genotypes).unwrap();
        let mut builder = HaploBuilder::new(library, data);
        builder.initialize().unwrap();
        builder
    }

    fn params(iterations: usize) -> TrainParams {
        TrainParams {
            iterations,
            min_freq: 0.0,
            tolerance: 1e-9,
            threads: 1,
        }
    }

    #[test]
    fn log_likelihood_never_decreases() {
        let mut builder = builder(&[("AB", "AB"), ("AB", "ab"), ("ab", "ab"), ("A.", "aB")]);
        let summary = train_library(&mut builder, &params(8)).unwrap();
        assert!(!summary.log_likelihoods.is_empty());
        for pair in summary.log_likelihoods.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9, "{:?}", summary.log_likelihoods);
        }
    }

    #[test]
    fn pruning_restarts_the_convergence_check() {
        let pattern = |start: usize, alleles: &str, frequency: f64, transition_prob: f64| {
            HaploPattern::new(start, alleles.parse().unwrap(), frequency, transition_prob)
        };
        let mut patterns = vec![pattern(0, "A", 0.6, 0.6), pattern(0, "a", 0.4, 0.4)];
        for start in 0..3 {
            patterns.push(pattern(start, "AA", 0.42, 0.7));
            patterns.push(pattern(start, "Aa", 0.18, 0.3));
            patterns.push(pattern(start, "aA", 0.08, 0.2));
            patterns.push(pattern(start, "aa", 0.32, 0.8));
        }
        let library = PatternLibrary::new(patterns);
        let genotypes = vec![
            Genotype::from_strs("g1", "AAAA", "AAAA").unwrap(),
            Genotype::from_strs("g2", "AAAA", "AAAa").unwrap(),
        ];
        let data = HaploData::from_genotypes(genotypes).unwrap();
        let mut builder = HaploBuilder::new(library, data);
        builder.initialize().unwrap();
        let params = TrainParams {
            iterations: 10,
            min_freq: 0.01,
            tolerance: 1e3,
            threads: 1,
        };
        let summary = train_library(&mut builder, &params).unwrap();
        // the first iteration prunes, so the second has nothing to compare against
        assert!(summary.pruned > 0);
        assert!(summary.converged);
        assert_eq!(summary.iterations, 3);
    }

    #[test]
    fn homozygous_cohort_converges() {
        let mut builder = builder(&[("AB", "AB"), ("ab", "ab")]);
        let summary = train_library(&mut builder, &params(20)).unwrap();
        assert!(summary.converged);
        let library = builder.library();
        // only AB and ab are ever observed
        assert!((library[2].frequency - 0.5).abs() < 1e-9);
        assert!(library[3].frequency.abs() < 1e-9);
    }
}
