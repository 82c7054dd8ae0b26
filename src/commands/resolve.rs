use crate::builder::{HaploBuilder, Resolution, Trellis};
use crate::cli::ResolveArgs;
use crate::genotype::{Genotype, HaploData};
use crate::pattern::PatternLibrary;
use crate::utils::{create_writer, median, open_text_writer, Diagnostics, Result};
use crossbeam_channel::bounded;
use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{collections::BTreeMap, io::Write, thread};

const CHANNEL_BUFFER_SIZE: usize = 2048;

/// One resolved genotype ready for output.
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub genotype: Genotype,
    pub resolved: bool,
    /// Phase errors against the input when the input is a phased truth set.
    pub switch_distance: Option<usize>,
    pub alternatives: Vec<Genotype>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionSummary {
    pub written: usize,
    pub unresolved: usize,
    pub phased: usize,
    pub switches: usize,
    pub median_weight: Option<f64>,
}

pub struct ResolutionWriter<W: Write> {
    writer: W,
    summary: ResolutionSummary,
    weights: Vec<f64>,
}

impl<W: Write> ResolutionWriter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(
            writer,
            "#id\thaplotype0\thaplotype1\tlikelihood\tweight\tswitch_distance"
        )
        .map_err(|e| e.to_string())?;
        Ok(ResolutionWriter {
            writer,
            summary: ResolutionSummary::default(),
            weights: Vec::new(),
        })
    }

    pub fn write(&mut self, record: &ResolvedRecord) -> Result<()> {
        let switch_distance = record
            .switch_distance
            .map_or(".".to_string(), |d| d.to_string());
        self.write_line(&record.genotype.id, &record.genotype, &switch_distance)?;
        for (k, alternative) in record.alternatives.iter().enumerate() {
            let id = format!("{}/alt{}", record.genotype.id, k + 1);
            self.write_line(&id, alternative, ".")?;
        }

        self.summary.written += 1;
        if record.resolved {
            self.weights.push(record.genotype.weight);
        } else {
            self.summary.unresolved += 1;
        }
        if let Some(d) = record.switch_distance {
            self.summary.phased += 1;
            self.summary.switches += d;
        }
        Ok(())
    }

    fn write_line(&mut self, id: &str, genotype: &Genotype, switch_distance: &str) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{:e}\t{:.6}\t{}",
            id,
            genotype.haplotypes[0].alleles,
            genotype.haplotypes[1].alleles,
            genotype.likelihood,
            genotype.weight,
            switch_distance
        )
        .map_err(|e| e.to_string())
    }

    pub fn finish(mut self) -> Result<ResolutionSummary> {
        self.writer.flush().map_err(|e| e.to_string())?;
        self.summary.median_weight = median(&self.weights);
        Ok(self.summary)
    }
}

/// Resolves one genotype into an output record with up to `alternatives` extra candidates.
pub fn resolve_genotype(
    builder: &HaploBuilder,
    genotype: &Genotype,
    trellis: &mut Trellis,
    alternatives: usize,
) -> Result<ResolvedRecord> {
    let Resolution {
        genotype: resolved,
        alternatives: candidates,
    } = builder.resolve_with(genotype, trellis)?;
    let is_resolved = !candidates.is_empty();
    if !is_resolved {
        log::warn!("Genotype {} could not be resolved", genotype.id);
    }
    let switch_distance =
        (genotype.is_phased && is_resolved).then(|| genotype.switch_distance(&resolved));
    let alternatives = candidates
        .iter()
        .skip(1)
        .take(alternatives)
        .map(|candidate| builder.candidate_genotype(genotype, trellis, candidate))
        .collect::<Result<Vec<_>>>()?;
    Ok(ResolvedRecord {
        genotype: resolved,
        resolved: is_resolved,
        switch_distance,
        alternatives,
    })
}

pub fn resolve(args: ResolveArgs) -> Result<()> {
    let diagnostics = Diagnostics::new(args.timing);
    let library = PatternLibrary::from_path(&args.patterns_path)?;
    let data = HaploData::from_path(&args.genotypes_path)?;
    log::info!(
        "Loaded {} patterns and {} genotypes over {} loci",
        library.len(),
        data.genotype_num(),
        data.genotype_len()
    );

    let mut builder = HaploBuilder::new(library, data).with_diagnostics(diagnostics.clone());
    builder.initialize()?;

    let writer = create_writer(&args.output_prefix, "haplotypes.tsv", |path| {
        ResolutionWriter::new(open_text_writer(path)?)
    })?;

    let (sender_result, receiver_result) = bounded::<(usize, ResolvedRecord)>(CHANNEL_BUFFER_SIZE);
    let writer_thread = thread::spawn(move || -> Result<ResolutionSummary> {
        let mut writer = writer;
        // results arrive out of order; hold them until their turn
        let mut pending = BTreeMap::new();
        let mut next_index = 0;
        for (index, record) in &receiver_result {
            pending.insert(index, record);
            while let Some(record) = pending.remove(&next_index) {
                writer.write(&record)?;
                next_index += 1;
            }
        }
        writer.finish()
    });

    log::debug!(
        "Initializing thread pool with {} threads...",
        args.num_threads
    );
    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("haplobuilder-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;

    let builder = &builder;
    let outcome = diagnostics.timed("Resolving genotypes", || {
        pool.install(|| {
            builder
                .data()
                .genotypes()
                .par_iter()
                .enumerate()
                .try_for_each_init(
                    || (Trellis::new(), sender_result.clone()),
                    |(trellis, sender), (index, genotype)| -> Result<()> {
                        let record =
                            resolve_genotype(builder, genotype, trellis, args.alternatives)?;
                        sender.send((index, record)).map_err(|e| {
                            format!("Failed to send result to writer thread: {}", e)
                        })
                    },
                )
        })
    });

    // Clean-up
    drop(sender_result);
    let summary = writer_thread
        .join()
        .map_err(|_| "Writer thread panicked".to_string())??;
    log::trace!("Writer thread finished");
    outcome?;

    log::info!(
        "Resolved {} genotypes, {} unresolved, median weight {}",
        summary.written,
        summary.unresolved,
        summary
            .median_weight
            .map_or("NA".to_string(), |w| format!("{:.4}", w))
    );
    if summary.phased > 0 {
        log::info!(
            "Switch distance against {} phased genotypes: {}",
            summary.phased,
            summary.switches
        );
    }
    Ok(())
}
