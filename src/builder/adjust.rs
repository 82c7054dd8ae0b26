use super::{HaploBuilder, Trellis};
use crate::genotype::{Allele, Genotype};
use crate::pattern::{Orientation, PatternLibrary, PatternNode, PatternTree};
use crate::utils::Result;
use rayon::{
    iter::{IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::collections::BTreeMap;

const SIDE_A: u8 = 1;
const SIDE_B: u8 = 2;
const BOTH_SIDES: u8 = SIDE_A | SIDE_B;

/// Expected haplotype count at the tree root: both sides of every genotype.
const ROOT_COUNT: f64 = 2.0;

/// Path mass per (pair index, sides still matching the walked prefix).
type Masses = BTreeMap<(usize, u8), f64>;

fn swap_sides(mask: u8) -> u8 {
    ((mask & SIDE_A) << 1) | ((mask & SIDE_B) >> 1)
}

fn matching_sides(alleles: (Allele, Allele), allele: Allele) -> u8 {
    let mut mask = 0;
    if alleles.0 == allele {
        mask |= SIDE_A;
    }
    if alleles.1 == allele {
        mask |= SIDE_B;
    }
    mask
}

/// Expected pattern counts gathered over the cohort in one E-step.
#[derive(Debug, Clone, Default)]
pub struct EmAccumulator {
    pub frequency: Vec<f64>,
    pub incoming: Vec<f64>,
    pub log_likelihood: f64,
    pub resolved: usize,
    pub skipped: usize,
}

impl EmAccumulator {
    pub fn new(pattern_num: usize) -> Self {
        EmAccumulator {
            frequency: vec![0.0; pattern_num],
            incoming: vec![0.0; pattern_num],
            ..Default::default()
        }
    }

    pub fn merge(mut self, other: EmAccumulator) -> Self {
        for (a, b) in self.frequency.iter_mut().zip(&other.frequency) {
            *a += b;
        }
        for (a, b) in self.incoming.iter_mut().zip(&other.incoming) {
            *a += b;
        }
        self.log_likelihood += other.log_likelihood;
        self.resolved += other.resolved;
        self.skipped += other.skipped;
        self
    }
}

/// Walks a forward pattern tree over one genotype's resolved trellis.
struct MassWalker<'a> {
    library: &'a PatternLibrary,
    trellis: &'a Trellis,
    head_len: usize,
    likelihood: f64,
    acc: &'a mut EmAccumulator,
}

impl MassWalker<'_> {
    fn frontier_locus(&self, locus: usize) -> usize {
        locus.max(self.head_len)
    }

    fn walk_from(&mut self, root: &PatternNode, start: usize) {
        let locus = self.frontier_locus(start);
        let masses: Masses = self
            .trellis
            .frontier(locus)
            .iter()
            .enumerate()
            .filter(|(_, pair)| pair.forward_likelihood > 0.0)
            .map(|(index, pair)| ((index, BOTH_SIDES), pair.forward_likelihood))
            .collect();
        self.walk(root, start, &masses, ROOT_COUNT);
    }

    fn walk(&mut self, node: &PatternNode, locus: usize, masses: &Masses, last_freq: f64) {
        for (allele, child) in node.children() {
            let next = self.step(locus, allele, masses);
            let freq = self.node_frequency(locus + 1, &next);
            if let Some(id) = child.pattern() {
                self.acc.frequency[id] += freq;
                self.acc.incoming[id] += last_freq;
            }
            if !next.is_empty() {
                self.walk(child, locus + 1, &next, freq);
            }
        }
    }

    /// Moves every mass across `locus`, keeping the sides that carry `allele` there.
    fn step(&self, locus: usize, allele: Allele, masses: &Masses) -> Masses {
        let mut next = Masses::new();
        if locus < self.head_len {
            for (&(index, mask), &mass) in masses {
                let pair = self.trellis.pair(self.head_len, index);
                let sides = matching_sides(
                    (
                        self.library[pair.pattern_a].allele_at(locus),
                        self.library[pair.pattern_b].allele_at(locus),
                    ),
                    allele,
                );
                if mask & sides != 0 {
                    *next.entry((index, mask & sides)).or_default() += mass;
                }
            }
            return next;
        }
        for (&(index, mask), &mass) in masses {
            for link in &self.trellis.pair(locus, index).forward_links {
                let mask = if link.swapped { swap_sides(mask) } else { mask };
                let mask = mask & matching_sides(link.alleles, allele);
                if mask != 0 {
                    *next.entry((link.target, mask)).or_default() += mass * link.weight;
                }
            }
        }
        next
    }

    fn node_frequency(&self, locus: usize, masses: &Masses) -> f64 {
        let locus = self.frontier_locus(locus);
        masses
            .iter()
            .map(|(&(index, mask), &mass)| {
                mass * self.trellis.pair(locus, index).backward_likelihood
                    * f64::from(mask.count_ones())
            })
            .sum::<f64>()
            / self.likelihood
    }
}

impl HaploBuilder {
    fn forward_tree(&self) -> Result<PatternTree> {
        self.compiled()?;
        let mut tree = PatternTree::new(Orientation::Forward, self.data.genotype_len());
        for pattern in self.library.iter() {
            tree.add_pattern(pattern)?;
        }
        Ok(tree)
    }

    /// E-step for one genotype.
    fn accumulate(
        &self,
        tree: &PatternTree,
        genotype: &Genotype,
        trellis: &mut Trellis,
        acc: &mut EmAccumulator,
    ) -> Result<()> {
        let resolution = self.resolve_with(genotype, trellis)?;
        let likelihood = resolution.genotype.likelihood;
        if !resolution.is_resolved() || likelihood <= 0.0 {
            log::warn!(
                "Genotype {} has zero likelihood under the library, skipping",
                genotype.id
            );
            acc.skipped += 1;
            return Ok(());
        }
        trellis.calc_backward_likelihood(self.head_len);
        acc.resolved += 1;
        acc.log_likelihood += likelihood.ln();

        let mut walker = MassWalker {
            library: &self.library,
            trellis: &*trellis,
            head_len: self.head_len,
            likelihood,
            acc,
        };
        for start in 0..self.data.genotype_len() {
            walker.walk_from(tree.root(start), start);
        }
        Ok(())
    }

    /// M-step: re-estimates frequencies and transition probabilities in place.
    fn apply(&mut self, acc: EmAccumulator, min_freq: f64) -> f64 {
        if acc.resolved == 0 {
            log::warn!("No genotype has a positive likelihood, library left unchanged");
            return f64::NEG_INFINITY;
        }
        let haplotype_num = (2 * acc.resolved) as f64;
        for pattern in self.library.iter_mut() {
            let freq = acc.frequency[pattern.id];
            let incoming = acc.incoming[pattern.id];
            pattern.transition_prob = if incoming > 0.0 { freq / incoming } else { 0.0 };
            pattern.frequency = freq / haplotype_num;
        }
        let rare = self
            .library
            .iter()
            .filter(|p| p.frequency < min_freq)
            .count();
        log::debug!(
            "EM step: log-likelihood {:.6} over {} resolved genotypes, {} skipped, {} patterns below {}",
            acc.log_likelihood,
            acc.resolved,
            acc.skipped,
            rare,
            min_freq
        );
        acc.log_likelihood
    }

    /// One EM iteration over the cohort. Returns the summed log-likelihood of
    /// the genotypes that resolved under the parameters before the update;
    /// unresolved genotypes are skipped, and `-inf` means none resolved.
    pub fn adjust(&mut self, min_freq: f64) -> Result<f64> {
        let tree = self.forward_tree()?;
        let mut acc = EmAccumulator::new(self.library.len());
        let mut trellis = std::mem::take(&mut self.trellis);
        let outcome = self
            .data
            .genotypes()
            .iter()
            .try_for_each(|g| self.accumulate(&tree, g, &mut trellis, &mut acc));
        self.trellis = trellis;
        outcome?;
        Ok(self.apply(acc, min_freq))
    }

    /// `adjust` with the E-step spread over a pool of `threads` workers.
    pub fn adjust_parallel(&mut self, min_freq: f64, threads: usize) -> Result<f64> {
        let tree = self.forward_tree()?;
        let pattern_num = self.library.len();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("haplobuilder-em-{}", i))
            .build()
            .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;
        let builder = &*self;
        let acc = pool.install(|| {
            builder
                .data
                .genotypes()
                .par_iter()
                .try_fold(
                    || (Trellis::new(), EmAccumulator::new(pattern_num)),
                    |(mut trellis, mut acc), g| -> Result<(Trellis, EmAccumulator)> {
                        builder.accumulate(&tree, g, &mut trellis, &mut acc)?;
                        Ok((trellis, acc))
                    },
                )
                .map(|state| state.map(|(_, acc)| acc))
                .try_reduce(|| EmAccumulator::new(pattern_num), |a, b| Ok(a.merge(b)))
        })?;
        Ok(self.apply(acc, min_freq))
    }
}
