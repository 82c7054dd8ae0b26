use super::{HaploPair, PairLink};
use crate::genotype::Allele;
use crate::pattern::PatternId;
use std::collections::BTreeMap;

/// Locus-indexed arena of pair states for one resolution; reused across genotypes.
#[derive(Debug, Clone, Default)]
pub struct Trellis {
    frontiers: Vec<Vec<HaploPair>>,
    index: Vec<BTreeMap<(PatternId, PatternId), usize>>,
}

impl Trellis {
    pub fn new() -> Self {
        Trellis::default()
    }

    /// Empties every frontier, keeping allocations, and sizes the arena for `len` loci.
    pub fn reset(&mut self, len: usize) {
        self.frontiers.resize_with(len + 1, Vec::new);
        self.index.resize_with(len + 1, BTreeMap::new);
        self.frontiers.iter_mut().for_each(Vec::clear);
        self.index.iter_mut().for_each(BTreeMap::clear);
    }

    /// Number of loci the arena currently covers.
    pub fn len(&self) -> usize {
        self.frontiers.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.frontiers.iter().all(Vec::is_empty)
    }

    pub fn frontier(&self, locus: usize) -> &[HaploPair] {
        &self.frontiers[locus]
    }

    pub fn pair(&self, locus: usize, index: usize) -> &HaploPair {
        &self.frontiers[locus][index]
    }

    pub fn total_likelihood(&self, locus: usize) -> f64 {
        self.frontiers[locus]
            .iter()
            .map(|pair| pair.forward_likelihood)
            .sum()
    }

    fn find_or_insert(&mut self, locus: usize, a: PatternId, b: PatternId) -> usize {
        let frontier = &mut self.frontiers[locus];
        *self.index[locus].entry((a, b)).or_insert_with(|| {
            frontier.push(HaploPair::new(a, b, locus));
            frontier.len() - 1
        })
    }

    /// Seeds a head pair, merging repeated assignments of the same unordered pair.
    pub fn seed(&mut self, locus: usize, a: PatternId, b: PatternId, likelihood: f64) {
        let (a, b, _) = HaploPair::normalize(a, b);
        let target = self.find_or_insert(locus, a, b);
        self.frontiers[locus][target].add_head(likelihood);
    }

    /// Extends pair `prev` at `locus` with successor patterns `next_a`/`next_b`
    /// that appended `alleles` to its sides a and b.
    pub fn link(
        &mut self,
        locus: usize,
        prev: usize,
        next_a: PatternId,
        next_b: PatternId,
        alleles: (Allele, Allele),
        weight: f64,
    ) {
        let (a, b, swapped) = HaploPair::normalize(next_a, next_b);
        let alleles = if swapped {
            (alleles.1, alleles.0)
        } else {
            alleles
        };
        let target = self.find_or_insert(locus + 1, a, b);
        let (current, next) = self.frontiers.split_at_mut(locus + 1);
        let prev_pair = &mut current[locus][prev];
        next[0][target].add(
            PairLink {
                target: prev,
                swapped,
                alleles,
                weight,
            },
            prev_pair.forward_likelihood,
            prev_pair.best_likelihood,
            prev_pair.homozygous_likelihood,
        );
        prev_pair.forward_links.push(PairLink {
            target,
            swapped,
            alleles,
            weight,
        });
    }

    /// Backward pass from the final locus down to `head_len`.
    pub fn calc_backward_likelihood(&mut self, head_len: usize) {
        let len = self.len();
        for pair in self.frontiers[len].iter_mut() {
            pair.backward_likelihood = 1.0;
        }
        for locus in (head_len..len).rev() {
            let (current, next) = self.frontiers.split_at_mut(locus + 1);
            let next = &next[0];
            for pair in current[locus].iter_mut() {
                pair.calc_backward_likelihood(next);
            }
        }
    }
}
