use super::Trellis;
use crate::genotype::{Allele, AlleleSequence, Genotype, HaploData, Haplotype};
use crate::pattern::{Orientation, PatternId, PatternLibrary, PatternTree};
use crate::utils::{log_sum, Diagnostics, Result};
use itertools::Itertools;
use std::cmp::Ordering;

/// A surviving pair state at the final locus.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    /// Position of the pair in the final frontier.
    pub index: usize,
    pub pattern_a: PatternId,
    pub pattern_b: PatternId,
    pub forward_likelihood: f64,
    pub best_likelihood: f64,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub genotype: Genotype,
    /// Final-locus pair states, most likely first.
    pub alternatives: Vec<Alternative>,
}

impl Resolution {
    fn unresolved(genotype: &Genotype) -> Self {
        let mut genotype = genotype.clone();
        genotype.likelihood = 0.0;
        genotype.weight = 0.0;
        Resolution {
            genotype,
            alternatives: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

fn compare_alternatives(a: &Alternative, b: &Alternative) -> Ordering {
    b.best_likelihood
        .total_cmp(&a.best_likelihood)
        .then_with(|| b.forward_likelihood.total_cmp(&a.forward_likelihood))
        .then_with(|| (a.pattern_a, a.pattern_b).cmp(&(b.pattern_a, b.pattern_b)))
}

/// Resolves genotypes into diplotypes with a compiled pattern library.
pub struct HaploBuilder {
    pub(super) library: PatternLibrary,
    pub(super) data: HaploData,
    tree: Option<PatternTree>,
    heads: Vec<PatternId>,
    pub(super) head_len: usize,
    pub(super) trellis: Trellis,
    pub(super) diagnostics: Diagnostics,
}

impl HaploBuilder {
    pub fn new(library: PatternLibrary, data: HaploData) -> Self {
        HaploBuilder {
            library,
            data,
            tree: None,
            heads: Vec::new(),
            head_len: 0,
            trellis: Trellis::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn into_library(self) -> PatternLibrary {
        self.library
    }

    pub fn data(&self) -> &HaploData {
        &self.data
    }

    pub fn genotype_len(&self) -> usize {
        self.data.genotype_len()
    }

    pub fn head_len(&self) -> usize {
        self.head_len
    }

    pub fn heads(&self) -> &[PatternId] {
        &self.heads
    }

    /// DP state left behind by the most recent `resolve`.
    pub fn trellis(&self) -> &Trellis {
        &self.trellis
    }

    pub fn is_initialized(&self) -> bool {
        self.tree.is_some()
    }

    /// Builds the backward tree, the head set and every successor table.
    pub fn initialize(&mut self) -> Result<()> {
        let diagnostics = self.diagnostics.clone();
        diagnostics.timed("Compiling pattern library", || self.compile())
    }

    fn compile(&mut self) -> Result<()> {
        let len = self.data.genotype_len();
        self.tree = None;
        if self.library.is_empty() {
            return Err(self.diagnostics.fatal("Pattern library is empty".to_string()));
        }
        self.library.assign_ids();

        let mut tree = PatternTree::new(Orientation::Backward, len);
        let mut inserted = vec![false; self.library.len()];
        for pattern in self.library.iter() {
            inserted[pattern.id] = tree
                .add_pattern(pattern)
                .map_err(|e| self.diagnostics.fatal(e))?;
        }

        let head_len = self.library.head_len().ok_or_else(|| {
            self.diagnostics
                .fatal("Pattern library has no pattern starting at locus 0".to_string())
        })?;
        let heads = self
            .library
            .head_ids()
            .into_iter()
            .filter(|&id| inserted[id])
            .collect_vec();

        let successors = self
            .library
            .iter()
            .map(|pattern| {
                let end = pattern.end();
                if end >= len {
                    return Vec::new();
                }
                (0..self.data.allele_num(end))
                    .map(|j| {
                        let extended = pattern.alleles.appended(self.data.allele_symbol(end, j));
                        tree.find_longest_match(
                            end + 1,
                            extended.as_slice(),
                            pattern.start,
                            pattern.start,
                        )
                    })
                    .collect_vec()
            })
            .collect_vec();
        for (pattern, successors) in self.library.iter_mut().zip(successors) {
            pattern.successors = successors;
        }

        if head_len < len {
            // heads without mass never carry a path past head_len
            for &head in heads.iter().filter(|&&id| self.library[id].frequency > 0.0) {
                let pattern = &self.library[head];
                if let Some(j) = self
                    .data
                    .frequent_alleles(head_len)
                    .find(|&j| pattern.successor(j).is_none())
                {
                    return Err(self.diagnostics.fatal(format!(
                        "Head pattern {} ({}) has no successor for allele {} at locus {}",
                        head,
                        pattern.alleles,
                        self.data.allele_symbol(head_len, j),
                        head_len
                    )));
                }
            }
        }

        log::info!(
            "Compiled {} patterns over {} loci: {} head patterns of length {}",
            self.library.len(),
            len,
            heads.len(),
            head_len
        );
        self.tree = Some(tree);
        self.heads = heads;
        self.head_len = head_len;
        self.trellis.reset(len);
        Ok(())
    }

    pub(super) fn compiled(&self) -> Result<&PatternTree> {
        self.tree.as_ref().ok_or_else(|| {
            self.diagnostics
                .fatal("Pattern library has not been initialized".to_string())
        })
    }

    /// Drops non-head patterns below `min_freq` and recompiles the library.
    pub fn prune(&mut self, min_freq: f64) -> Result<usize> {
        let removed = self.library.prune(min_freq);
        if removed > 0 {
            log::debug!("Pruned {} patterns below frequency {}", removed, min_freq);
            self.initialize()?;
        }
        Ok(removed)
    }

    /// Most likely diplotype for `genotype`, using the builder's own arena.
    pub fn resolve(&mut self, genotype: &Genotype) -> Result<Resolution> {
        let mut trellis = std::mem::take(&mut self.trellis);
        let resolution = self.resolve_with(genotype, &mut trellis);
        self.trellis = trellis;
        resolution
    }

    /// Same as `resolve` with a caller-owned arena, so workers can share the builder.
    pub fn resolve_with(&self, genotype: &Genotype, trellis: &mut Trellis) -> Result<Resolution> {
        let tree = self.compiled()?;
        let len = self.data.genotype_len();
        if genotype.len() != len {
            return Err(format!(
                "Genotype {} has length {}, expected {}",
                genotype.id,
                genotype.len(),
                len
            ));
        }

        trellis.reset(len);
        self.init_head_list(tree, genotype, trellis)?;
        for locus in self.head_len..len {
            self.extend_all(genotype, locus, trellis);
            if trellis.frontier(locus + 1).is_empty() {
                log::trace!(
                    "Genotype {}: no pattern pair reaches locus {}",
                    genotype.id,
                    locus + 1
                );
                break;
            }
        }

        let total = trellis.total_likelihood(len);
        if trellis.frontier(len).is_empty() || total <= 0.0 {
            return Ok(Resolution::unresolved(genotype));
        }

        let mut alternatives = trellis
            .frontier(len)
            .iter()
            .enumerate()
            .map(|(index, pair)| Alternative {
                index,
                pattern_a: pair.pattern_a,
                pattern_b: pair.pattern_b,
                forward_likelihood: pair.forward_likelihood,
                best_likelihood: pair.best_likelihood,
            })
            .collect_vec();
        alternatives.sort_by(compare_alternatives);

        let mut resolved = self.candidate_genotype(genotype, trellis, &alternatives[0])?;
        resolved.likelihood = total;
        Ok(Resolution {
            genotype: resolved,
            alternatives,
        })
    }

    fn init_head_list(
        &self,
        tree: &PatternTree,
        genotype: &Genotype,
        trellis: &mut Trellis,
    ) -> Result<()> {
        let head_len = self.head_len;
        for &head in &self.heads {
            let pattern = &self.library[head];
            if !pattern.is_match_genotype(genotype) {
                continue;
            }
            let assignments = (0..head_len)
                .map(|locus| {
                    self.head_complements(genotype, locus, pattern.allele_at(locus))
                        .into_iter()
                })
                .multi_cartesian_product();
            for complement in assignments {
                match tree.find_longest_match(head_len, &complement, 0, 0) {
                    Some(id) if self.library[id].start == 0 => {
                        let likelihood = pattern.frequency * self.library[id].frequency;
                        trellis.seed(head_len, head, id, likelihood);
                    }
                    _ => {
                        return Err(self.diagnostics.fatal(format!(
                            "Cannot find a head pattern matching {} for genotype {}",
                            AlleleSequence::new(complement),
                            genotype.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Alleles the other haplotype may carry at a head locus where one
    /// haplotype carries `own`.
    fn head_complements(&self, genotype: &Genotype, locus: usize, own: Allele) -> Vec<Allele> {
        let observed = genotype.observed_alleles(locus);
        match observed.as_slice() {
            [] => self.frequent_symbols(locus),
            [seen] if *seen == own => self.frequent_symbols(locus),
            [seen] => vec![*seen],
            [first, second] if *first == own => vec![*second],
            [first, _] => vec![*first],
            _ => Vec::new(),
        }
    }

    fn frequent_symbols(&self, locus: usize) -> Vec<Allele> {
        self.data
            .frequent_alleles(locus)
            .map(|j| self.data.allele_symbol(locus, j))
            .collect()
    }

    /// Unordered catalogue-index pairs compatible with the observation at `locus`.
    fn allele_choices(&self, genotype: &Genotype, locus: usize) -> Vec<(usize, usize)> {
        let index = |allele: Allele| self.data.allele_index(locus, allele);
        let observed = genotype.observed_alleles(locus);
        match observed.as_slice() {
            [] => {
                let frequent = self.data.frequent_alleles(locus).collect_vec();
                frequent
                    .iter()
                    .enumerate()
                    .flat_map(|(n, &j)| frequent[n..].iter().map(move |&k| (j, k)))
                    .collect()
            }
            [seen] => match index(*seen) {
                Some(o) => self
                    .data
                    .frequent_alleles(locus)
                    .map(|j| (j.min(o), j.max(o)))
                    .collect(),
                None => Vec::new(),
            },
            [first, second] => match (index(*first), index(*second)) {
                (Some(j), Some(k)) => vec![(j.min(k), j.max(k))],
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn extend_all(&self, genotype: &Genotype, locus: usize, trellis: &mut Trellis) {
        let frontier_len = trellis.frontier(locus).len();
        for (j, k) in self.allele_choices(genotype, locus) {
            for prev in 0..frontier_len {
                self.extend(trellis, locus, prev, j, k);
                if j != k {
                    self.extend(trellis, locus, prev, k, j);
                }
            }
        }
    }

    fn extend(&self, trellis: &mut Trellis, locus: usize, prev: usize, j: usize, k: usize) {
        let pair = trellis.pair(locus, prev);
        let successor_a = self.library[pair.pattern_a].successor(j);
        let successor_b = self.library[pair.pattern_b].successor(k);
        if let (Some(a), Some(b)) = (successor_a, successor_b) {
            let weight = self.library[a].transition_prob * self.library[b].transition_prob;
            let alleles = (
                self.data.allele_symbol(locus, j),
                self.data.allele_symbol(locus, k),
            );
            trellis.link(locus, prev, a, b, alleles, weight);
        }
    }

    /// Haplotype pair along the most likely path into a final-locus pair of `trellis`.
    pub fn candidate_genotype(
        &self,
        genotype: &Genotype,
        trellis: &Trellis,
        alternative: &Alternative,
    ) -> Result<Genotype> {
        let len = self.data.genotype_len();
        let mut haplotypes = [AlleleSequence::missing(len), AlleleSequence::missing(len)];
        let mut pair = trellis.pair(len, alternative.index);
        // side a of `pair` is written to haplotype 1 when flipped
        let mut flipped = false;
        let mut homozygous = false;
        while pair.end > self.head_len {
            let index = if homozygous {
                pair.homozygous_link
            } else {
                homozygous = pair.best_from_homozygous;
                pair.best_link
            };
            let link = index
                .map(|i| &pair.backward_links[i])
                .ok_or_else(|| format!("Pair at locus {} has no incoming path", pair.end))?;
            haplotypes[usize::from(flipped)].set(pair.end - 1, link.alleles.0);
            haplotypes[usize::from(!flipped)].set(pair.end - 1, link.alleles.1);
            if link.swapped {
                flipped = !flipped;
            }
            pair = trellis.pair(pair.end - 1, link.target);
        }
        for locus in 0..self.head_len {
            haplotypes[usize::from(flipped)].set(locus, self.library[pair.pattern_a].allele_at(locus));
            haplotypes[usize::from(!flipped)].set(locus, self.library[pair.pattern_b].allele_at(locus));
        }

        let [h0, h1] = haplotypes;
        let mut resolved = Genotype::new(
            &genotype.id,
            Haplotype::new(&genotype.haplotypes[0].id, h0),
            Haplotype::new(&genotype.haplotypes[1].id, h1),
        )?;
        resolved.is_phased = true;
        resolved.likelihood = alternative.forward_likelihood;
        let total = trellis.total_likelihood(len);
        resolved.weight = if total > 0.0 {
            alternative.best_likelihood / total
        } else {
            0.0
        };
        Ok(resolved)
    }

    /// Diplotype of an alternative returned by the latest `resolve`.
    pub fn alternative_genotype(
        &self,
        genotype: &Genotype,
        alternative: &Alternative,
    ) -> Result<Genotype> {
        self.candidate_genotype(genotype, &self.trellis, alternative)
    }

    /// Product of matched-pattern probabilities along the haplotype; 0 when a locus has no match.
    pub fn get_likelihood_haplotype(&self, haplotype: &Haplotype) -> Result<f64> {
        let tree = self.compiled()?;
        let len = self.data.genotype_len();
        if haplotype.len() != len {
            return Err(format!(
                "Haplotype {} has length {}, expected {}",
                haplotype.id,
                haplotype.len(),
                len
            ));
        }
        let mut likelihood = 1.0;
        for end in self.head_len..=len {
            let Some(id) = tree.find_longest_match(end, haplotype.alleles.as_slice(), 0, 0) else {
                return Ok(0.0);
            };
            let pattern = &self.library[id];
            likelihood *= if end == self.head_len {
                if pattern.start != 0 {
                    return Ok(0.0);
                }
                pattern.frequency
            } else {
                pattern.transition_prob
            };
        }
        Ok(likelihood)
    }

    pub fn get_likelihood(&self, genotype: &Genotype) -> Result<f64> {
        Ok(self.get_likelihood_haplotype(&genotype.haplotypes[0])?
            * self.get_likelihood_haplotype(&genotype.haplotypes[1])?)
    }

    /// Backward pass over the arena of the most recent `resolve`.
    pub fn calc_backward_likelihood(&mut self) {
        self.trellis.calc_backward_likelihood(self.head_len);
    }

    /// Sum of log marginal likelihoods of the cohort under the current library.
    pub fn cohort_log_likelihood(&mut self) -> Result<f64> {
        let mut trellis = std::mem::take(&mut self.trellis);
        let likelihoods: Result<Vec<f64>> = self
            .data
            .genotypes()
            .iter()
            .map(|g| {
                self.resolve_with(g, &mut trellis)
                    .map(|r| r.genotype.likelihood)
            })
            .collect();
        self.trellis = trellis;
        Ok(log_sum(likelihoods?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::AlleleInfo;
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

    fn library() -> PatternLibrary {
        PatternLibrary::from_reader(Cursor::new(LIBRARY)).unwrap()
    }

    fn genotype(h0: &str, h1: &str) -> Genotype {
        Genotype::from_strs("g", h0, h1).unwrap()
    }

    fn builder(genotypes: Vec<Genotype>) -> HaploBuilder {
        let data = HaploData::from_genotypes(genotypes).unwrap();
        let mut builder = HaploBuilder::new(library(), data);
        builder.initialize().unwrap();
        builder
    }

    fn haplotypes(genotype: &Genotype) -> (String, String) {
        (
            genotype.haplotypes[0].alleles.to_string(),
            genotype.haplotypes[1].alleles.to_string(),
        )
    }

    #[test]
    fn initialize_compiles_heads_and_successors() {
        let builder = builder(vec![genotype("AB", "ab")]);
        assert_eq!(builder.head_len(), 1);
        assert_eq!(builder.heads(), &[0, 1]);
        // catalogue at locus 1 is [B, b]
        assert_eq!(builder.library()[0].successors, vec![Some(2), Some(3)]);
        assert_eq!(builder.library()[1].successors, vec![Some(4), Some(5)]);
        assert!(builder.library()[2].successors.is_empty());
    }

    #[test]
    fn resolves_two_equiprobable_phasings() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        let resolution = builder.resolve(&genotype("AB", "ab")).unwrap();
        assert!(resolution.is_resolved());
        assert_eq!(resolution.alternatives.len(), 2);
        assert!((resolution.genotype.likelihood - 0.25).abs() < 1e-12);
        assert!((resolution.genotype.weight - 0.5).abs() < 1e-12);
        assert!(resolution.genotype.is_phased);
        assert_eq!(
            haplotypes(&resolution.genotype),
            ("AB".to_string(), "ab".to_string())
        );

        let alternative = &resolution.alternatives[1];
        assert_eq!((alternative.pattern_a, alternative.pattern_b), (3, 4));
        let other = builder
            .alternative_genotype(&genotype("AB", "ab"), alternative)
            .unwrap();
        assert_eq!(haplotypes(&other), ("Ab".to_string(), "aB".to_string()));
    }

    #[test]
    fn single_explanation_split_after_head_has_full_weight() {
        let mut builder = builder(vec![genotype("AB", "Ab")]);
        let resolution = builder.resolve(&genotype("AB", "Ab")).unwrap();
        assert_eq!(resolution.alternatives.len(), 1);
        assert!((resolution.genotype.likelihood - 0.125).abs() < 1e-12);
        assert!((resolution.genotype.weight - 1.0).abs() < 1e-12);
        assert_eq!(
            haplotypes(&resolution.genotype),
            ("AB".to_string(), "Ab".to_string())
        );
    }

    #[test]
    fn swapped_input_gives_same_resolution() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        let direct = builder.resolve(&genotype("AB", "ab")).unwrap();
        let swapped = builder.resolve(&genotype("ab", "AB")).unwrap();
        assert_eq!(haplotypes(&direct.genotype), haplotypes(&swapped.genotype));
        assert_eq!(direct.alternatives, swapped.alternatives);
        assert_eq!(direct.genotype.likelihood, swapped.genotype.likelihood);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut builder = builder(vec![genotype("AB", "a.")]);
        let first = builder.resolve(&genotype("AB", "a.")).unwrap();
        let second = builder.resolve(&genotype("AB", "a.")).unwrap();
        assert_eq!(first.genotype, second.genotype);
        assert_eq!(first.alternatives, second.alternatives);
    }

    #[test]
    fn missing_allele_is_imputed() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        let resolution = builder.resolve(&genotype("AB", "a.")).unwrap();
        assert_eq!(resolution.alternatives.len(), 3);
        assert!((resolution.genotype.likelihood - 0.375).abs() < 1e-12);
        assert_eq!(resolution.genotype.missing_allele_num(), 0);
        assert_eq!(
            haplotypes(&resolution.genotype),
            ("AB".to_string(), "aB".to_string())
        );
    }

    #[test]
    fn resolve_with_external_trellis_matches_resolve() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        let mut trellis = Trellis::new();
        let external = builder
            .resolve_with(&genotype("AB", "ab"), &mut trellis)
            .unwrap();
        let internal = builder.resolve(&genotype("AB", "ab")).unwrap();
        assert_eq!(external.genotype, internal.genotype);
        assert_eq!(trellis.frontier(2).len(), builder.trellis().frontier(2).len());
    }

    #[test]
    fn haplotype_likelihood_follows_patterns() {
        let builder = builder(vec![genotype("AB", "ab")]);
        let g = genotype("AB", "ab");
        let h = builder.get_likelihood_haplotype(&g.haplotypes[0]).unwrap();
        assert!((h - 0.25).abs() < 1e-12);
        let joint = builder.get_likelihood(&g).unwrap();
        assert!((joint - 0.0625).abs() < 1e-12);
        let unknown = Haplotype::new("h", "Ac".parse().unwrap());
        assert_eq!(builder.get_likelihood_haplotype(&unknown).unwrap(), 0.0);
    }

    #[test]
    fn backward_likelihood_matches_total() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        let resolution = builder.resolve(&genotype("AB", "ab")).unwrap();
        builder.calc_backward_likelihood();
        let head = builder.trellis().pair(1, 0);
        let through_head = head.forward_likelihood * head.backward_likelihood;
        assert!((through_head - resolution.genotype.likelihood).abs() < 1e-12);
    }

    #[test]
    fn zero_frequency_loci_leave_genotype_unresolved() {
        let g = genotype("A.", "a.");
        let info = |symbol: u8, frequency: f64| AlleleInfo {
            symbol: Allele(symbol),
            frequency,
        };
        let alleles = vec![
            vec![info(b'A', 0.5), info(b'a', 0.5)],
            vec![info(b'B', 0.0), info(b'b', 0.0)],
        ];
        let data = HaploData::new(vec![g.clone()], alleles).unwrap();
        let mut builder = HaploBuilder::new(library(), data);
        builder.initialize().unwrap();
        let resolution = builder.resolve(&g).unwrap();
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.genotype.likelihood, 0.0);
        assert_eq!(resolution.genotype.weight, 0.0);
        assert_eq!(haplotypes(&resolution.genotype), haplotypes(&g));
    }

    #[test]
    fn empty_library_is_fatal() {
        let data = HaploData::from_genotypes(vec![genotype("AB", "ab")]).unwrap();
        let mut builder = HaploBuilder::new(PatternLibrary::default(), data);
        assert!(builder.initialize().is_err());
        assert!(!builder.is_initialized());
    }

    #[test]
    fn library_without_locus_zero_is_fatal() {
        let data = HaploData::from_genotypes(vec![genotype("AB", "ab")]).unwrap();
        let patterns = vec![HaploPattern::new(1, "B".parse().unwrap(), 0.5, 0.5)];
        let mut builder = HaploBuilder::new(PatternLibrary::new(patterns), data);
        assert!(builder.initialize().is_err());
    }

    #[test]
    fn head_without_successor_is_fatal() {
        let data = HaploData::from_genotypes(vec![genotype("AB", "ab")]).unwrap();
        let patterns = vec![
            HaploPattern::new(0, "A".parse().unwrap(), 1.0, 1.0),
            HaploPattern::new(0, "AB".parse().unwrap(), 1.0, 1.0),
        ];
        let mut builder = HaploBuilder::new(PatternLibrary::new(patterns), data);
        assert!(builder.initialize().is_err());
    }

    #[test]
    fn resolve_before_initialize_fails() {
        let data = HaploData::from_genotypes(vec![genotype("AB", "ab")]).unwrap();
        let mut builder = HaploBuilder::new(library(), data);
        assert!(builder.resolve(&genotype("AB", "ab")).is_err());
        assert!(builder.get_likelihood(&genotype("AB", "ab")).is_err());
    }

    #[test]
    fn alternatives_carry_their_own_weight() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        let g = genotype("AB", "ab");
        let resolution = builder.resolve(&g).unwrap();
        let other = builder
            .alternative_genotype(&g, &resolution.alternatives[1])
            .unwrap();
        assert!((other.weight - 0.5).abs() < 1e-12);
        assert!((other.likelihood - 0.125).abs() < 1e-12);
    }

    #[test]
    fn prune_recompiles_library() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        assert_eq!(builder.prune(0.1).unwrap(), 0);
        assert!(builder.is_initialized());

        // without "Ab" the head "A" has no continuation for b
        builder.library[3].frequency = 0.01;
        assert!(builder.prune(0.1).is_err());
        assert_eq!(builder.library().len(), 5);
    }

    #[test]
    fn wrong_length_genotype_is_rejected() {
        let mut builder = builder(vec![genotype("AB", "ab")]);
        assert!(builder.resolve(&genotype("ABB", "abb")).is_err());
    }
}
