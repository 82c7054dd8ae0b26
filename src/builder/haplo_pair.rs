use crate::genotype::Allele;
use crate::pattern::PatternId;

/// An edge between pairs at adjacent loci.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairLink {
    /// Index of the linked pair in the neighbouring frontier.
    pub target: usize,
    /// Side a of the earlier pair continues as side b of the later pair.
    pub swapped: bool,
    /// Alleles appended to sides a and b of the later pair.
    pub alleles: (Allele, Allele),
    pub weight: f64,
}

/// One state of the paired dynamic program: two pattern chains ending at `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct HaploPair {
    pub pattern_a: PatternId,
    pub pattern_b: PatternId,
    pub end: usize,
    pub forward_likelihood: f64,
    pub best_likelihood: f64,
    pub backward_likelihood: f64,
    pub backward_links: Vec<PairLink>,
    pub forward_links: Vec<PairLink>,
    /// Backward link carrying the most likely single path into this pair.
    pub best_link: Option<usize>,
    /// Best mass among paths whose two sides spell the same haplotype so far.
    pub homozygous_likelihood: f64,
    pub homozygous_link: Option<usize>,
    /// The best path leaves the predecessor along its homozygous path.
    pub best_from_homozygous: bool,
}

impl HaploPair {
    /// Orders two pattern ids; the flag tells whether they were exchanged.
    pub fn normalize(a: PatternId, b: PatternId) -> (PatternId, PatternId, bool) {
        if a <= b {
            (a, b, false)
        } else {
            (b, a, true)
        }
    }

    pub fn new(pattern_a: PatternId, pattern_b: PatternId, end: usize) -> Self {
        debug_assert!(pattern_a <= pattern_b);
        HaploPair {
            pattern_a,
            pattern_b,
            end,
            forward_likelihood: 0.0,
            best_likelihood: 0.0,
            backward_likelihood: 0.0,
            backward_links: Vec::new(),
            forward_links: Vec::new(),
            best_link: None,
            homozygous_likelihood: 0.0,
            homozygous_link: None,
            best_from_homozygous: false,
        }
    }

    pub fn ids(&self) -> (PatternId, PatternId) {
        (self.pattern_a, self.pattern_b)
    }

    pub fn is_head(&self) -> bool {
        self.backward_links.is_empty()
    }

    /// Adds the contribution of one head assignment.
    pub fn add_head(&mut self, likelihood: f64) {
        self.forward_likelihood += likelihood;
        self.best_likelihood = self.forward_likelihood;
        if self.pattern_a == self.pattern_b {
            self.homozygous_likelihood = self.forward_likelihood;
        }
    }

    /// Records an incoming edge and accumulates the predecessor's mass.
    ///
    /// `best_likelihood` is the mass of the most likely unordered diplotype.
    /// A diplotype whose sides first differ on this edge is reached along two
    /// mirrored ordered paths, so its mass is twice the homozygous prefix.
    pub fn add(
        &mut self,
        link: PairLink,
        prev_forward: f64,
        prev_best: f64,
        prev_homozygous: f64,
    ) {
        self.forward_likelihood += prev_forward * link.weight;
        let index = self.backward_links.len();
        self.offer_best(prev_best * link.weight, index, false);
        if prev_homozygous > 0.0 {
            let candidate = prev_homozygous * link.weight;
            if link.alleles.0 != link.alleles.1 {
                self.offer_best(2.0 * candidate, index, true);
            } else if self.homozygous_link.is_none() || candidate > self.homozygous_likelihood {
                self.homozygous_likelihood = candidate;
                self.homozygous_link = Some(index);
            }
        }
        self.backward_links.push(link);
    }

    fn offer_best(&mut self, candidate: f64, index: usize, from_homozygous: bool) {
        if self.best_link.is_none() || candidate > self.best_likelihood {
            self.best_likelihood = candidate;
            self.best_link = Some(index);
            self.best_from_homozygous = from_homozygous;
        }
    }

    pub fn calc_backward_likelihood(&mut self, next: &[HaploPair]) {
        self.backward_likelihood = self
            .forward_links
            .iter()
            .map(|link| link.weight * next[link.target].backward_likelihood)
            .sum();
    }
}
