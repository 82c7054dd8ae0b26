use super::{Allele, AlleleSequence, Haplotype};
use crate::utils::Result;
use arrayvec::ArrayVec;
use rand::Rng;

/// An unordered pair of equal-length haplotypes observed for one individual.
#[derive(Debug, Clone, PartialEq)]
pub struct Genotype {
    pub id: String,
    pub haplotypes: [Haplotype; 2],
    pub likelihood: f64,
    pub weight: f64,
    pub is_phased: bool,
    length: usize,
    heterozygous_num: usize,
    missing_num: usize,
    missing_allele_num: usize,
}

impl Genotype {
    pub fn new(id: &str, h0: Haplotype, h1: Haplotype) -> Result<Self> {
        if h0.len() != h1.len() {
            return Err(format!(
                "Genotype {}: haplotype lengths differ ({} vs {})",
                id,
                h0.len(),
                h1.len()
            ));
        }
        let mut genotype = Genotype {
            id: id.to_string(),
            length: h0.len(),
            haplotypes: [h0, h1],
            likelihood: 0.0,
            weight: 1.0,
            is_phased: false,
            heterozygous_num: 0,
            missing_num: 0,
            missing_allele_num: 0,
        };
        genotype.check_genotype();
        Ok(genotype)
    }

    pub fn from_strs(id: &str, h0: &str, h1: &str) -> Result<Self> {
        let a0: AlleleSequence = h0.parse()?;
        let a1: AlleleSequence = h1.parse()?;
        Genotype::new(id, Haplotype::new(id, a0), Haplotype::new(id, a1))
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn heterozygous_num(&self) -> usize {
        self.heterozygous_num
    }

    pub fn missing_num(&self) -> usize {
        self.missing_num
    }

    pub fn missing_allele_num(&self) -> usize {
        self.missing_allele_num
    }

    pub fn allele(&self, haplotype: usize, locus: usize) -> Allele {
        self.haplotypes[haplotype][locus]
    }

    /// Refreshes the cached heterozygosity and missingness counts.
    pub fn check_genotype(&mut self) {
        self.heterozygous_num = (0..self.length)
            .filter(|&l| self.is_heterozygous(l))
            .count();
        self.missing_num = (0..self.length).filter(|&l| self.is_missing(l)).count();
        self.missing_allele_num =
            self.haplotypes[0].alleles.missing_num() + self.haplotypes[1].alleles.missing_num();
    }

    pub fn is_missing(&self, locus: usize) -> bool {
        self.haplotypes[0].is_missing(locus) && self.haplotypes[1].is_missing(locus)
    }

    pub fn has_missing(&self, locus: usize) -> bool {
        self.haplotypes[0].is_missing(locus) || self.haplotypes[1].is_missing(locus)
    }

    pub fn has_allele(&self, locus: usize, allele: Allele) -> bool {
        self.haplotypes[0][locus] == allele || self.haplotypes[1][locus] == allele
    }

    pub fn is_heterozygous(&self, locus: usize) -> bool {
        !self.has_missing(locus) && self.haplotypes[0][locus] != self.haplotypes[1][locus]
    }

    pub fn heterozygous_num_in(&self, start: usize, len: usize) -> usize {
        (start..(start + len).min(self.length))
            .filter(|&l| self.is_heterozygous(l))
            .count()
    }

    /// Non-missing alleles at `locus`, smallest symbol first.
    pub fn observed_alleles(&self, locus: usize) -> ArrayVec<Allele, 2> {
        let mut observed: ArrayVec<Allele, 2> = self
            .haplotypes
            .iter()
            .map(|h| h[locus])
            .filter(|a| !a.is_missing())
            .collect();
        observed.sort();
        observed
    }

    pub fn is_match_allele(&self, allele: Allele, locus: usize) -> bool {
        self.haplotypes[0].is_match(allele, locus) || self.haplotypes[1].is_match(allele, locus)
    }

    pub fn is_match(&self, other: &Genotype) -> bool {
        self.haplotypes[0].alleles == other.haplotypes[0].alleles
            && self.haplotypes[1].alleles == other.haplotypes[1].alleles
    }

    pub fn is_match_unphased(&self, other: &Genotype) -> bool {
        self.is_match(other)
            || (self.haplotypes[0].alleles == other.haplotypes[1].alleles
                && self.haplotypes[1].alleles == other.haplotypes[0].alleles)
    }

    pub fn is_match_ignore_missing(&self, other: &Genotype) -> bool {
        self.diff_num_ignore_missing(other) == 0 && self.switch_distance(other) == 0
    }

    /// Number of loci whose unordered allele pairs differ.
    pub fn diff_num(&self, other: &Genotype) -> usize {
        (0..self.length.min(other.length))
            .filter(|&l| self.unordered_at(l) != other.unordered_at(l))
            .count()
    }

    pub fn diff_num_ignore_missing(&self, other: &Genotype) -> usize {
        (0..self.length.min(other.length))
            .filter(|&l| !self.has_missing(l) && !other.has_missing(l))
            .filter(|&l| self.unordered_at(l) != other.unordered_at(l))
            .count()
    }

    /// Phase flips between consecutive loci that are heterozygous in both
    /// genotypes with the same allele pair.
    pub fn switch_distance(&self, other: &Genotype) -> usize {
        let mut last_orientation = None;
        let mut switches = 0;
        for locus in 0..self.length.min(other.length) {
            if !self.is_heterozygous(locus)
                || !other.is_heterozygous(locus)
                || self.unordered_at(locus) != other.unordered_at(locus)
            {
                continue;
            }
            let orientation = self.allele(0, locus) == other.allele(0, locus);
            if let Some(last) = last_orientation {
                if last != orientation {
                    switches += 1;
                }
            }
            last_orientation = Some(orientation);
        }
        switches
    }

    /// Swaps the two alleles at every locus with probability one half.
    pub fn randomize_phase<R: Rng>(&mut self, rng: &mut R) {
        for locus in 0..self.length {
            if rng.random_bool(0.5) {
                let a0 = self.haplotypes[0][locus];
                let a1 = self.haplotypes[1][locus];
                self.haplotypes[0].alleles.set(locus, a1);
                self.haplotypes[1].alleles.set(locus, a0);
            }
        }
        self.is_phased = false;
    }

    /// Same genotype with the two haplotypes exchanged.
    pub fn swapped(&self) -> Genotype {
        let mut swapped = self.clone();
        swapped.haplotypes.swap(0, 1);
        swapped
    }

    fn unordered_at(&self, locus: usize) -> (Allele, Allele) {
        let a0 = self.haplotypes[0][locus];
        let a1 = self.haplotypes[1][locus];
        if a0 <= a1 {
            (a0, a1)
        } else {
            (a1, a0)
        }
    }
}
