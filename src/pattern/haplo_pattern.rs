use crate::genotype::{Allele, AlleleSequence, Genotype, Haplotype};

pub type PatternId = usize;

/// A trained allele subsequence covering loci `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HaploPattern {
    pub start: usize,
    pub alleles: AlleleSequence,
    pub frequency: f64,
    pub transition_prob: f64,
    pub id: PatternId,
    /// Longest continuation per catalogue allele at `end`, filled in by the builder.
    pub successors: Vec<Option<PatternId>>,
}

impl HaploPattern {
    pub fn new(start: usize, alleles: AlleleSequence, frequency: f64, transition_prob: f64) -> Self {
        HaploPattern {
            start,
            alleles,
            frequency,
            transition_prob,
            id: 0,
            successors: Vec::new(),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.alleles.len()
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn allele_at(&self, locus: usize) -> Allele {
        self.alleles[locus - self.start]
    }

    pub fn last_allele(&self) -> Allele {
        self.alleles.last().unwrap_or(Allele::MISSING)
    }

    pub fn successor(&self, allele_index: usize) -> Option<PatternId> {
        self.successors.get(allele_index).copied().flatten()
    }

    /// Every covered locus is compatible with one of the genotype's alleles.
    pub fn is_match_genotype(&self, genotype: &Genotype) -> bool {
        self.end() <= genotype.len()
            && self
                .alleles
                .iter()
                .enumerate()
                .all(|(offset, allele)| genotype.is_match_allele(*allele, self.start + offset))
    }

    pub fn is_match_haplotype(&self, haplotype: &Haplotype) -> bool {
        haplotype
            .alleles
            .is_match_range(&self.alleles, self.start, 0, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(start: usize, alleles: &str) -> HaploPattern {
        HaploPattern::new(start, alleles.parse().unwrap(), 0.5, 0.5)
    }

    #[test]
    fn coordinates() {
        let p = pattern(2, "Bc");
        assert_eq!(p.end(), 4);
        assert_eq!(p.allele_at(3), Allele(b'c'));
        assert_eq!(p.last_allele(), Allele(b'c'));
        assert_eq!(p.successor(0), None);
    }

    #[test]
    fn genotype_match_allows_either_haplotype() {
        let g = Genotype::from_strs("g", "AB.", "abc").unwrap();
        assert!(pattern(0, "aB").is_match_genotype(&g));
        assert!(pattern(1, "bX").is_match_genotype(&g));
        assert!(!pattern(0, "x").is_match_genotype(&g));
        assert!(!pattern(2, "cc").is_match_genotype(&g));
    }

    #[test]
    fn haplotype_match_is_exact() {
        let h = Haplotype::new("h", "AbC".parse().unwrap());
        assert!(pattern(1, "bC").is_match_haplotype(&h));
        assert!(!pattern(1, "BC").is_match_haplotype(&h));
    }
}
