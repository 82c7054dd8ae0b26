use super::{Allele, AlleleSequence};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq)]
pub struct Haplotype {
    pub id: String,
    pub weight: f64,
    pub alleles: AlleleSequence,
}

impl Haplotype {
    pub fn new(id: &str, alleles: AlleleSequence) -> Self {
        Haplotype {
            id: id.to_string(),
            weight: 1.0,
            alleles,
        }
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn is_missing(&self, locus: usize) -> bool {
        self.alleles[locus].is_missing()
    }

    /// A missing allele matches any symbol.
    pub fn is_match(&self, allele: Allele, locus: usize) -> bool {
        let own = self.alleles[locus];
        own.is_missing() || own == allele
    }
}

impl Index<usize> for Haplotype {
    type Output = Allele;

    fn index(&self, locus: usize) -> &Self::Output {
        &self.alleles[locus]
    }
}
