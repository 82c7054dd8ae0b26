use std::{fmt, ops::Index, str::FromStr};

/// A single marker symbol at one locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Allele(pub u8);

impl Allele {
    pub const MISSING: Allele = Allele(b'.');

    pub fn is_missing(&self) -> bool {
        *self == Allele::MISSING
    }
}

impl Default for Allele {
    fn default() -> Self {
        Allele::MISSING
    }
}

impl From<u8> for Allele {
    fn from(symbol: u8) -> Self {
        Allele(symbol)
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AlleleSequence {
    alleles: Vec<Allele>,
}

impl AlleleSequence {
    pub fn new(alleles: Vec<Allele>) -> Self {
        AlleleSequence { alleles }
    }

    pub fn missing(len: usize) -> Self {
        AlleleSequence {
            alleles: vec![Allele::MISSING; len],
        }
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn as_slice(&self) -> &[Allele] {
        &self.alleles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Allele> {
        self.alleles.iter()
    }

    pub fn last(&self) -> Option<Allele> {
        self.alleles.last().copied()
    }

    pub fn set(&mut self, index: usize, allele: Allele) {
        self.alleles[index] = allele;
    }

    /// Returns a copy one allele longer.
    pub fn appended(&self, allele: Allele) -> Self {
        let mut alleles = Vec::with_capacity(self.alleles.len() + 1);
        alleles.extend_from_slice(&self.alleles);
        alleles.push(allele);
        AlleleSequence { alleles }
    }

    /// Compares `len` alleles starting at `start_self` with `other` starting at `start_other`.
    pub fn is_match_range(
        &self,
        other: &AlleleSequence,
        start_self: usize,
        start_other: usize,
        len: usize,
    ) -> bool {
        if start_self + len > self.len() || start_other + len > other.len() {
            return false;
        }
        self.alleles[start_self..start_self + len] == other.alleles[start_other..start_other + len]
    }

    pub fn missing_num(&self) -> usize {
        self.alleles.iter().filter(|a| a.is_missing()).count()
    }
}

impl Index<usize> for AlleleSequence {
    type Output = Allele;

    fn index(&self, index: usize) -> &Self::Output {
        &self.alleles[index]
    }
}

impl FromStr for AlleleSequence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = s.chars().find(|c| !c.is_ascii_graphic()) {
            return Err(format!("Invalid allele symbol {:?} in '{}'", c, s));
        }
        Ok(AlleleSequence {
            alleles: s.bytes().map(Allele).collect(),
        })
    }
}

impl fmt::Display for AlleleSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for allele in &self.alleles {
            write!(f, "{}", allele)?;
        }
        Ok(())
    }
}
