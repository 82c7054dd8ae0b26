use super::{Allele, Genotype};
use crate::utils::{open_table_reader, table_fields, Result};
use itertools::Itertools;
use std::{
    collections::BTreeMap,
    io::BufRead,
    ops::{Index, IndexMut},
    path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlleleInfo {
    pub symbol: Allele,
    pub frequency: f64,
}

/// A genotype cohort together with the allele catalogue of every locus.
#[derive(Debug, Clone)]
pub struct HaploData {
    genotypes: Vec<Genotype>,
    alleles: Vec<Vec<AlleleInfo>>,
    length: usize,
}

impl HaploData {
    pub fn new(genotypes: Vec<Genotype>, alleles: Vec<Vec<AlleleInfo>>) -> Result<Self> {
        if genotypes.is_empty() {
            return Err("Genotype cohort is empty".to_string());
        }
        let length = alleles.len();
        if let Some(g) = genotypes.iter().find(|g| g.len() != length) {
            return Err(format!(
                "Genotype {} has length {}, expected {}",
                g.id,
                g.len(),
                length
            ));
        }
        let mut alleles = alleles;
        for catalogue in alleles.iter_mut() {
            catalogue.sort_by_key(|info| info.symbol);
            if catalogue.iter().map(|info| info.symbol).duplicates().next().is_some() {
                return Err("Duplicate allele symbol in catalogue".to_string());
            }
        }
        Ok(HaploData {
            genotypes,
            alleles,
            length,
        })
    }

    /// Builds the catalogue from observed allele counts.
    pub fn from_genotypes(genotypes: Vec<Genotype>) -> Result<Self> {
        let length = match genotypes.first() {
            Some(g) => g.len(),
            None => return Err("Genotype cohort is empty".to_string()),
        };
        let mut counts: Vec<BTreeMap<Allele, usize>> = vec![BTreeMap::new(); length];
        for genotype in &genotypes {
            if genotype.len() != length {
                return Err(format!(
                    "Genotype {} has length {}, expected {}",
                    genotype.id,
                    genotype.len(),
                    length
                ));
            }
            for haplotype in &genotype.haplotypes {
                for (locus, allele) in haplotype.alleles.iter().enumerate() {
                    if !allele.is_missing() {
                        *counts[locus].entry(*allele).or_insert(0) += 1;
                    }
                }
            }
        }
        let alleles = counts
            .into_iter()
            .map(|locus_counts| {
                let total: usize = locus_counts.values().sum();
                locus_counts
                    .into_iter()
                    .map(|(symbol, count)| AlleleInfo {
                        symbol,
                        frequency: count as f64 / total as f64,
                    })
                    .collect_vec()
            })
            .collect_vec();
        HaploData::new(genotypes, alleles)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        HaploData::from_genotypes(read_genotypes(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_table_reader(path)?;
        HaploData::from_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn genotype_num(&self) -> usize {
        self.genotypes.len()
    }

    pub fn genotype_len(&self) -> usize {
        self.length
    }

    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    pub fn allele_num(&self, locus: usize) -> usize {
        self.alleles[locus].len()
    }

    pub fn allele_symbol(&self, locus: usize, index: usize) -> Allele {
        self.alleles[locus][index].symbol
    }

    pub fn allele_frequency(&self, locus: usize, index: usize) -> f64 {
        self.alleles[locus][index].frequency
    }

    pub fn allele_index(&self, locus: usize, allele: Allele) -> Option<usize> {
        self.alleles[locus]
            .binary_search_by_key(&allele, |info| info.symbol)
            .ok()
    }

    /// Catalogue indices at `locus` of alleles with non-zero frequency.
    pub fn frequent_alleles(&self, locus: usize) -> impl Iterator<Item = usize> + '_ {
        self.alleles[locus]
            .iter()
            .enumerate()
            .filter(|(_, info)| info.frequency > 0.0)
            .map(|(index, _)| index)
    }
}

impl Index<usize> for HaploData {
    type Output = Genotype;

    fn index(&self, index: usize) -> &Self::Output {
        &self.genotypes[index]
    }
}

impl IndexMut<usize> for HaploData {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.genotypes[index]
    }
}

/// Parses `id haplotype0 haplotype1 [phased]` lines.
pub fn read_genotypes<R: BufRead>(reader: R) -> Result<Vec<Genotype>> {
    let mut genotypes = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        let Some(fields) = table_fields(&line) else {
            continue;
        };
        let (id, h0, h1, phased) = match fields[..] {
            [id, h0, h1] => (id, h0, h1, false),
            [id, h0, h1, "phased"] => (id, h0, h1, true),
            _ => {
                return Err(format!(
                    "Expected fields 'id haplotype0 haplotype1 [phased]' at line {}: {}",
                    line_number + 1,
                    line
                ))
            }
        };
        let mut genotype = Genotype::from_strs(id, h0, h1)
            .map_err(|e| format!("Invalid genotype at line {}: {}", line_number + 1, e))?;
        genotype.is_phased = phased;
        genotypes.push(genotype);
    }
    Ok(genotypes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn catalogue_from_counts() {
        let data = "\
# id h0 h1\n\
g1 AB ab\n\
g2 A. aB\n";
        let hd = HaploData::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(hd.genotype_num(), 2);
        assert_eq!(hd.genotype_len(), 2);
        assert_eq!(hd.allele_num(0), 2);
        assert_eq!(hd.allele_symbol(0, 0), Allele(b'A'));
        assert_eq!(hd.allele_frequency(0, 0), 0.5);
        assert_eq!(hd.allele_index(1, Allele(b'b')), Some(1));
        assert!((hd.allele_frequency(1, 0) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(hd.allele_index(1, Allele(b'z')), None);
    }

    #[test]
    fn phased_column_is_read() {
        let data = "g1 AB ab phased\n";
        let genotypes = read_genotypes(Cursor::new(data)).unwrap();
        assert!(genotypes[0].is_phased);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let data = "g1 AB ab\ng2 AB\n";
        let err = read_genotypes(Cursor::new(data)).unwrap_err();
        assert!(err.contains("line 2"), "{}", err);
    }

    #[test]
    fn empty_cohort_is_rejected() {
        assert!(HaploData::from_genotypes(Vec::new()).is_err());
        let catalogue = vec![vec![AlleleInfo {
            symbol: Allele(b'A'),
            frequency: 1.0,
        }]];
        let err = HaploData::new(Vec::new(), catalogue).unwrap_err();
        assert_eq!(err, "Genotype cohort is empty");
    }

    #[test]
    fn frequent_alleles_skip_zero_frequency() {
        let g = Genotype::from_strs("g", "A", "A").unwrap();
        let alleles = vec![vec![
            AlleleInfo {
                symbol: Allele(b'a'),
                frequency: 0.0,
            },
            AlleleInfo {
                symbol: Allele(b'A'),
                frequency: 1.0,
            },
        ]];
        let hd = HaploData::new(vec![g], alleles).unwrap();
        assert_eq!(hd.allele_symbol(0, 0), Allele(b'A'));
        assert_eq!(hd.frequent_alleles(0).collect_vec(), vec![0]);
    }
}
