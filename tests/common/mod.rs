#![allow(dead_code)]

use haplobuilder::builder::HaploBuilder;
use haplobuilder::genotype::{Genotype, HaploData};
use haplobuilder::pattern::{HaploPattern, PatternLibrary};
use std::io::Cursor;

pub const SCENARIO_LIBRARY: &str = "\
#start\talleles\tfrequency
0\tA\t0.5
0\ta\t0.5
0\tAB\t0.25
0\tAb\t0.25
0\taB\t0.25
0\tab\t0.25
";

pub fn scenario_library() -> PatternLibrary {
    PatternLibrary::from_reader(Cursor::new(SCENARIO_LIBRARY)).unwrap()
}

/// Heads on locus 0 plus every two-locus window over alleles A/a, as a
/// first-order chain.
pub fn markov_library(len: usize) -> PatternLibrary {
    let pattern = |start: usize, alleles: &str, frequency: f64, transition_prob: f64| {
        HaploPattern::new(start, alleles.parse().unwrap(), frequency, transition_prob)
    };
    let mut patterns = vec![pattern(0, "A", 0.6, 0.6), pattern(0, "a", 0.4, 0.4)];
    for start in 0..len - 1 {
        for (alleles, tp) in [("AA", 0.7), ("Aa", 0.3), ("aA", 0.2), ("aa", 0.8)] {
            let prefix = if alleles.starts_with('A') { 0.6 } else { 0.4 };
            patterns.push(pattern(start, alleles, prefix * tp, tp));
        }
    }
    PatternLibrary::new(patterns)
}

pub fn genotypes(pairs: &[(&str, &str)]) -> Vec<Genotype> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (h0, h1))| Genotype::from_strs(&format!("g{}", i + 1), h0, h1).unwrap())
        .collect()
}

pub fn initialized(library: PatternLibrary, genotypes: Vec<Genotype>) -> HaploBuilder {
    let data = HaploData::from_genotypes(genotypes).unwrap();
    let mut builder = HaploBuilder::new(library, data);
    builder.initialize().unwrap();
    builder
}

pub fn alleles(genotype: &Genotype) -> (String, String) {
    (
        genotype.haplotypes[0].alleles.to_string(),
        genotype.haplotypes[1].alleles.to_string(),
    )
}
