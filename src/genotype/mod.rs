mod allele;
#[allow(clippy::module_inception)]
mod genotype;
mod haplo_data;
mod haplotype;

pub use allele::{Allele, AlleleSequence};
pub use genotype::Genotype;
pub use haplo_data::{read_genotypes, AlleleInfo, HaploData};
pub use haplotype::Haplotype;
