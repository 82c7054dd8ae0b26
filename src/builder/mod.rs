mod adjust;
mod haplo_builder;
mod haplo_pair;
mod trellis;

pub use adjust::EmAccumulator;
pub use haplo_builder::{Alternative, HaploBuilder, Resolution};
pub use haplo_pair::{HaploPair, PairLink};
pub use trellis::Trellis;
