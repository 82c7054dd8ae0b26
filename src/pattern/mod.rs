mod haplo_pattern;
mod library;
mod tree;

pub use haplo_pattern::{HaploPattern, PatternId};
pub use library::PatternLibrary;
pub use tree::{Orientation, PatternNode, PatternTree};
