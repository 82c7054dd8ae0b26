pub mod builder;
pub mod cli;
pub mod commands;
pub mod genotype;
pub mod pattern;
pub mod utils;
