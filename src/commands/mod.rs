pub mod resolve;
pub mod train;
pub mod validate;
