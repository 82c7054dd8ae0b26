mod diagnostics;
mod io_utils;
mod math;
mod readers;
mod util;

pub use diagnostics::Diagnostics;
pub use io_utils::{create_writer, open_text_writer};
pub use math::{log_sum, median};
pub use readers::{open_table_reader, table_fields};
pub use util::{handle_error_and_exit, Result};
