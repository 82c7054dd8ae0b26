use std::time::Instant;

/// Per-builder diagnostics: an error sink plus optional timing hooks.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    timing: bool,
}

impl Diagnostics {
    pub fn new(timing: bool) -> Self {
        Diagnostics { timing }
    }

    pub fn timing_enabled(&self) -> bool {
        self.timing
    }

    /// Logs a non-recoverable error and hands the message back for propagation.
    pub fn fatal(&self, message: String) -> String {
        log::error!("{}", message);
        message
    }

    pub fn timed<T, F>(&self, label: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        if !self.timing {
            return f();
        }
        let start_timer = Instant::now();
        log::debug!("{} ...", label);
        let value = f();
        log::debug!("{} = {:.2?}", label, start_timer.elapsed());
        value
    }
}
