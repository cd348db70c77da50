/// Pass limit applied to every loop unless overridden.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Execution settings shared by the batch evaluator and the debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Loop passes allowed before a loop is reported as infinite.
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Config {
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}
