//! Evaluator configuration.

/// Default bound on expression nesting. Each level costs one host stack
/// frame of the recursive evaluator.
pub const DEFAULT_MAX_EXPR_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Deepest nesting of opcode handlers that may run; one more faults with
    /// `ExprTooDeep`. Compact integer literals do not count.
    pub max_expr_depth: usize,
    /// Seed for the `random`/`random_int` opcodes. `None` seeds from the
    /// host's entropy source.
    pub random_seed: Option<u64>,
}

impl VmConfig {
    pub fn new() -> Self {
        Self {
            max_expr_depth: DEFAULT_MAX_EXPR_DEPTH,
            random_seed: None,
        }
    }

    pub fn with_max_expr_depth(mut self, depth: usize) -> Self {
        self.max_expr_depth = depth;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::new()
    }
}
