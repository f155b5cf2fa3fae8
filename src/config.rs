use bon::Builder;

/// Largest candidate panel enumerated exhaustively unless configured otherwise
pub const DEFAULT_COMBINATORIAL_LIMIT: usize = 20;

/// Run configuration for the GrayNorm search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct GrayNormConfig {
    /// Only combinations of at most this many genes are scored; `None` scores all sizes
    pub max_combination_size: Option<usize>,

    /// Panels with more candidate genes than this are rejected up front
    #[builder(default = DEFAULT_COMBINATORIAL_LIMIT)]
    pub combinatorial_limit: usize,

    /// Score combinations on the rayon thread pool
    #[builder(default = true)]
    pub parallel: bool,

    /// Number of worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl Default for GrayNormConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
