use itertools::Itertools;

use crate::{
    config::GrayNormConfig,
    error::{GrayNormError, Result},
};

/// Largest panel whose `2^n - 1` combinations can be counted in a `u64`
pub const MAX_COMBINATORIAL_LIMIT: usize = 63;

/// A non-empty set of candidate reference genes, held as panel indices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination {
    indices: Vec<usize>,
}
impl Combination {
    /// Creates a combination from panel indices; order and repeats are irrelevant
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Panel indices in increasing order
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }
}

/// Enumerates the gene combinations of a candidate panel
///
/// Combinations come by increasing size, and lexicographically by panel index
/// within one size. The enumerator holds no iteration state, so every call to
/// `iter` restarts from the first combination.
#[derive(Debug, Clone, Copy)]
pub struct CombinationEnumerator {
    panel_size: usize,
    max_size: usize,
}
impl CombinationEnumerator {
    pub fn new(panel_size: usize, config: &GrayNormConfig) -> Result<Self> {
        if config.combinatorial_limit > MAX_COMBINATORIAL_LIMIT {
            return Err(GrayNormError::InvalidConfig(format!(
                "the combinatorial limit must be at most {MAX_COMBINATORIAL_LIMIT}, got {}",
                config.combinatorial_limit
            )));
        }
        if panel_size > config.combinatorial_limit {
            return Err(GrayNormError::CombinatorialLimit {
                limit: config.combinatorial_limit,
                panel_size,
            });
        }
        let max_size = match config.max_combination_size {
            Some(0) => {
                return Err(GrayNormError::InvalidConfig(
                    "the maximum combination size must be at least 1".to_string(),
                ))
            }
            Some(k) => k.min(panel_size),
            None => panel_size,
        };
        Ok(Self {
            panel_size,
            max_size,
        })
    }

    pub fn panel_size(&self) -> usize {
        self.panel_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn iter(&self) -> impl Iterator<Item = Combination> {
        let n = self.panel_size;
        (1..=self.max_size)
            .flat_map(move |k| (0..n).combinations(k))
            .map(Combination::new)
    }

    /// Number of combinations `iter` yields, saturating at `usize::MAX`
    pub fn len(&self) -> usize {
        let total: u128 = (1..=self.max_size)
            .map(|k| binomial(self.panel_size, k))
            .sum();
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u128, |acc, i| acc * (n - i) as u128 / (i + 1) as u128)
}
