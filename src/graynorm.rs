use rayon::prelude::*;
use tracing::info;

use crate::{
    config::GrayNormConfig,
    dataset::Dataset,
    enumerator::{Combination, CombinationEnumerator},
    error::{GrayNormError, Result},
    results::{CombinationResult, GrayNormResults},
    scorer::StabilityScorer,
};

/// An implementation of the GrayNorm Algorithm
///
/// GrayNorm ranks every combination of candidate reference genes by how
/// little its normalization factor shifts between control and treatment
/// samples.
pub struct GrayNorm<'a> {
    dataset: &'a Dataset,
    config: GrayNormConfig,
}
impl<'a> GrayNorm<'a> {
    pub fn new(dataset: &'a Dataset, config: GrayNormConfig) -> Self {
        Self { dataset, config }
    }

    /// Run the GrayNorm algorithm
    ///
    /// The GrayNorm algorithm is a three-step process:
    /// 1. Enumerate the candidate gene combinations
    /// 2. Score each combination against the control partitions
    /// 3. Rank the combinations by stability score
    pub fn run(&self) -> Result<GrayNormResults> {
        let panel = self.dataset.panel();

        // Validate everything before scoring anything
        let enumerator = CombinationEnumerator::new(panel.len(), &self.config)?;
        let scorer = StabilityScorer::new(self.dataset)?;

        info!(
            genes = panel.len(),
            max_size = enumerator.max_size(),
            combinations = enumerator.len(),
            parallel = self.config.parallel,
            "scoring gene combinations"
        );

        let combinations = enumerator.iter().collect::<Vec<_>>();
        let results = if self.config.parallel {
            self.score_parallel(&scorer, &combinations)?
        } else {
            combinations
                .iter()
                .enumerate()
                .map(|(order, combination)| self.process_combination(&scorer, order, combination))
                .collect()
        };

        let variables = self
            .dataset
            .controls()
            .iter()
            .map(|c| c.variable.clone())
            .collect();
        let conditions = scorer
            .groups()
            .iter()
            .map(|g| self.dataset.condition_label(g))
            .collect();
        let ranked = GrayNormResults::from_vec(variables, conditions, results);

        if let Some(best) = ranked.best() {
            info!(
                combination = %best.label,
                score = best.score.stability,
                "most stable combination"
            );
        }
        Ok(ranked)
    }

    /// Scores all combinations on rayon workers
    ///
    /// Results are collected in enumeration order regardless of which worker
    /// finishes first.
    fn score_parallel(
        &self,
        scorer: &StabilityScorer,
        combinations: &[Combination],
    ) -> Result<Vec<CombinationResult>> {
        let score_all = || {
            combinations
                .par_iter()
                .enumerate()
                .map(|(order, combination)| self.process_combination(scorer, order, combination))
                .collect::<Vec<_>>()
        };
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| GrayNormError::InvalidConfig(e.to_string()))?;
                Ok(pool.install(score_all))
            }
            None => Ok(score_all()),
        }
    }

    /// Process a single combination
    fn process_combination(
        &self,
        scorer: &StabilityScorer,
        order: usize,
        combination: &Combination,
    ) -> CombinationResult {
        CombinationResult {
            order,
            label: self.dataset.panel().label(combination),
            size: combination.size(),
            score: scorer.score(combination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_str;

    const DRUG: &str = "\
# sampleid: sample
# refgenes: G1, G2, G3
# controls: treatment = none
sample,treatment,G1,G2,G3
s1,none,10,10,10.2
s2,none,10,10.1,9.9
s3,drugX,10,14,13.8
s4,drugX,10,13.9,14.1
";

    fn run(text: &str, config: GrayNormConfig) -> Result<GrayNormResults> {
        let dataset = parse_str(text, None)?;
        GrayNorm::new(&dataset, config).run()
    }

    #[test]
    fn test_stable_gene_ranks_first() {
        let results = run(DRUG, GrayNormConfig::default()).unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(results.best().unwrap().label, "G1");

        let position = |label: &str| results.rows.iter().position(|r| r.label == label).unwrap();
        assert!(position("G1") < position("G2 + G3"));
        assert!(results.rows[0].score.stability < results.rows[position("G2 + G3")].score.stability);
    }

    #[test]
    fn test_scores_are_sorted() {
        let results = run(DRUG, GrayNormConfig::default()).unwrap();
        for pair in results.rows.windows(2) {
            assert!(pair[0].score.stability <= pair[1].score.stability);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let parallel = run(DRUG, GrayNormConfig::default()).unwrap();
        let sequential = run(DRUG, GrayNormConfig::builder().parallel(false).build()).unwrap();
        let pooled = run(DRUG, GrayNormConfig::builder().threads(2).build()).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel, pooled);
    }

    #[test]
    fn test_max_size_limits_rows() {
        let config = GrayNormConfig::builder().max_combination_size(1).build();
        let results = run(DRUG, config).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.rows.iter().all(|r| r.size == 1));
    }

    #[test]
    fn test_limit_checked_before_scoring() {
        let config = GrayNormConfig::builder().combinatorial_limit(2).build();
        let err = run(DRUG, config).unwrap_err();
        assert!(matches!(
            err,
            GrayNormError::CombinatorialLimit {
                limit: 2,
                panel_size: 3
            }
        ));
    }

    #[test]
    fn test_result_metadata() {
        let results = run(DRUG, GrayNormConfig::default()).unwrap();
        assert_eq!(results.variables, vec!["treatment".to_string()]);
        assert_eq!(
            results.conditions,
            vec!["treatment=none".to_string(), "treatment=drugX".to_string()]
        );
    }
}
