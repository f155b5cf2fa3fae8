use itertools::Itertools;
use tracing::{debug, warn};

use crate::{
    dataset::{ConditionGroup, Dataset, Partition},
    enumerator::Combination,
    error::{GrayNormError, Result},
    math::{mean_absolute_deviation, Summary},
    normalization::inverse_factors,
    utils::{mean_at, select_indices},
};

/// Statistics of relative inverse normalization factors per condition group
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionStats {
    /// One summary per condition group, in dataset group order
    pub groups: Vec<Summary>,
    /// Summary of the group means
    pub overall: Summary,
    /// Sum of `|1 - group mean|` over all groups
    pub cumulative: f64,
}
impl ConditionStats {
    /// Inter-group coefficient of variation of the group means
    pub fn cv_inter(&self) -> Option<f64> {
        self.overall.cv()
    }
}

/// Everything the scorer measures for one combination
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationScore {
    /// Per control variable dispersion, in declaration order
    pub dispersions: Vec<f64>,
    /// Sum of the per-variable dispersions; lower is more stable
    pub stability: f64,
    /// Condition-group statistics; `None` without joint control samples
    pub conditions: Option<ConditionStats>,
}

/// Scores how much a combination's normalization factor moves under the experiment
///
/// For each control variable the inverse normalization factors are expressed
/// relative to the mean over that variable's control samples. The dispersion
/// for the variable is the mean absolute deviation of the treatment samples'
/// relative factors from 1, and the stability score is the sum over all
/// variables.
///
/// The sample partitions are fixed when the scorer is built, so a variable
/// lacking control or treatment samples is rejected before anything is scored.
/// Condition-group statistics are relative to the joint control samples and
/// are left out when no sample is a control for every variable.
#[derive(Debug, Clone)]
pub struct StabilityScorer<'a> {
    dataset: &'a Dataset,
    partitions: Vec<Partition>,
    joint_controls: Vec<usize>,
    groups: Vec<ConditionGroup>,
}
impl<'a> StabilityScorer<'a> {
    pub fn new(dataset: &'a Dataset) -> Result<Self> {
        let mut partitions = Vec::with_capacity(dataset.controls().len());
        for (var_idx, control) in dataset.controls().iter().enumerate() {
            let partition = dataset.partition(var_idx);
            debug!(
                variable = %control.variable,
                control = partition.control.len(),
                treatment = partition.treatment.len(),
                "partitioned samples"
            );
            if partition.control.is_empty() || partition.treatment.is_empty() {
                return Err(GrayNormError::insufficient_data(&control.variable));
            }
            partitions.push(partition);
        }

        let joint_controls = dataset.joint_controls();
        if joint_controls.is_empty() {
            let variables = dataset.controls().iter().map(|c| &c.variable).join(", ");
            warn!(
                variables = %variables,
                "no sample is a control for every variable, skipping condition-group statistics"
            );
        }

        Ok(Self {
            dataset,
            partitions,
            joint_controls,
            groups: dataset.condition_groups(),
        })
    }

    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    pub fn score(&self, combination: &Combination) -> CombinationScore {
        let inverse = inverse_factors(combination, self.dataset);

        let dispersions = self
            .partitions
            .iter()
            .map(|p| variable_dispersion(p, &inverse))
            .collect::<Vec<_>>();
        let stability: f64 = dispersions.iter().sum();

        CombinationScore {
            dispersions,
            stability,
            conditions: self.condition_stats(&inverse),
        }
    }

    fn condition_stats(&self, inverse: &[f64]) -> Option<ConditionStats> {
        if self.joint_controls.is_empty() {
            return None;
        }
        let reference = mean_at(&self.joint_controls, inverse);
        let relative = inverse.iter().map(|x| x / reference).collect::<Vec<_>>();

        let groups = self
            .groups
            .iter()
            .map(|g| Summary::of(&select_indices(&g.samples, &relative)))
            .collect::<Vec<_>>();
        let means = groups.iter().map(|s| s.mean).collect::<Vec<_>>();
        let cumulative: f64 = means.iter().map(|m| (1.0 - m).abs()).sum();

        Some(ConditionStats {
            overall: Summary::of(&means),
            groups,
            cumulative,
        })
    }
}

/// Mean absolute deviation of the treatment samples' relative factors from 1
fn variable_dispersion(partition: &Partition, inverse: &[f64]) -> f64 {
    let reference = mean_at(&partition.control, inverse);
    let relative = partition
        .treatment
        .iter()
        .map(|&i| inverse[i] / reference)
        .collect::<Vec<_>>();
    mean_absolute_deviation(&relative, 1.0)
}
