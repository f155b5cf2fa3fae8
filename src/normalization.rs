//! Normalization factors of gene combinations
//!
//! Expression values are taken to be linear relative quantities (for
//! instance `2^-dCq`), so the normalization factor of a combination is the
//! geometric mean of its genes' quantities within one sample.

use crate::{
    dataset::{Dataset, SampleRecord},
    enumerator::Combination,
    math::geometric_mean,
    utils::select_indices,
};

/// Normalization factor of `combination` for one sample
pub fn compute(combination: &Combination, sample: &SampleRecord) -> f64 {
    let values = select_indices(combination.indices(), &sample.expression);
    geometric_mean(&values)
}

/// Normalization factors of `combination` for every sample, in dataset order
pub fn compute_all(combination: &Combination, dataset: &Dataset) -> Vec<f64> {
    dataset
        .samples()
        .iter()
        .map(|sample| compute(combination, sample))
        .collect()
}

/// Inverse normalization factors, the multipliers applied to target genes
pub fn inverse_factors(combination: &Combination, dataset: &Dataset) -> Vec<f64> {
    compute_all(combination, dataset)
        .into_iter()
        .map(|nf| 1.0 / nf)
        .collect()
}
