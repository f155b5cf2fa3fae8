use crate::math::arithmetic_mean;

pub fn select_indices<T: Copy>(indices: &[usize], data: &[T]) -> Vec<T> {
    indices.iter().map(|i| data[*i]).collect()
}

/// Arithmetic mean of the entries of `data` at `indices`
pub fn mean_at(indices: &[usize], data: &[f64]) -> f64 {
    arithmetic_mean(&select_indices(indices, data))
}
