/// Geometric mean of strictly positive values, computed in log space
pub fn geometric_mean(x: &[f64]) -> f64 {
    let sum = x.iter().map(|x| x.ln()).sum::<f64>();
    (sum / x.len() as f64).exp()
}

pub fn arithmetic_mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

/// Sample standard deviation (n - 1 denominator); `None` below two values
pub fn sample_stddev(x: &[f64]) -> Option<f64> {
    if x.len() < 2 {
        return None;
    }
    let mean = arithmetic_mean(x);
    let ss = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some((ss / (x.len() - 1) as f64).sqrt())
}

/// Mean, standard deviation and standard error of the mean of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub stddev: Option<f64>,
    pub stderr: Option<f64>,
}
impl Summary {
    pub fn of(x: &[f64]) -> Self {
        let mean = arithmetic_mean(x);
        let stddev = sample_stddev(x);
        let stderr = stddev.map(|s| s / (x.len() as f64).sqrt());
        Self {
            mean,
            stddev,
            stderr,
        }
    }

    /// Coefficient of variation, `stddev / mean`
    pub fn cv(&self) -> Option<f64> {
        self.stddev.map(|s| s / self.mean)
    }
}

/// Mean absolute deviation of `x` around a fixed `center`
pub fn mean_absolute_deviation(x: &[f64], center: f64) -> f64 {
    x.iter().map(|v| (v - center).abs()).sum::<f64>() / x.len() as f64
}
