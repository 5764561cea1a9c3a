// Statistics Helpers
// Dispersion measures and covariance-based outlier distances over small samples

use nalgebra::{DMatrix, DVector};

/// Relative tolerance under which a spread is treated as zero.
const SPREAD_EPSILON: f64 = 1e-9;
/// Absolute floor for the largest singular value of a usable covariance matrix.
const SINGULAR_ABS_EPSILON: f64 = 1e-12;
/// Condition bound: smallest/largest singular value ratio below this is singular.
const SINGULAR_REL_EPSILON: f64 = 1e-10;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n).
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// True when `std` is indistinguishable from zero at the scale of `mean`.
pub fn is_negligible_spread(std: f64, mean: f64) -> bool {
    !std.is_finite() || std <= SPREAD_EPSILON * mean.abs().max(1.0)
}

/// std / mean; 0 for fewer than two points or a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m.abs() <= f64::EPSILON {
        return 0.0;
    }
    std_dev(values) / m.abs()
}

/// Absolute differences between neighbours, in order.
pub fn consecutive_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

/// Fraction of `values` strictly above `threshold`; 0 for an empty slice.
pub fn fraction_above(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v > threshold).count() as f64 / values.len() as f64
}

fn to_matrix(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    let dims = rows.first()?.len();
    if dims == 0 || rows.iter().any(|r| r.len() != dims) {
        return None;
    }
    Some(DMatrix::from_fn(rows.len(), dims, |i, j| rows[i][j]))
}

/// Sample covariance (n - 1 denominator) of row observations.
pub fn covariance_matrix(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    if rows.len() < 2 {
        return None;
    }
    let data = to_matrix(rows)?;
    let n = data.nrows();
    let means = data.row_mean();
    let centered = DMatrix::from_fn(n, data.ncols(), |i, j| data[(i, j)] - means[j]);
    Some(centered.transpose() * &centered / (n as f64 - 1.0))
}

/// Mahalanobis distance of every row from the sample mean.
///
/// Returns `None` when the covariance matrix is singular or ill-conditioned;
/// otherwise the inverse comes from an SVD pseudo-inverse.
pub fn mahalanobis_distances(rows: &[Vec<f64>]) -> Option<Vec<f64>> {
    let cov = covariance_matrix(rows)?;
    let dims = cov.nrows();

    let svd = cov.svd(true, true);
    let max_sv = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let min_sv = svd
        .singular_values
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    if !max_sv.is_finite() || max_sv <= SINGULAR_ABS_EPSILON {
        return None;
    }
    if min_sv <= max_sv * SINGULAR_REL_EPSILON {
        return None;
    }

    let inv = svd.pseudo_inverse(max_sv * SINGULAR_REL_EPSILON).ok()?;
    let data = to_matrix(rows)?;
    let means = data.row_mean();

    let distances = (0..data.nrows())
        .map(|i| {
            let diff = DVector::from_fn(dims, |j, _| data[(i, j)] - means[j]);
            diff.dot(&(&inv * &diff)).max(0.0).sqrt()
        })
        .collect::<Vec<f64>>();

    if distances.iter().all(|d| d.is_finite()) {
        Some(distances)
    } else {
        None
    }
}
