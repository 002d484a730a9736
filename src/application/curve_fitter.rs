// Least-squares polynomial fits of altitude against baseline-shifted time
use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::domain::polynomial::{FittedCurve, Polynomial};
use crate::domain::sample::Field;
use crate::domain::sample_store::{Baseline, SampleStore};
use nalgebra::{DMatrix, DVector};

pub const DEFAULT_FIT_DEGREE: usize = 4;

/// Singular values below this fraction of the largest count as zero.
const RANK_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy)]
pub struct CurveFitter<'a> {
    store: &'a SampleStore,
    baseline: Baseline,
    degree: usize,
}

impl<'a> CurveFitter<'a> {
    pub fn new(store: &'a SampleStore, baseline: Baseline, degree: usize) -> Self {
        Self {
            store,
            baseline,
            degree,
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Fits normalized altitude against normalized time over rows `start..=end`.
    pub fn altitude_curve(&self, start: usize, end: usize) -> AnalysisResult<FittedCurve> {
        let times = self
            .store
            .normalized_series(Field::Time, start, end, &self.baseline)?;
        let altitudes = self
            .store
            .normalized_series(Field::Altitude, start, end, &self.baseline)?;

        let required = self.degree + 1;
        let distinct = distinct_count(&times);
        if distinct < required {
            return Err(AnalysisError::degenerate_fit(start, end, distinct, required));
        }

        let coefficients = least_squares(&times, &altitudes, self.degree)
            .ok_or_else(|| AnalysisError::degenerate_fit(start, end, distinct, required))?;

        tracing::debug!(
            "Fitted degree {} altitude curve over rows {}..={}: {:?}",
            self.degree,
            start,
            end,
            coefficients
        );

        Ok(FittedCurve::altitude(
            Polynomial::new(coefficients),
            self.baseline,
        ))
    }

    pub fn velocity_curve(&self, start: usize, end: usize) -> AnalysisResult<FittedCurve> {
        Ok(self.altitude_curve(start, end)?.derivative())
    }
}

/// Number of distinct values in a non-decreasing sequence.
fn distinct_count(sorted: &[f64]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[1] != w[0]).count()
}

/// Solves the Vandermonde system in the least-squares sense.
///
/// The abscissae are mapped onto `[-1, 1]` for the solve and the result is expanded back into
/// powers of the original `x`. Returns `None` when the system is rank deficient.
fn least_squares(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let columns = degree + 1;
    let (min, max) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let center = (min + max) / 2.0;
    let half_width = if max > min { (max - min) / 2.0 } else { 1.0 };

    let design = DMatrix::from_fn(xs.len(), columns, |row, col| {
        ((xs[row] - center) / half_width).powi(col as i32)
    });
    let rhs = DVector::from_column_slice(ys);

    let svd = design.svd(true, true);
    let eps = svd.singular_values.max() * RANK_TOLERANCE;
    if svd.rank(eps) < columns {
        return None;
    }
    let scaled = svd.solve(&rhs, eps).ok()?;

    // Σ dj·((x - c)/h)^j  =  Σk xk · Σj≥k dj/h^j · C(j,k) · (-c)^(j-k)
    let mut coefficients = vec![0.0; columns];
    for (j, d) in scaled.iter().enumerate() {
        let dj = d / half_width.powi(j as i32);
        let mut binomial = 1.0;
        for k in (0..=j).rev() {
            coefficients[k] += dj * binomial * (-center).powi((j - k) as i32);
            // C(j, k-1) = C(j, k) · k / (j - k + 1)
            binomial *= k as f64 / (j - k + 1) as f64;
        }
    }
    Some(coefficients)
}
