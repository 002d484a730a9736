// Polynomial curves over baseline-shifted time
use super::sample_store::Baseline;

/// Coefficients `[c0, c1, ..., cn]` of `f(x) = Σ ci·x^i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Exact algebraic derivative: `[1·c1, 2·c2, ..., n·cn]`.
    pub fn derivative(&self) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| i as f64 * c)
            .collect();
        Self { coefficients }
    }

    /// Horner evaluation at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }
}

/// Whether a fitted curve is a position (altitude) or a rate (velocity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Altitude,
    Velocity,
}

/// A polynomial fitted against baseline-normalized time and altitude.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    pub kind: CurveKind,
    pub polynomial: Polynomial,
    pub baseline: Baseline,
}

impl FittedCurve {
    pub fn altitude(polynomial: Polynomial, baseline: Baseline) -> Self {
        Self {
            kind: CurveKind::Altitude,
            polynomial,
            baseline,
        }
    }

    /// Rate of change of this curve.
    pub fn derivative(&self) -> Self {
        Self {
            kind: CurveKind::Velocity,
            polynomial: self.polynomial.derivative(),
            baseline: self.baseline,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        self.polynomial.coefficients()
    }

    /// Value at raw time `t`. Altitude curves re-add the baseline altitude; rates do not.
    pub fn evaluate(&self, t: f64) -> f64 {
        let value = self.polynomial.evaluate(t - self.baseline.t0);
        match self.kind {
            CurveKind::Altitude => value + self.baseline.a0,
            CurveKind::Velocity => value,
        }
    }
}
