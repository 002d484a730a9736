// Piecewise-linear resampling of telemetry onto a fixed-step clock
use crate::domain::error::{AnalysisError, AnalysisResult};
use crate::domain::sample::Field;
use crate::domain::sample_store::SampleStore;

/// Rounding slack, in steps, when `start + k·step` should land exactly on a boundary.
const STEP_EPSILON: f64 = 1e-9;

/// Largest grid a single call may produce.
pub const MAX_GRID_POINTS: usize = 1 << 24;

/// Resamples series that share one non-decreasing time axis.
#[derive(Debug, Clone, Copy)]
pub struct Resampler<'a> {
    times: &'a [f64],
}

impl<'a> Resampler<'a> {
    pub fn new(times: &'a [f64]) -> Self {
        Self { times }
    }

    pub fn for_store(store: &'a SampleStore) -> Self {
        Self::new(store.series(Field::Time))
    }

    /// Number of grid points in `[start, start + duration]` at `step` spacing, `None` when it
    /// exceeds `MAX_GRID_POINTS`.
    pub fn point_count(duration: f64, step: f64) -> Option<usize> {
        let intervals = (duration / step + STEP_EPSILON).floor();
        if !(intervals.is_finite() && intervals >= 0.0 && intervals < MAX_GRID_POINTS as f64) {
            return None;
        }
        (intervals as usize).checked_add(1)
    }

    /// Values at `start, start + step, ...` up to and including `start + duration`.
    ///
    /// Every grid time must fall inside the recorded time range. The scan through the raw
    /// series only moves forward, so the whole call is linear in input plus output length.
    pub fn resample(
        &self,
        values: &[f64],
        start: f64,
        duration: f64,
        step: f64,
    ) -> AnalysisResult<Vec<f64>> {
        if values.len() != self.times.len() {
            return Err(AnalysisError::invalid_window(format!(
                "series has {} values for {} time stamps",
                values.len(),
                self.times.len()
            )));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(AnalysisError::invalid_window(format!("step must be positive, got {step}")));
        }
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(AnalysisError::invalid_window(format!(
                "duration must be non-negative, got {duration}"
            )));
        }
        if !start.is_finite() {
            return Err(AnalysisError::invalid_window("start must be finite"));
        }
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return Err(AnalysisError::invalid_window("no samples to resample"));
        };

        let slack = step * STEP_EPSILON;
        let end = start + duration;
        for t in [start, end] {
            if !(t >= first - slack && t <= last + slack) {
                return Err(AnalysisError::ResampleOutOfRange {
                    time: t,
                    min: first,
                    max: last,
                });
            }
        }

        let count = Self::point_count(duration, step).ok_or_else(|| {
            AnalysisError::invalid_window(format!(
                "{duration}s at {step}s spacing exceeds {MAX_GRID_POINTS} points"
            ))
        })?;
        let mut output = Vec::with_capacity(count);
        let mut idx = 0;

        for k in 0..count {
            let t = (start + k as f64 * step).clamp(first, last);

            while idx + 1 < self.times.len() && self.times[idx + 1] < t {
                idx += 1;
            }

            output.push(self.value_at(values, idx, t));
        }

        Ok(output)
    }

    /// Interpolates inside the bracket starting at `idx`.
    fn value_at(&self, values: &[f64], idx: usize, t: f64) -> f64 {
        if idx + 1 >= self.times.len() {
            return values[idx];
        }
        let (t0, t1) = (self.times[idx], self.times[idx + 1]);
        let (v0, v1) = (values[idx], values[idx + 1]);

        if t1 <= t0 {
            (v0 + v1) / 2.0
        } else if t == t0 {
            v0
        } else if t == t1 {
            v1
        } else {
            let factor = (t - t0) / (t1 - t0);
            factor.mul_add(v1 - v0, v0)
        }
    }
}
