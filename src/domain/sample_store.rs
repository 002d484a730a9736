// Immutable, time-ordered sample sequence for one flight
use super::error::{AnalysisError, AnalysisResult};
use super::sample::{Field, Sample};

/// Launch-relative reference point for one analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Row the baseline was taken from (the launch row, or row 0 when no launch was detected).
    pub row: usize,
    pub t0: f64,
    pub a0: f64,
    pub from_launch: bool,
}

impl Baseline {
    /// Flight-relative `(time, altitude)` for plotting.
    pub fn relative(&self, time: f64, altitude: f64) -> (f64, f64) {
        (time - self.t0, altitude - self.a0)
    }
}

/// Column-oriented store of a flight's samples.
///
/// Rows are positions in the sequence; time never decreases from one row to the next.
#[derive(Debug, Clone)]
pub struct SampleStore {
    times: Vec<f64>,
    altitudes: Vec<f64>,
    accelerations: Vec<f64>,
    acceleration_xs: Vec<f64>,
}

impl SampleStore {
    pub fn new(samples: Vec<Sample>) -> AnalysisResult<Self> {
        if samples.is_empty() {
            return Err(AnalysisError::EmptyLog);
        }

        let mut store = Self {
            times: Vec::with_capacity(samples.len()),
            altitudes: Vec::with_capacity(samples.len()),
            accelerations: Vec::with_capacity(samples.len()),
            acceleration_xs: Vec::with_capacity(samples.len()),
        };

        for (row, sample) in samples.iter().enumerate() {
            for field in Field::ALL {
                if !sample.get(field).is_finite() {
                    return Err(AnalysisError::NonFinite { row, field });
                }
            }
            if let Some(&previous) = store.times.last() {
                if sample.time < previous {
                    return Err(AnalysisError::NonMonotonicTime {
                        row,
                        previous,
                        current: sample.time,
                    });
                }
            }
            store.times.push(sample.time);
            store.altitudes.push(sample.altitude);
            store.accelerations.push(sample.acceleration);
            store.acceleration_xs.push(sample.acceleration_x);
        }

        Ok(store)
    }

    pub fn count(&self) -> usize {
        self.times.len()
    }

    pub fn series(&self, field: Field) -> &[f64] {
        match field {
            Field::Time => &self.times,
            Field::Altitude => &self.altitudes,
            Field::Acceleration => &self.accelerations,
            Field::AccelerationX => &self.acceleration_xs,
        }
    }

    pub fn field(&self, row: usize, field: Field) -> AnalysisResult<f64> {
        self.check_row(row)?;
        Ok(self.series(field)[row])
    }

    /// Field lookup by external column name.
    pub fn field_by_name(&self, row: usize, name: &str) -> AnalysisResult<f64> {
        let field = name.parse::<Field>()?;
        self.field(row, field)
    }

    pub fn sample(&self, row: usize) -> AnalysisResult<Sample> {
        self.check_row(row)?;
        Ok(Sample::new(
            row,
            self.times[row],
            self.altitudes[row],
            self.accelerations[row],
            self.acceleration_xs[row],
        ))
    }

    pub fn final_time(&self) -> f64 {
        self.times.last().copied().unwrap_or_default()
    }

    /// Baseline at `launch`, or at row 0 when launch was not detected.
    pub fn baseline(&self, launch: Option<usize>) -> Baseline {
        let row = launch.filter(|&r| r < self.count()).unwrap_or(0);
        Baseline {
            row,
            t0: self.times[row],
            a0: self.altitudes[row],
            from_launch: launch.is_some(),
        }
    }

    /// Baseline-relative values of `field` over rows `start..=end`.
    ///
    /// Only time and altitude can be normalized. Altitudes below the baseline clamp to zero.
    pub fn normalized_series(
        &self,
        field: Field,
        start: usize,
        end: usize,
        baseline: &Baseline,
    ) -> AnalysisResult<Vec<f64>> {
        self.check_row(start)?;
        self.check_row(end)?;
        if start > end {
            return Err(AnalysisError::out_of_range(start, end + 1));
        }

        let values = &self.series(field)[start..=end];
        match field {
            Field::Time => Ok(values.iter().map(|t| t - baseline.t0).collect()),
            Field::Altitude => Ok(values.iter().map(|a| (a - baseline.a0).max(0.0)).collect()),
            other => Err(AnalysisError::NotNormalizable(other)),
        }
    }

    fn check_row(&self, row: usize) -> AnalysisResult<()> {
        if row >= self.count() {
            return Err(AnalysisError::out_of_range(row, self.count()));
        }
        Ok(())
    }
}
