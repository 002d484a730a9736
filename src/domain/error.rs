// Analysis error taxonomy
use super::sample::Field;
use thiserror::Error;

/// Contract failures raised by the analysis engine.
///
/// "Event not found" is not an error: detectors report it as `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("row {row} out of range: flight has {count} samples")]
    OutOfRange { row: usize, count: usize },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {0} cannot be baseline-normalized")]
    NotNormalizable(Field),

    #[error("degenerate fit over rows {start}..={end}: {distinct} distinct samples, need {required}")]
    DegenerateFit {
        start: usize,
        end: usize,
        distinct: usize,
        required: usize,
    },

    #[error("flight log is empty")]
    EmptyLog,

    #[error("time decreases at row {row}: {previous} -> {current}")]
    NonMonotonicTime { row: usize, previous: f64, current: f64 },

    #[error("non-finite {field} at row {row}")]
    NonFinite { row: usize, field: Field },

    #[error("resample time {time} outside recorded data [{min}, {max}]")]
    ResampleOutOfRange { time: f64, min: f64, max: f64 },

    #[error("invalid resample window: {0}")]
    InvalidWindow(String),
}

impl AnalysisError {
    pub fn out_of_range(row: usize, count: usize) -> Self {
        Self::OutOfRange { row, count }
    }

    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField(name.into())
    }

    pub fn degenerate_fit(start: usize, end: usize, distinct: usize, required: usize) -> Self {
        Self::DegenerateFit {
            start,
            end,
            distinct,
            required,
        }
    }

    pub fn invalid_window(reason: impl Into<String>) -> Self {
        Self::InvalidWindow(reason.into())
    }

    /// Fit failures stand in for a missing event when assembling highlights.
    pub fn is_degenerate_fit(&self) -> bool {
        matches!(self, Self::DegenerateFit { .. })
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = AnalysisError::out_of_range(12, 10);
        assert!(err.to_string().contains("row 12"));
        assert!(err.to_string().contains("10 samples"));
    }

    #[test]
    fn test_degenerate_fit_classification() {
        let err = AnalysisError::degenerate_fit(3, 5, 3, 5);
        assert!(err.is_degenerate_fit());
        assert!(err.to_string().contains("3..=5"));
        assert!(!AnalysisError::unknown_field("speed").is_degenerate_fit());
    }
}
