// One analysis pass over one flight's samples
use crate::application::event_detector::{DetectorConfig, EventDetector};
use crate::application::highlights::assemble_highlights;
use crate::domain::error::AnalysisResult;
use crate::domain::event::Highlights;
use crate::domain::polynomial::FittedCurve;
use crate::domain::sample::Field;
use crate::domain::sample_store::{Baseline, SampleStore};

/// Engine output for display and tabulation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSummary {
    pub baseline: Baseline,
    pub sample_count: usize,
    pub duration: f64,
    pub highlights: Highlights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Ascent,
    Descent,
}

impl Segment {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ascent => "ascent",
            Self::Descent => "descent",
        }
    }
}

/// One sample next to the fitted curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRow {
    pub row: usize,
    pub time: f64,
    pub relative_time: f64,
    pub altitude: f64,
    pub fitted_altitude: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    pub segment: Segment,
    pub start: usize,
    pub end: usize,
    pub altitude: FittedCurve,
    pub velocity: FittedCurve,
    pub rows: Vec<CurveRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightCurves {
    pub baseline: Baseline,
    pub ascent: Option<CurveTable>,
    pub descent: Option<CurveTable>,
}

/// Owns the samples of one flight. Analyses of different flights share nothing.
#[derive(Debug, Clone)]
pub struct FlightAnalysis {
    store: SampleStore,
    config: DetectorConfig,
}

impl FlightAnalysis {
    pub fn new(store: SampleStore, config: DetectorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn detector(&self) -> EventDetector<'_> {
        EventDetector::new(&self.store, self.config)
    }

    pub fn summarize(&self) -> AnalysisResult<FlightSummary> {
        let detector = self.detector();
        let highlights = assemble_highlights(&detector)?;
        let summary = FlightSummary {
            baseline: detector.baseline(),
            sample_count: self.store.count(),
            duration: self.store.final_time(),
            highlights,
        };

        tracing::info!(
            "Analyzed {} samples over {:.2}s: {} events",
            summary.sample_count,
            summary.duration,
            summary.highlights.events().len()
        );
        Ok(summary)
    }

    /// Fitted ascent (launch to apogee) and descent (apogee to landing) tables.
    ///
    /// A segment is omitted when one of its boundary events was not found. Fit failures
    /// are returned as errors.
    pub fn curves(&self) -> AnalysisResult<FlightCurves> {
        let detector = self.detector();
        let ascent = match (detector.launch(), detector.apogee()) {
            (Some(launch), Some(apogee)) if launch < apogee => {
                Some(self.curve_table(&detector, Segment::Ascent, launch, apogee)?)
            }
            _ => None,
        };
        let descent = match (detector.apogee(), detector.land()) {
            (Some(apogee), Some(land)) if apogee < land => {
                Some(self.curve_table(&detector, Segment::Descent, apogee, land)?)
            }
            _ => None,
        };

        Ok(FlightCurves {
            baseline: detector.baseline(),
            ascent,
            descent,
        })
    }

    fn curve_table(
        &self,
        detector: &EventDetector<'_>,
        segment: Segment,
        start: usize,
        end: usize,
    ) -> AnalysisResult<CurveTable> {
        let fitter = detector.fitter();
        let altitude = fitter.altitude_curve(start, end)?;
        let velocity = altitude.derivative();

        let times = self.store.series(Field::Time);
        let altitudes = self.store.series(Field::Altitude);
        let rows = (start..=end)
            .map(|row| {
                let time = times[row];
                CurveRow {
                    row,
                    time,
                    relative_time: time - fitter.baseline().t0,
                    altitude: altitudes[row],
                    fitted_altitude: altitude.evaluate(time),
                    velocity: velocity.evaluate(time),
                }
            })
            .collect();

        Ok(CurveTable {
            segment,
            start,
            end,
            altitude,
            velocity,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventKind;
    use crate::domain::sample_store::tests::store_from;
    use approx::assert_abs_diff_eq;

    /// 2 Hz: pad, ascent over 0..=8 s on a(τ) = 80τ - 5τ², descent at 8 m/s from 320 m.
    fn flight() -> FlightAnalysis {
        let mut rows = vec![(0.0, 0.0, 1.0, 0.0), (0.5, 0.0, 1.0, 0.0)];
        for i in 0..=16 {
            let tau = i as f64 * 0.5;
            let acc = if i < 4 { 4.0 } else { 0.5 };
            let lateral = if i < 4 { 0.2 } else { -0.2 };
            rows.push((1.0 + tau, 80.0 * tau - 5.0 * tau * tau, acc, lateral));
        }
        for i in 1..=84 {
            let tau = i as f64 * 0.5;
            let altitude = (320.0 - 8.0 * tau).max(0.0);
            let acc = if i == 2 { 2.5 } else { 0.9 };
            rows.push((9.0 + tau, altitude, acc, 0.0));
        }
        FlightAnalysis::new(store_from(&rows), DetectorConfig::default())
    }

    #[test]
    fn test_summary() {
        let analysis = flight();
        let summary = analysis.summarize().unwrap();
        assert_eq!(summary.baseline.row, 2);
        assert_eq!(summary.baseline.t0, 1.0);
        assert_eq!(summary.baseline.a0, 0.0);
        assert_eq!(summary.duration, 51.0);
        assert_eq!(summary.highlights.row(EventKind::Launch), Some(2));
        assert_eq!(summary.highlights.row(EventKind::ThrustEnd), Some(6));
        assert_eq!(summary.highlights.row(EventKind::Apogee), Some(18));
        assert_eq!(summary.highlights.row(EventKind::Deploy), Some(20));
        assert_eq!(summary.highlights.row(EventKind::Land), Some(98));

        let max_velocity = summary.highlights.get(EventKind::MaxVelocity).unwrap();
        assert_eq!(max_velocity.row(), 2);
        assert_abs_diff_eq!(max_velocity.velocity.unwrap(), 80.0, epsilon = 1e-6);
    }

    #[test]
    fn test_curves() {
        let analysis = flight();
        let curves = analysis.curves().unwrap();

        let ascent = curves.ascent.unwrap();
        assert_eq!((ascent.start, ascent.end), (2, 18));
        assert_eq!(ascent.rows.len(), 17);
        assert_abs_diff_eq!(ascent.rows[0].fitted_altitude, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ascent.rows[16].velocity, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ascent.rows[4].relative_time, 2.0, epsilon = 1e-12);

        let descent = curves.descent.unwrap();
        assert_eq!((descent.start, descent.end), (18, 98));
        assert_abs_diff_eq!(descent.rows[10].velocity, -8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_curves_without_launch() {
        let analysis = FlightAnalysis::new(
            store_from(&[
                (0.0, 0.0, 1.0, 0.0),
                (1.0, 3.0, 1.0, 0.0),
                (2.0, 2.6, 1.0, 0.0),
                (3.0, 2.2, 1.0, 0.0),
                (4.0, 1.8, 1.0, 0.0),
                (5.0, 1.4, 1.0, 0.0),
                (6.0, 0.6, 1.0, 0.0),
            ]),
            DetectorConfig::default(),
        );
        let curves = analysis.curves().unwrap();
        assert!(!curves.baseline.from_launch);
        assert!(curves.ascent.is_none());
        assert_eq!(curves.descent.unwrap().rows.len(), 6);
    }

    #[test]
    fn test_short_descent_fails_fit() {
        let analysis = FlightAnalysis::new(
            store_from(&[
                (0.0, 0.0, 1.0, 0.0),
                (1.0, 3.0, 1.0, 0.0),
                (2.0, 0.5, 1.0, 0.0),
            ]),
            DetectorConfig::default(),
        );
        assert!(analysis.curves().unwrap_err().is_degenerate_fit());
        // highlights still come through
        assert!(analysis.summarize().is_ok());
    }
}
