// Flight-phase event detection over a complete sample sequence
use crate::application::curve_fitter::{CurveFitter, DEFAULT_FIT_DEGREE};
use crate::domain::error::AnalysisResult;
use crate::domain::sample::Field;
use crate::domain::sample_store::{Baseline, SampleStore};
use serde::Deserialize;
use std::cell::OnceCell;

/// Tunable detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Acceleration (g) that marks powered flight.
    pub launch_accel_g: f64,
    /// Acceleration (g) below which the sustainer is coasting before second-stage ignition.
    pub second_stage_dip_g: f64,
    /// Post-apogee acceleration (g) taken as recovery deployment. May also catch turbulence.
    pub deploy_accel_g: f64,
    /// Altitude (m) under which the rocket is on the ground.
    pub land_altitude_m: f64,
    /// Upper acceleration bound (g) of the parachute-stabilized descent regime.
    pub descent_accel_g: f64,
    /// Width (s) of the quiescent window used for the landing velocity fit.
    pub land_velocity_window_s: f64,
    pub fit_degree: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            launch_accel_g: 1.5,
            second_stage_dip_g: 1.0,
            deploy_accel_g: 1.0,
            land_altitude_m: 1.0,
            descent_accel_g: 1.0,
            land_velocity_window_s: 2.0,
            fit_degree: DEFAULT_FIT_DEGREE,
        }
    }
}

/// A velocity read off a fitted curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPoint {
    pub row: usize,
    pub time: f64,
    pub velocity: f64,
}

/// Detectors for one analysis pass.
///
/// Each detector is computed at most once. A detector whose prerequisite event is missing
/// reports `None` without scanning.
pub struct EventDetector<'a> {
    store: &'a SampleStore,
    config: DetectorConfig,
    launch: OnceCell<Option<usize>>,
    apogee: OnceCell<Option<usize>>,
    thrust_max: OnceCell<Option<usize>>,
    thrust_end: OnceCell<Option<usize>>,
    second_stage: OnceCell<Option<usize>>,
    deploy: OnceCell<Option<usize>>,
    land: OnceCell<Option<usize>>,
    max_velocity: OnceCell<AnalysisResult<Option<VelocityPoint>>>,
    land_velocity: OnceCell<AnalysisResult<Option<VelocityPoint>>>,
}

impl<'a> EventDetector<'a> {
    pub fn new(store: &'a SampleStore, config: DetectorConfig) -> Self {
        Self {
            store,
            config,
            launch: OnceCell::new(),
            apogee: OnceCell::new(),
            thrust_max: OnceCell::new(),
            thrust_end: OnceCell::new(),
            second_stage: OnceCell::new(),
            deploy: OnceCell::new(),
            land: OnceCell::new(),
            max_velocity: OnceCell::new(),
            land_velocity: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &'a SampleStore {
        self.store
    }

    pub fn baseline(&self) -> Baseline {
        self.store.baseline(self.launch())
    }

    pub fn fitter(&self) -> CurveFitter<'a> {
        CurveFitter::new(self.store, self.baseline(), self.config.fit_degree)
    }

    /// First row whose acceleration exceeds the launch threshold.
    pub fn launch(&self) -> Option<usize> {
        *self.launch.get_or_init(|| {
            let threshold = self.config.launch_accel_g;
            let row = self
                .store
                .series(Field::Acceleration)
                .iter()
                .position(|&a| a > threshold);
            tracing::debug!("launch: {:?}", row);
            row
        })
    }

    /// First row holding the maximum altitude.
    pub fn apogee(&self) -> Option<usize> {
        *self.apogee.get_or_init(|| {
            let row = first_max(self.store.series(Field::Altitude));
            tracing::debug!("apogee: {:?}", row);
            row
        })
    }

    /// First row of peak acceleration up to and including apogee.
    pub fn thrust_max(&self) -> Option<usize> {
        *self.thrust_max.get_or_init(|| {
            let apogee = self.apogee()?;
            first_max(&self.store.series(Field::Acceleration)[..=apogee])
        })
    }

    /// First row after launch where lateral acceleration changes sign.
    pub fn thrust_end(&self) -> Option<usize> {
        *self.thrust_end.get_or_init(|| {
            let launch = self.launch()?;
            let lateral = self.store.series(Field::AccelerationX);
            let positive = lateral[launch] > 0.0;
            let row = (launch..lateral.len()).find(|&r| {
                let a = lateral[r];
                (positive && a < 0.0) || (!positive && a > 0.0)
            });
            tracing::debug!("thrust end: {:?}", row);
            row
        })
    }

    /// Row after the first acceleration dip between launch and thrust end (exclusive).
    pub fn second_stage_ignition(&self) -> Option<usize> {
        *self.second_stage.get_or_init(|| {
            let launch = self.launch()?;
            let thrust_end = self.thrust_end()?;
            let accelerations = self.store.series(Field::Acceleration);
            let dip = (launch..thrust_end)
                .find(|&r| accelerations[r] < self.config.second_stage_dip_g)?;
            let row = dip + 1;
            (row < self.store.count()).then_some(row)
        })
    }

    /// First row from apogee onward with a deployment-sized acceleration.
    pub fn deploy(&self) -> Option<usize> {
        *self.deploy.get_or_init(|| {
            let apogee = self.apogee()?;
            let accelerations = self.store.series(Field::Acceleration);
            (apogee..accelerations.len()).find(|&r| accelerations[r] > self.config.deploy_accel_g)
        })
    }

    /// First row from apogee onward below the ground altitude.
    pub fn land(&self) -> Option<usize> {
        *self.land.get_or_init(|| {
            let apogee = self.apogee()?;
            let altitudes = self.store.series(Field::Altitude);
            (apogee..altitudes.len()).find(|&r| altitudes[r] < self.config.land_altitude_m)
        })
    }

    /// Peak of the ascent velocity curve, sampled at each row's time.
    pub fn max_velocity(&self) -> AnalysisResult<Option<VelocityPoint>> {
        self.max_velocity
            .get_or_init(|| {
                let (Some(launch), Some(apogee)) = (self.launch(), self.apogee()) else {
                    return Ok(None);
                };
                if apogee < launch {
                    return Ok(None);
                }

                let curve = self.fitter().velocity_curve(launch, apogee)?;
                let times = self.store.series(Field::Time);
                let mut best: Option<VelocityPoint> = None;
                for row in launch..=apogee {
                    let velocity = curve.evaluate(times[row]);
                    if best.is_none_or(|b| velocity > b.velocity) {
                        best = Some(VelocityPoint {
                            row,
                            time: times[row],
                            velocity,
                        });
                    }
                }
                Ok(best)
            })
            .clone()
    }

    /// Descent rate just before landing, away from deployment and impact transients.
    ///
    /// Uses the last row at or under the descent acceleration bound before landing, and the
    /// rows up to `land_velocity_window_s` seconds ahead of it.
    pub fn land_velocity(&self) -> AnalysisResult<Option<VelocityPoint>> {
        self.land_velocity
            .get_or_init(|| {
                let (Some(apogee), Some(land)) = (self.apogee(), self.land()) else {
                    return Ok(None);
                };
                let accelerations = self.store.series(Field::Acceleration);
                let times = self.store.series(Field::Time);

                let Some(prev) = (apogee..=land)
                    .rev()
                    .find(|&r| accelerations[r] <= self.config.descent_accel_g)
                else {
                    return Ok(None);
                };

                let window_start = times[prev] - self.config.land_velocity_window_s;
                let mut start = prev;
                while start > apogee && times[start - 1] >= window_start {
                    start -= 1;
                }
                let end = (prev + 1).min(self.store.count() - 1);

                let curve = self.fitter().velocity_curve(start, end)?;
                let time = (times[start] + times[prev]) / 2.0;
                Ok(Some(VelocityPoint {
                    row: prev,
                    time,
                    velocity: curve.evaluate(time),
                }))
            })
            .clone()
    }
}

/// Index of the first maximum.
fn first_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.is_none_or(|b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_store::tests::store_from;
    use approx::assert_abs_diff_eq;

    fn scenario_store() -> SampleStore {
        store_from(&[
            (0.0, 120.0, 0.2, 0.2),
            (1.0, 0.0, 2.0, 1.0),
            (2.0, 300.0, 3.0, 0.5),
            (3.0, 450.0, 1.2, -0.3),
            (4.0, 500.0, 0.0, 0.0),
            (5.0, 480.0, 1.5, 0.1),
            (6.0, 0.5, 1.0, 0.0),
        ])
    }

    /// Flight sampled at 10 Hz: boost at 40 m/s² from t = 1 to t = 4, coast to apogee at t = 10,
    /// then a steady 24 m/s descent until touchdown at t = 32.5.
    fn full_flight_store() -> SampleStore {
        let rows: Vec<_> = (0..=400)
            .map(|i| {
                let t = i as f64 * 0.1;
                let (altitude, acceleration, lateral) = match i {
                    0..=9 => (0.0, 1.0, 0.1),
                    10..=40 => {
                        let tau = t - 1.0;
                        (20.0 * tau * tau, 5.0, 0.3)
                    }
                    41..=100 => {
                        let tau = t - 4.0;
                        (180.0 + 120.0 * tau - 10.0 * tau * tau, 0.2, -0.2)
                    }
                    _ => {
                        let altitude = (540.0 - 24.0 * (t - 10.0)).max(0.0);
                        let acceleration = match i {
                            101..=105 => 3.0,
                            _ if altitude < 1.0 => 4.0,
                            _ => 0.9,
                        };
                        (altitude, acceleration, 0.0)
                    }
                };
                (t, altitude, acceleration, lateral)
            })
            .collect();
        store_from(&rows)
    }

    #[test]
    fn test_scenario_events() {
        let store = scenario_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert_eq!(detector.launch(), Some(1));
        assert_eq!(detector.apogee(), Some(4));
        assert_eq!(detector.deploy(), Some(5));
        assert_eq!(detector.land(), Some(6));
        assert_eq!(detector.thrust_end(), Some(3));
        assert_eq!(detector.thrust_max(), Some(2));
        assert_eq!(detector.second_stage_ignition(), None);
    }

    #[test]
    fn test_scenario_baseline_from_launch() {
        let store = scenario_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        let baseline = detector.baseline();
        assert_eq!(baseline.row, 1);
        assert_eq!(baseline.t0, 1.0);
        assert_eq!(baseline.a0, 0.0);
    }

    #[test]
    fn test_scenario_velocity_fit_is_degenerate() {
        // launch..=apogee spans only four rows
        let store = scenario_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert!(detector.max_velocity().unwrap_err().is_degenerate_fit());
    }

    #[test]
    fn test_no_launch_cascades() {
        let store = store_from(&[
            (0.0, 0.0, 1.0, 0.1),
            (1.0, 5.0, 1.2, -0.1),
            (2.0, 3.0, 0.9, 0.2),
        ]);
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert_eq!(detector.launch(), None);
        assert_eq!(detector.thrust_end(), None);
        assert_eq!(detector.second_stage_ignition(), None);
        assert_eq!(detector.max_velocity(), Ok(None));
        assert_eq!(detector.baseline().row, 0);
        assert!(!detector.baseline().from_launch);
    }

    #[test]
    fn test_apogee_ties_pick_first_row() {
        let store = store_from(&[
            (0.0, 10.0, 2.0, 0.0),
            (1.0, 50.0, 2.0, 0.0),
            (2.0, 50.0, 0.5, 0.0),
            (3.0, 20.0, 0.5, 0.0),
        ]);
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert_eq!(detector.apogee(), Some(1));
        assert_eq!(store.series(Field::Altitude)[1], 50.0);
    }

    #[test]
    fn test_thrust_max_ties_pick_first_row() {
        let store = store_from(&[
            (0.0, 0.0, 4.0, 0.0),
            (1.0, 50.0, 4.0, 0.0),
            (2.0, 80.0, 0.5, 0.0),
            (3.0, 20.0, 9.0, 0.0),
        ]);
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert_eq!(detector.apogee(), Some(2));
        // the 9 g spike after apogee is outside the window
        assert_eq!(detector.thrust_max(), Some(0));
    }

    #[test]
    fn test_second_stage_ignition() {
        let store = store_from(&[
            (0.0, 0.0, 0.1, 0.0),
            (1.0, 10.0, 3.0, 0.5),
            (2.0, 40.0, 0.6, 0.4),
            (3.0, 80.0, 2.5, 0.4),
            (4.0, 120.0, 0.3, -0.2),
            (5.0, 130.0, 0.1, -0.1),
        ]);
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert_eq!(detector.thrust_end(), Some(4));
        assert_eq!(detector.second_stage_ignition(), Some(3));
    }

    #[test]
    fn test_full_flight_ordering() {
        let store = full_flight_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        let launch = detector.launch().unwrap();
        let thrust_max = detector.thrust_max().unwrap();
        let apogee = detector.apogee().unwrap();
        assert!(launch <= thrust_max && thrust_max <= apogee);
        assert_eq!(detector.thrust_end(), Some(41));
        assert_eq!(detector.second_stage_ignition(), None);
        assert!(detector.deploy().unwrap() > apogee);
        assert!(detector.land().unwrap() > detector.deploy().unwrap());
    }

    #[test]
    fn test_full_flight_max_velocity_at_burnout() {
        let store = full_flight_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        let point = detector.max_velocity().unwrap().unwrap();
        // boost ends at t = 4 with 120 m/s; a quartic only approximates the kink
        assert!(point.time > 2.0 && point.time < 7.0, "peak at {}", point.time);
        assert!(point.velocity > 80.0 && point.velocity < 160.0);
    }

    #[test]
    fn test_full_flight_land_velocity() {
        let store = full_flight_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        let land = detector.land().unwrap();
        let point = detector.land_velocity().unwrap().unwrap();
        assert_eq!(land, 325);
        // touchdown shock at the landing row pushes the quiescent row back by one
        assert_eq!(point.row, 324);
        assert_abs_diff_eq!(point.velocity, -24.0, epsilon = 1e-3);
    }

    #[test]
    fn test_memoized_results_are_stable() {
        let store = scenario_store();
        let detector = EventDetector::new(&store, DetectorConfig::default());
        assert_eq!(detector.apogee(), detector.apogee());
        assert_eq!(detector.max_velocity(), detector.max_velocity());
    }

    #[test]
    fn test_custom_thresholds() {
        let store = scenario_store();
        let config = DetectorConfig {
            launch_accel_g: 2.5,
            ..DetectorConfig::default()
        };
        let detector = EventDetector::new(&store, config);
        assert_eq!(detector.launch(), Some(2));
    }

    #[test]
    fn test_first_max() {
        assert_eq!(first_max(&[]), None);
        assert_eq!(first_max(&[1.0, 3.0, 3.0, 2.0]), Some(1));
    }
}
