// Flight service - Use cases over the stored flight logs
use crate::application::event_detector::DetectorConfig;
use crate::application::flight_analysis::{FlightAnalysis, FlightCurves, FlightSummary};
use crate::application::flight_repository::FlightRepository;
use crate::domain::error::AnalysisResult;
use crate::domain::flight::Flight;
use crate::domain::sample_store::SampleStore;
use anyhow::Context;
use std::sync::Arc;
use thiserror::Error;

/// The repository has no flight with this id.
#[derive(Debug, Error)]
#[error("flight not found: {0}")]
pub struct FlightNotFound(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct FlightReport {
    pub flight: Flight,
    pub summary: FlightSummary,
}

#[derive(Clone)]
pub struct FlightService {
    repository: Arc<dyn FlightRepository>,
    config: DetectorConfig,
}

impl FlightService {
    pub fn new(repository: Arc<dyn FlightRepository>, config: DetectorConfig) -> Self {
        Self { repository, config }
    }

    pub async fn list_flights(&self) -> anyhow::Result<Vec<Flight>> {
        let ids = self.repository.list_flight_ids().await?;
        Ok(ids.into_iter().map(Flight::new).collect())
    }

    /// Loads and validates one flight's samples.
    pub async fn load_analysis(&self, flight_id: &str) -> anyhow::Result<FlightAnalysis> {
        let samples = self
            .repository
            .load_samples(flight_id)
            .await?
            .ok_or_else(|| FlightNotFound(flight_id.to_string()))?;
        let store = SampleStore::new(samples)
            .with_context(|| format!("invalid samples in flight {}", flight_id))?;

        tracing::debug!("Loaded flight {}: {} samples", flight_id, store.count());
        Ok(FlightAnalysis::new(store, self.config))
    }

    pub async fn highlights(&self, flight_id: &str) -> anyhow::Result<FlightReport> {
        let analysis = self.load_analysis(flight_id).await?;
        let summary = run_blocking(analysis, |a| a.summarize())
            .await
            .with_context(|| format!("analysis of flight {} failed", flight_id))?;

        Ok(FlightReport {
            flight: Flight::new(flight_id.to_string()),
            summary,
        })
    }

    pub async fn curves(&self, flight_id: &str) -> anyhow::Result<FlightCurves> {
        let analysis = self.load_analysis(flight_id).await?;
        run_blocking(analysis, |a| a.curves())
            .await
            .with_context(|| format!("curve fit of flight {} failed", flight_id))
    }

    /// Highlights of every flight, analyzed concurrently. Flights that fail are skipped.
    pub async fn report(&self) -> anyhow::Result<Vec<FlightReport>> {
        let ids = self.repository.list_flight_ids().await?;
        let total = ids.len();

        let tasks = ids.into_iter().map(|id| {
            let service = self.clone();
            async move {
                let result = service.highlights(&id).await;
                (id, result)
            }
        });

        let mut reports = Vec::with_capacity(total);
        for (id, result) in futures::future::join_all(tasks).await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!("Skipping flight {}: {:#}", id, e),
            }
        }

        tracing::info!("Report covers {} of {} flights", reports.len(), total);
        Ok(reports)
    }
}

/// Runs one engine pass off the async executor.
async fn run_blocking<T, F>(analysis: FlightAnalysis, job: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&FlightAnalysis) -> AnalysisResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || job(&analysis))
        .await
        .context("analysis task failed")?;
    Ok(result?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::flight_repository::tests::InMemoryRepository;
    use crate::domain::error::AnalysisError;
    use crate::domain::event::EventKind;

    pub(crate) const SHORT_HOP: [(f64, f64, f64, f64); 11] = [
        (0.0, 0.0, 1.0, 0.0),
        (1.0, 0.0, 1.0, 0.0),
        (2.0, 0.0, 12.0, 0.2),
        (3.0, 50.0, 6.0, 0.1),
        (4.0, 120.0, 0.5, -0.1),
        (5.0, 150.0, 0.5, 0.0),
        (6.0, 140.0, 0.8, 0.0),
        (7.0, 100.0, 2.0, 0.0),
        (8.0, 60.0, 0.9, 0.0),
        (9.0, 20.0, 0.9, 0.0),
        (10.0, 0.5, 3.0, 0.0),
    ];

    pub(crate) fn service() -> FlightService {
        let repository = InMemoryRepository::default()
            .with_flight("short_hop_", &SHORT_HOP)
            .with_flight("backwards", &[(1.0, 0.0, 1.0, 0.0), (0.5, 0.0, 1.0, 0.0)]);
        FlightService::new(Arc::new(repository), DetectorConfig::default())
    }

    #[tokio::test]
    async fn test_list_flights() {
        let flights = service().list_flights().await.unwrap();
        let names: Vec<_> = flights.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["backwards", "short hop"]);
    }

    #[tokio::test]
    async fn test_highlights() {
        let report = service().highlights("short_hop_").await.unwrap();
        assert_eq!(report.flight.name, "short hop");

        let highlights = &report.summary.highlights;
        assert_eq!(highlights.row(EventKind::Launch), Some(2));
        assert_eq!(highlights.row(EventKind::ThrustMax), Some(2));
        assert_eq!(highlights.row(EventKind::ThrustEnd), Some(4));
        assert_eq!(highlights.row(EventKind::Apogee), Some(5));
        assert_eq!(highlights.row(EventKind::Deploy), Some(7));
        assert_eq!(highlights.row(EventKind::Land), Some(10));
        // too few samples for either velocity fit
        assert_eq!(highlights.row(EventKind::MaxVelocity), None);
        assert_eq!(highlights.get(EventKind::Land).unwrap().velocity, None);
    }

    #[tokio::test]
    async fn test_unknown_flight() {
        let err = service().highlights("missing").await.unwrap_err();
        assert!(err.downcast_ref::<FlightNotFound>().is_some());
    }

    #[tokio::test]
    async fn test_invalid_flight_is_analysis_error() {
        let err = service().highlights("backwards").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::NonMonotonicTime { row: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_curves_fit_failure_propagates() {
        let err = service().curves("short_hop_").await.unwrap_err();
        assert!(err.downcast_ref::<AnalysisError>().unwrap().is_degenerate_fit());
    }

    #[tokio::test]
    async fn test_report_skips_failed_flights() {
        let reports = service().report().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].flight.id, "short_hop_");
    }
}
