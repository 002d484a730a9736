// Repository trait for flight log access
use crate::domain::sample::Sample;
use async_trait::async_trait;

#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// List all available flight IDs, sorted
    async fn list_flight_ids(&self) -> anyhow::Result<Vec<String>>;

    /// Load the raw samples of one flight, `None` when no such flight exists
    async fn load_samples(&self, flight_id: &str) -> anyhow::Result<Option<Vec<Sample>>>;
}
