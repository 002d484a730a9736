// CSV directory repository implementation - one log file per flight
use crate::application::flight_repository::FlightRepository;
use crate::domain::sample::{Field, Sample};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const LOG_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct CsvFlightRepository {
    directory: PathBuf,
}

impl CsvFlightRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of a flight's log, `None` for ids that could escape the data directory.
    fn log_path(&self, flight_id: &str) -> Option<PathBuf> {
        let valid = !flight_id.is_empty()
            && !flight_id.starts_with('.')
            && flight_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        valid.then(|| self.directory.join(format!("{}.{}", flight_id, LOG_EXTENSION)))
    }
}

#[async_trait]
impl FlightRepository for CsvFlightRepository {
    async fn list_flight_ids(&self) -> Result<Vec<String>> {
        let directory = self.directory.clone();
        tokio::task::spawn_blocking(move || list_logs(&directory)).await?
    }

    async fn load_samples(&self, flight_id: &str) -> Result<Option<Vec<Sample>>> {
        let Some(path) = self.log_path(flight_id) else {
            tracing::debug!("Rejected flight id {:?}", flight_id);
            return Ok(None);
        };
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?;
        if !exists {
            return Ok(None);
        }

        let samples = tokio::task::spawn_blocking(move || -> Result<Vec<Sample>> {
            let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
            parse_samples(file).with_context(|| format!("Failed to parse {}", path.display()))
        })
        .await??;
        Ok(Some(samples))
    }
}

fn list_logs(directory: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("Failed to read data directory {}", directory.display()))?;

    let mut ids = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

/// Reads a header-first CSV log.
///
/// Columns are matched by field name or alias; unrecognized columns are ignored. Rows are
/// numbered by position in the file.
pub fn parse_samples<R: Read>(reader: R) -> Result<Vec<Sample>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader.headers().context("Missing header row")?.clone();
    let mut columns: [Option<usize>; 4] = [None; 4];
    for (index, header) in headers.iter().enumerate() {
        if let Ok(field) = header.parse::<Field>() {
            columns[slot(field)].get_or_insert(index);
        }
    }

    let mut indices = [0usize; 4];
    for field in Field::ALL {
        indices[slot(field)] = columns[slot(field)]
            .with_context(|| format!("Missing column for {}", field))?;
    }

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed record at row {}", row))?;
        let mut values = [0.0; 4];
        for field in Field::ALL {
            let raw = record
                .get(indices[slot(field)])
                .with_context(|| format!("Row {} has no {} value", row, field))?;
            values[slot(field)] = raw
                .parse::<f64>()
                .with_context(|| format!("Row {}: invalid {} value {:?}", row, field, raw))?;
        }
        samples.push(Sample::new(row, values[0], values[1], values[2], values[3]));
    }

    Ok(samples)
}

fn slot(field: Field) -> usize {
    match field {
        Field::Time => 0,
        Field::Altitude => 1,
        Field::Acceleration => 2,
        Field::AccelerationX => 3,
    }
}
