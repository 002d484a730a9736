// Annotation service - Frame-synchronized telemetry for video overlay
use crate::application::flight_analysis::FlightAnalysis;
use crate::application::flight_service::FlightService;
use crate::application::resampler::Resampler;
use crate::domain::error::AnalysisResult;
use crate::domain::sample::Field;
use std::time::Instant;
use tokio::sync::mpsc;

pub const DEFAULT_FRAMES_PER_CHUNK: usize = 30;

/// Video timing supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    /// Seconds into the video at which the launch happens.
    pub video_launch: f64,
    /// Video length in seconds.
    pub duration: f64,
    pub fps: f64,
}

/// Bar gauge scale: limit plus tick spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauge {
    pub limit: f64,
    pub tick: f64,
}

impl Gauge {
    /// Smallest multiple of `step` (at least one step) that covers `peak`.
    pub fn covering(peak: f64, step: f64) -> Self {
        let steps = (peak / step).ceil().max(1.0);
        let limit = steps * step;
        Self {
            limit,
            tick: limit / 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnnotation {
    pub index: usize,
    pub video_time: f64,
    pub data_time: f64,
    pub altitude: f64,
    pub peak_altitude: f64,
    pub acceleration: f64,
    pub peak_acceleration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSkeleton {
    pub flight_id: String,
    pub frame_count: usize,
    pub fps: f64,
    pub data_start: f64,
    pub altitude: Gauge,
    pub acceleration: Gauge,
}

/// Gauges plus one annotation per video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTrack {
    pub data_start: f64,
    pub altitude: Gauge,
    pub acceleration: Gauge,
    pub frames: Vec<FrameAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationMessage {
    Skeleton(FrameSkeleton),
    Frames(Vec<FrameAnnotation>),
    Complete { frames: usize, duration_ms: u64 },
    Error(String),
}

/// Resamples altitude and acceleration onto the video frame clock.
///
/// Frame 0 shows the data at `launch_time - video_launch`; the launch time is 0 when no
/// launch was detected. Gauges are scaled to the whole flight.
pub fn build_frame_track(
    analysis: &FlightAnalysis,
    request: &FrameRequest,
) -> AnalysisResult<FrameTrack> {
    let store = analysis.store();
    let launch_time = match analysis.detector().launch() {
        Some(row) => store.field(row, Field::Time)?,
        None => 0.0,
    };
    let data_start = launch_time - request.video_launch;
    let step = 1.0 / request.fps;

    let resampler = Resampler::for_store(store);
    let altitudes = resampler.resample(store.series(Field::Altitude), data_start, request.duration, step)?;
    let accelerations =
        resampler.resample(store.series(Field::Acceleration), data_start, request.duration, step)?;

    let altitude = Gauge::covering(series_max(store.series(Field::Altitude)), 100.0);
    let acceleration = Gauge::covering(series_max(store.series(Field::Acceleration)), 10.0);

    let mut peak_altitude = 0.0_f64;
    let mut peak_acceleration = 0.0_f64;
    let frames = altitudes
        .into_iter()
        .zip(accelerations)
        .enumerate()
        .map(|(index, (altitude, acceleration))| {
            peak_altitude = peak_altitude.max(altitude);
            peak_acceleration = peak_acceleration.max(acceleration);
            let video_time = index as f64 * step;
            FrameAnnotation {
                index,
                video_time,
                data_time: data_start + video_time,
                altitude,
                peak_altitude,
                acceleration,
                peak_acceleration,
            }
        })
        .collect();

    Ok(FrameTrack {
        data_start,
        altitude,
        acceleration,
        frames,
    })
}

fn series_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[derive(Clone)]
pub struct AnnotationService {
    flights: FlightService,
    frames_per_chunk: usize,
}

impl AnnotationService {
    pub fn new(flights: FlightService, frames_per_chunk: usize) -> Self {
        Self {
            flights,
            frames_per_chunk: frames_per_chunk.max(1),
        }
    }

    /// Streams a skeleton, the frames in chunks, then a completion message.
    ///
    /// Loading failures are returned directly; analysis failures arrive as an error message.
    pub async fn stream_frames(
        &self,
        flight_id: &str,
        request: FrameRequest,
    ) -> anyhow::Result<mpsc::Receiver<AnnotationMessage>> {
        let start_time = Instant::now();
        let analysis = self.flights.load_analysis(flight_id).await?;
        let (tx, rx) = mpsc::channel(100);
        let flight_id = flight_id.to_string();
        let frames_per_chunk = self.frames_per_chunk;

        tokio::spawn(async move {
            let track = tokio::task::spawn_blocking(move || build_frame_track(&analysis, &request)).await;
            let track = match track {
                Ok(Ok(track)) => track,
                Ok(Err(e)) => {
                    tracing::warn!("Annotation of flight {} failed: {}", flight_id, e);
                    let _ = tx.send(AnnotationMessage::Error(e.to_string())).await;
                    return;
                }
                Err(e) => {
                    tracing::error!("Annotation task for flight {} failed: {}", flight_id, e);
                    let _ = tx.send(AnnotationMessage::Error(e.to_string())).await;
                    return;
                }
            };

            let frame_count = track.frames.len();
            let skeleton = FrameSkeleton {
                flight_id,
                frame_count,
                fps: request.fps,
                data_start: track.data_start,
                altitude: track.altitude,
                acceleration: track.acceleration,
            };
            if tx.send(AnnotationMessage::Skeleton(skeleton)).await.is_err() {
                return;
            }

            for chunk in track.frames.chunks(frames_per_chunk) {
                if tx.send(AnnotationMessage::Frames(chunk.to_vec())).await.is_err() {
                    return;
                }
            }

            let duration_ms = start_time.elapsed().as_millis() as u64;
            let _ = tx
                .send(AnnotationMessage::Complete {
                    frames: frame_count,
                    duration_ms,
                })
                .await;
        });

        Ok(rx)
    }
}
