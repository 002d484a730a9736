// Mapper to convert domain models to JSON transfer objects
use crate::application::annotation_service::{AnnotationMessage, FrameAnnotation, Gauge};
use crate::application::flight_analysis::{CurveRow, CurveTable, FlightCurves};
use crate::application::flight_service::FlightReport;
use crate::domain::event::Event;
use crate::domain::flight::Flight;
use crate::domain::sample_store::Baseline;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FlightDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct BaselineDto {
    pub row: usize,
    pub time: f64,
    pub altitude: f64,
    pub from_launch: bool,
}

#[derive(Debug, Serialize)]
pub struct EventDto {
    pub kind: &'static str,
    pub row: usize,
    pub time: f64,
    pub altitude: f64,
    pub acceleration: f64,
    pub acceleration_x: f64,
    /// Seconds since the baseline
    pub relative_time: f64,
    /// Meters above the baseline
    pub relative_altitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HighlightsDto {
    pub flight: FlightDto,
    pub sample_count: usize,
    pub duration: f64,
    pub baseline: BaselineDto,
    pub events: Vec<EventDto>,
}

#[derive(Debug, Serialize)]
pub struct CurveRowDto {
    pub row: usize,
    pub time: f64,
    pub relative_time: f64,
    pub altitude: f64,
    pub fitted_altitude: f64,
    pub velocity: f64,
}

#[derive(Debug, Serialize)]
pub struct CurveTableDto {
    pub segment: &'static str,
    pub start: usize,
    pub end: usize,
    pub altitude_coefficients: Vec<f64>,
    pub velocity_coefficients: Vec<f64>,
    pub rows: Vec<CurveRowDto>,
}

#[derive(Debug, Serialize)]
pub struct CurvesDto {
    pub flight_id: String,
    pub baseline: BaselineDto,
    pub ascent: Option<CurveTableDto>,
    pub descent: Option<CurveTableDto>,
}

#[derive(Debug, Serialize)]
pub struct GaugeDto {
    pub limit: f64,
    pub tick: f64,
}

#[derive(Debug, Serialize)]
pub struct FrameDto {
    pub index: usize,
    pub video_time: f64,
    pub data_time: f64,
    pub altitude: f64,
    pub peak_altitude: f64,
    pub acceleration: f64,
    pub peak_acceleration: f64,
}

/// One chunk of the frame annotation stream
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessageDto {
    Skeleton {
        flight_id: String,
        frame_count: usize,
        fps: f64,
        data_start: f64,
        altitude: GaugeDto,
        acceleration: GaugeDto,
    },
    Frames {
        frames: Vec<FrameDto>,
    },
    Complete {
        frames: usize,
        duration_ms: u64,
    },
    Error {
        message: String,
    },
}

pub fn flight_to_dto(flight: Flight) -> FlightDto {
    FlightDto {
        id: flight.id,
        name: flight.name,
    }
}

fn baseline_to_dto(baseline: &Baseline) -> BaselineDto {
    BaselineDto {
        row: baseline.row,
        time: baseline.t0,
        altitude: baseline.a0,
        from_launch: baseline.from_launch,
    }
}

fn event_to_dto(event: &Event, baseline: &Baseline) -> EventDto {
    let sample = event.sample;
    let (relative_time, relative_altitude) = baseline.relative(sample.time, sample.altitude);
    EventDto {
        kind: event.kind.name(),
        row: sample.row,
        time: sample.time,
        altitude: sample.altitude,
        acceleration: sample.acceleration,
        acceleration_x: sample.acceleration_x,
        relative_time,
        relative_altitude,
        velocity: event.velocity,
    }
}

pub fn report_to_dto(report: FlightReport) -> HighlightsDto {
    let summary = report.summary;
    let events = summary
        .highlights
        .events()
        .iter()
        .map(|e| event_to_dto(e, &summary.baseline))
        .collect();

    HighlightsDto {
        flight: flight_to_dto(report.flight),
        sample_count: summary.sample_count,
        duration: summary.duration,
        baseline: baseline_to_dto(&summary.baseline),
        events,
    }
}

fn curve_row_to_dto(row: &CurveRow) -> CurveRowDto {
    CurveRowDto {
        row: row.row,
        time: row.time,
        relative_time: row.relative_time,
        altitude: row.altitude,
        fitted_altitude: row.fitted_altitude,
        velocity: row.velocity,
    }
}

fn curve_table_to_dto(table: CurveTable) -> CurveTableDto {
    CurveTableDto {
        segment: table.segment.name(),
        start: table.start,
        end: table.end,
        altitude_coefficients: table.altitude.coefficients().to_vec(),
        velocity_coefficients: table.velocity.coefficients().to_vec(),
        rows: table.rows.iter().map(curve_row_to_dto).collect(),
    }
}

pub fn curves_to_dto(flight_id: &str, curves: FlightCurves) -> CurvesDto {
    CurvesDto {
        flight_id: flight_id.to_string(),
        baseline: baseline_to_dto(&curves.baseline),
        ascent: curves.ascent.map(curve_table_to_dto),
        descent: curves.descent.map(curve_table_to_dto),
    }
}

fn gauge_to_dto(gauge: Gauge) -> GaugeDto {
    GaugeDto {
        limit: gauge.limit,
        tick: gauge.tick,
    }
}

fn frame_to_dto(frame: &FrameAnnotation) -> FrameDto {
    FrameDto {
        index: frame.index,
        video_time: frame.video_time,
        data_time: frame.data_time,
        altitude: frame.altitude,
        peak_altitude: frame.peak_altitude,
        acceleration: frame.acceleration,
        peak_acceleration: frame.peak_acceleration,
    }
}

pub fn message_to_dto(message: AnnotationMessage) -> StreamMessageDto {
    match message {
        AnnotationMessage::Skeleton(skeleton) => StreamMessageDto::Skeleton {
            flight_id: skeleton.flight_id,
            frame_count: skeleton.frame_count,
            fps: skeleton.fps,
            data_start: skeleton.data_start,
            altitude: gauge_to_dto(skeleton.altitude),
            acceleration: gauge_to_dto(skeleton.acceleration),
        },
        AnnotationMessage::Frames(frames) => StreamMessageDto::Frames {
            frames: frames.iter().map(frame_to_dto).collect(),
        },
        AnnotationMessage::Complete { frames, duration_ms } => {
            StreamMessageDto::Complete { frames, duration_ms }
        }
        AnnotationMessage::Error(message) => StreamMessageDto::Error { message },
    }
}
