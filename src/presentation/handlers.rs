// HTTP handlers
use crate::application::annotation_service::FrameRequest;
use crate::application::flight_service::FlightNotFound;
use crate::domain::error::AnalysisError;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, error_response, json_response};
use crate::infrastructure::json_mapper::{curves_to_dto, flight_to_dto, report_to_dto};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct FramesQuery {
    pub video_launch: f64,
    pub duration: f64,
    pub fps: f64,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all flights
pub async fn list_flights(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    match state.flight_service.list_flights().await {
        Ok(flights) => {
            let flights: Vec<_> = flights.into_iter().map(flight_to_dto).collect();
            respond(&flights, &headers).await
        }
        Err(e) => failure(e),
    }
}

/// Detected events of one flight
pub async fn flight_highlights(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    match state.flight_service.highlights(&id).await {
        Ok(report) => respond(&report_to_dto(report), &headers).await,
        Err(e) => failure(e),
    }
}

/// Fitted ascent and descent curves of one flight
pub async fn flight_curves(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    match state.flight_service.curves(&id).await {
        Ok(curves) => respond(&curves_to_dto(&id, curves), &headers).await,
        Err(e) => failure(e),
    }
}

/// Stream per-frame annotations for a video of one flight
pub async fn stream_frames(
    Path(id): Path<String>,
    Query(query): Query<FramesQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    let request = FrameRequest {
        video_launch: query.video_launch,
        duration: query.duration,
        fps: query.fps,
    };

    match state.annotation_service.stream_frames(&id, request).await {
        Ok(rx) => stream_from_receiver(rx, accepts_brotli(&headers)),
        Err(e) => failure(e),
    }
}

/// Highlights of every flight that can be analyzed
pub async fn flight_report(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    match state.flight_service.report().await {
        Ok(reports) => {
            let reports: Vec<_> = reports.into_iter().map(report_to_dto).collect();
            respond(&reports, &headers).await
        }
        Err(e) => failure(e),
    }
}

async fn respond<T: Serialize>(data: &T, headers: &HeaderMap) -> Response<Body> {
    match json_response(data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn failure(error: anyhow::Error) -> Response<Body> {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!("Request failed: {:#}", error);
    } else {
        tracing::debug!("Request rejected: {:#}", error);
    }
    error_response(status, &format!("{:#}", error))
}

/// Unknown flights are 404, engine failures 422, anything else 500.
fn status_for(error: &anyhow::Error) -> StatusCode {
    if error.downcast_ref::<FlightNotFound>().is_some() {
        StatusCode::NOT_FOUND
    } else if error.downcast_ref::<AnalysisError>().is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::annotation_service::AnnotationService;
    use crate::application::flight_service::tests::service;
    use anyhow::Context;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            flight_service: service(),
            annotation_service: AnnotationService::new(service(), 4),
        })
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let not_found = anyhow::Error::new(FlightNotFound("x".to_string()));
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);

        let analysis: anyhow::Result<()> = Err(AnalysisError::EmptyLog).context("loading x");
        assert_eq!(status_for(&analysis.unwrap_err()), StatusCode::UNPROCESSABLE_ENTITY);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(status_for(&other), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_list_flights() {
        let response = list_flights(HeaderMap::new(), State(state())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value[1]["name"], "short hop");
    }

    #[tokio::test]
    async fn test_highlights_and_errors() {
        let response =
            flight_highlights(Path("short_hop_".to_string()), HeaderMap::new(), State(state()))
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["events"][0]["kind"], "launch");

        let response =
            flight_highlights(Path("missing".to_string()), HeaderMap::new(), State(state())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            flight_highlights(Path("backwards".to_string()), HeaderMap::new(), State(state()))
                .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_report() {
        let response = flight_report(HeaderMap::new(), State(state())).await;
        let value = body_json(response).await;
        assert_eq!(value.as_array().unwrap().len(), 1);
    }
}
