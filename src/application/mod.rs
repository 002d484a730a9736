// Application layer - Engine composition and use cases
pub mod annotation_service;
pub mod curve_fitter;
pub mod event_detector;
pub mod flight_analysis;
pub mod flight_repository;
pub mod flight_service;
pub mod highlights;
pub mod resampler;
