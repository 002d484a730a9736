// Domain layer - Flight data model and pure numerics
pub mod error;
pub mod event;
pub mod flight;
pub mod polynomial;
pub mod sample;
pub mod sample_store;
