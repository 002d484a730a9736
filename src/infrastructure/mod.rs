// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod csv_repository;
pub mod http_response;
pub mod json_mapper;
