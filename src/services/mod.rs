/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Aggregated profile reads and sectioned updates.
pub mod profile_service;
/// Relative "time ago" formatting.
pub mod relative_time;
