/// Query-builder clients over the relational store.
pub mod data_store;
/// Database row definitions.
pub mod models;
/// Typed per-table access for profiles and their dependent rows.
pub mod profile;
/// Store-agnostic query description.
pub mod query;
/// Storage error types shared by every backend.
pub mod storage;
