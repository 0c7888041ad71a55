//! HTTP host for the ingestion handler.

pub mod app;
