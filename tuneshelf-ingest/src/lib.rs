//! tuneshelf-ingest library interface
//!
//! Exposes the ingestion pipeline for the Lambda entry point and for
//! integration testing.

pub mod aws;
pub mod error;
pub mod event;
pub mod memory;
pub mod orchestrator;
pub mod store;
pub mod tags;
pub mod writer;

pub use crate::error::{IngestError, IngestResult};
pub use crate::orchestrator::{IngestReport, IngestionOrchestrator, ObjectReport};
