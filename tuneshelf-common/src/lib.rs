//! # Tuneshelf Common Library
//!
//! Shared code for the tuneshelf ingestion function:
//! - Name normalization for lookup keys
//! - Track metadata and view record models
//! - Configuration loading
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;

pub use error::{Error, Result};
pub use normalize::{normalize, UNKNOWN_KEY};
