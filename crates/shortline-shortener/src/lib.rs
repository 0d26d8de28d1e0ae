//! URL shortener service implementation.
//!
//! This crate provides the request coordinator and the bounded write
//! pipeline that applies accepted mappings to storage and the Bloom filter.
//! Core types live in `shortline_core`.

pub mod error;
pub mod pipeline;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{ConfigError, PipelineError};
pub use pipeline::{PipelineConfig, Task, WritePipeline};
pub use service::{ShortenerConfig, ShortenerService};
