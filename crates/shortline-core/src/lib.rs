//! Core types and traits for the Shortline URL shortener.
//!
//! This crate provides the short code type and its base62 encoding, the
//! error taxonomy, and the repository and shortener traits shared by the
//! storage, shortener and gateway crates.

pub mod base62;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{CoreError, ShortenerError, StorageError};
pub use repository::Repository;
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, Shortener};
