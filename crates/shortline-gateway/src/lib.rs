//! HTTP front end for the Shortline URL shortener.
//!
//! The router in [`app`] exposes `POST /shorten`, `GET /{code}` and
//! `GET /health` on top of any [`Shortener`](shortline_core::Shortener).

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
