//! Client library for the resume analysis service.
//!
//! The binary in `main.rs` is a thin driver; everything testable lives
//! here: configuration, upload-file validation, the wire model, the
//! response normalizer, and the HTTP transport client.

pub mod api_client;
pub mod config;
pub mod models;
pub mod normalize;
pub mod upload;
