//! Ismforge - Smooth Streaming manifest generator
//!
//! This library crate exposes the pipeline for the CLI and integration tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod pipeline;
pub mod storage;
pub mod subtitles;
