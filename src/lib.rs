//! MediaFX - declarative media editing on top of ffmpeg
//!
//! This library crate exposes the command-line plumbing for integration testing.

pub mod batch;
pub mod config;
