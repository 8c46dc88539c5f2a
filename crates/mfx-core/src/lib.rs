//! mfx-core: shared types, errors and configuration.
//!
//! This crate is the foundational dependency for all other mfx-* crates,
//! providing the unified error type, media-domain types (source descriptors,
//! probe results, alignment and mixing enums) and the application
//! configuration.

pub mod config;
pub mod error;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, ErrorKind, Result};
pub use media::*;
