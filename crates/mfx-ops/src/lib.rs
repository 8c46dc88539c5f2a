//! # mfx-ops
//!
//! The operations MediaFX offers, wired together from the graph builders in
//! `mfx-graph` and the services in `mfx-av`.
//!
//! Every media operation follows the same shape: resolve its sources into
//! owned temp files, probe them, build one or more invocations, run them,
//! then release the inputs. Only the final output survives, handed to the
//! caller as a file-backed payload. A failure at any step leaves nothing
//! behind in the temp directory.
//!
//! - [`Operation`]: the tagged descriptor a work item carries.
//! - [`OpContext`]: the shared services.
//! - [`run_item`] / [`run_batch`]: dispatch.
//! - [`guidance`]: engine diagnostics to user-facing messages.

pub mod audio;
pub mod batch;
pub mod context;
pub mod edit;
pub mod fonts;
pub mod guidance;
pub mod item;
pub mod merge;
pub mod operation;
pub mod overlay;
pub mod text;
pub mod transition;

#[cfg(test)]
mod testing;

pub use batch::{run_batch, run_item, BatchAborted, ErrorRecord, ItemResult};
pub use context::OpContext;
pub use item::{ItemOutput, WorkItem, PRIMARY_OUTPUT};
pub use operation::Operation;
