//! # mfx-graph
//!
//! Filter graph construction for MediaFX. Nothing in this crate touches the
//! filesystem or spawns processes: every builder takes resolved paths plus
//! probe results and returns an [`Invocation`] ready for the engine.
//!
//! - [`graph`]: typed filters, chains and pads with label validation.
//! - [`escape`]: escaping of free text for the filter syntax.
//! - [`merge`], [`transition`], [`audio`], [`text`], [`overlay`], [`edit`]:
//!   per-operation builders.
//! - [`subtitle`]: SubRip parsing.

pub mod audio;
pub mod edit;
pub mod escape;
pub mod graph;
pub mod invocation;
pub mod merge;
pub mod overlay;
pub mod subtitle;
pub mod text;
pub mod transition;

pub use graph::{Chain, Filter, FilterGraph, Pad, StreamKind};
pub use invocation::{silence_duration, Input, Invocation, SILENCE_FLOOR_SECS};
pub use transition::{BlendStrategy, TransitionPlan, CROSSFADE_CATALOG, FADE_FAMILY};
