//! # mfx-av
//!
//! Everything in MediaFX that touches the outside world: external tools,
//! the network and the temp directory.
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- spawns a tool and keeps the
//!   tail of its stderr when it fails.
//! - **Engine** ([`Engine`], [`FfmpegEngine`]) -- runs one
//!   [`mfx_graph::Invocation`] to completion.
//! - **Probing** ([`Prober`], [`FfprobeProber`]) -- duration, audio presence
//!   and video geometry.
//! - **Capability detection** ([`CapabilityDetector`]) -- cached engine
//!   version and transition support.
//! - **Temp files** ([`TempStore`], [`TempFile`]) -- scoped ownership and
//!   age-based sweeping.
//! - **Input resolution** ([`InputResolver`]) -- URL and binary sources to
//!   local files.

pub mod capability;
pub mod command;
pub mod engine;
pub mod probe;
pub mod resolve;
pub mod temp;
pub mod tools;

// ---- Re-exports for convenience ----

pub use capability::{CapabilityDetector, EngineCapabilities, TransitionSupport};
pub use command::{ToolCommand, ToolOutput};
pub use engine::{Engine, FfmpegEngine};
pub use probe::{probe_all, FfprobeProber, Prober};
pub use resolve::{InputResolver, ResolvedInputs};
pub use temp::{CleanupOutcome, SweepReport, TempFile, TempStore};
pub use tools::{Tool, ToolInfo, ToolRegistry};
