//! Engine capability detection.
//!
//! The cross-fade filter family arrived in ffmpeg 4.3. [`CapabilityDetector`]
//! queries the engine version once, caches the result until [`reset`], and
//! answers whether a named transition can run natively or needs the `fade`
//! fallback.
//!
//! [`reset`]: CapabilityDetector::reset

use std::sync::{Arc, OnceLock};

use mfx_graph::{CROSSFADE_CATALOG, FADE_FAMILY};
use regex::Regex;
use semver::Version;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::engine::Engine;

/// What the installed engine can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineCapabilities {
    /// Parsed version; `0.0.0` when unknown.
    pub version: Version,
    /// The matched version text, or `unknown`.
    pub raw: String,
    /// Cross-fade family (`xfade`) available.
    pub crossfade: bool,
    /// Built with `--enable-opengl`.
    pub gl_transitions: bool,
}

impl EngineCapabilities {
    /// Conservative capabilities used when the version cannot be determined.
    pub fn unknown() -> Self {
        Self {
            version: Version::new(0, 0, 0),
            raw: "unknown".to_string(),
            crossfade: false,
            gl_transitions: false,
        }
    }
}

/// Answer from [`CapabilityDetector::check_transition_support`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionSupport {
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransitionSupport {
    fn supported() -> Self {
        Self {
            supported: true,
            alternative: None,
            message: None,
        }
    }

    fn fallback(message: String) -> Self {
        Self {
            supported: false,
            alternative: Some("fade".to_string()),
            message: Some(message),
        }
    }

    /// The transition name to actually use.
    pub fn effective<'a>(&'a self, requested: &'a str) -> &'a str {
        self.alternative.as_deref().unwrap_or(requested)
    }
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ffmpeg version (\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex")
    })
}

fn nightly_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ffmpeg version N-\d+-g[a-f0-9]+").expect("valid nightly regex")
    })
}

/// Classify the output of `ffmpeg -version`.
pub fn parse_version_output(output: &str) -> EngineCapabilities {
    if let Some(caps) = version_regex().captures(output) {
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(0)
        };
        let version = Version::new(part(1), part(2), part(3));
        let crossfade = version >= Version::new(4, 3, 0);
        return EngineCapabilities {
            raw: version.to_string(),
            version,
            crossfade,
            gl_transitions: output.contains("--enable-opengl"),
        };
    }

    if let Some(m) = nightly_regex().find(output) {
        // Old static nightlies predate the cross-fade family.
        return EngineCapabilities {
            version: Version::new(4, 2, 0),
            raw: m.as_str().to_string(),
            crossfade: false,
            gl_transitions: false,
        };
    }

    EngineCapabilities::unknown()
}

/// Process-wide capability cache around an [`Engine`].
pub struct CapabilityDetector {
    engine: Arc<dyn Engine>,
    cache: Mutex<Option<EngineCapabilities>>,
}

impl CapabilityDetector {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            cache: Mutex::new(None),
        }
    }

    /// Detect on first call; later calls return the cached value.
    ///
    /// A failing version query is not an error: the engine is treated as
    /// having unknown version and no cross-fade support.
    pub async fn capabilities(&self) -> EngineCapabilities {
        let mut cache = self.cache.lock().await;
        if let Some(caps) = cache.as_ref() {
            return caps.clone();
        }

        let caps = match self.engine.version_output().await {
            Ok(output) => parse_version_output(&output),
            Err(e) => {
                tracing::warn!("engine version query failed: {e}; assuming minimal capabilities");
                EngineCapabilities::unknown()
            }
        };
        tracing::info!(
            "engine version {} (crossfade: {}, gl: {})",
            caps.raw,
            caps.crossfade,
            caps.gl_transitions
        );
        *cache = Some(caps.clone());
        caps
    }

    /// Forget the cached result.
    pub async fn reset(&self) {
        *self.cache.lock().await = None;
    }

    /// Whether `name` can run as requested, and what to use instead if not.
    pub async fn check_transition_support(&self, name: &str) -> TransitionSupport {
        if FADE_FAMILY.contains(&name) {
            return TransitionSupport::supported();
        }
        if CROSSFADE_CATALOG.contains(&name) {
            if self.capabilities().await.crossfade {
                return TransitionSupport::supported();
            }
            return TransitionSupport::fallback(format!(
                "The '{name}' effect requires FFmpeg 4.3+. Using 'fade' as fallback."
            ));
        }
        TransitionSupport::fallback(format!(
            "Unknown transition '{name}'. Using 'fade' as fallback."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mfx_graph::Invocation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct VersionEngine {
        output: Option<String>,
        calls: AtomicUsize,
    }

    impl VersionEngine {
        fn new(output: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                output: output.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Engine for VersionEngine {
        async fn run(&self, _invocation: &Invocation) -> mfx_core::Result<()> {
            Ok(())
        }

        async fn version_output(&self) -> mfx_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
                .clone()
                .ok_or_else(|| mfx_core::Error::tool("ffmpeg", "failed to spawn"))
        }
    }

    #[test]
    fn parses_release_versions() {
        let caps = parse_version_output(
            "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nconfiguration: --enable-gpl",
        );
        assert_eq!(caps.version, Version::new(6, 1, 1));
        assert!(caps.crossfade);
        assert!(!caps.gl_transitions);

        let caps = parse_version_output("ffmpeg version 4.3 Copyright\n--enable-opengl");
        assert_eq!(caps.version, Version::new(4, 3, 0));
        assert!(caps.crossfade);
        assert!(caps.gl_transitions);

        let caps = parse_version_output("ffmpeg version 4.2.7-0ubuntu0.1");
        assert!(!caps.crossfade);
    }

    #[test]
    fn nightly_static_build_is_pre_crossfade() {
        let caps = parse_version_output("ffmpeg version N-98765-gabc123f-static https://...");
        assert_eq!(caps.version, Version::new(4, 2, 0));
        assert!(!caps.crossfade);
    }

    #[test]
    fn unparsable_is_unknown() {
        let caps = parse_version_output("something else entirely");
        assert_eq!(caps, EngineCapabilities::unknown());
    }

    #[tokio::test]
    async fn cached_until_reset() {
        let engine = VersionEngine::new(Some("ffmpeg version 5.1.2"));
        let detector = CapabilityDetector::new(engine.clone());
        assert!(detector.capabilities().await.crossfade);
        assert!(detector.capabilities().await.crossfade);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        detector.reset().await;
        detector.capabilities().await;
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_query_is_conservative() {
        let detector = CapabilityDetector::new(VersionEngine::new(None));
        let caps = detector.capabilities().await;
        assert_eq!(caps.raw, "unknown");
        assert!(!caps.crossfade);
    }

    #[tokio::test]
    async fn transition_support() {
        let old = CapabilityDetector::new(VersionEngine::new(Some("ffmpeg version 4.2.1")));
        assert!(old.check_transition_support("fadeblack").await.supported);

        let wipe = old.check_transition_support("wipeleft").await;
        assert!(!wipe.supported);
        assert_eq!(wipe.effective("wipeleft"), "fade");
        assert_eq!(
            wipe.message.as_deref(),
            Some("The 'wipeleft' effect requires FFmpeg 4.3+. Using 'fade' as fallback.")
        );

        let new = CapabilityDetector::new(VersionEngine::new(Some("ffmpeg version 7.0")));
        let wipe = new.check_transition_support("wipeleft").await;
        assert!(wipe.supported);
        assert_eq!(wipe.effective("wipeleft"), "wipeleft");

        let unknown = new.check_transition_support("spin3d").await;
        assert_eq!(unknown.alternative.as_deref(), Some("fade"));
        assert_eq!(
            unknown.message.as_deref(),
            Some("Unknown transition 'spin3d'. Using 'fade' as fallback.")
        );
    }
}
