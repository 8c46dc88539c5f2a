//! Typed filter graph.
//!
//! A [`FilterGraph`] is an ordered list of [`Chain`]s. Each chain reads from
//! input pads, applies a comma-joined sequence of [`Filter`]s and writes to
//! labeled output pads. Labels are checked when a chain is added, so a
//! duplicate or dangling label is caught before the engine ever sees the
//! rendered string.

use std::collections::HashSet;
use std::fmt;

use mfx_core::{Error, Result};

/// Stream selector for an input pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn specifier(self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
        }
    }
}

/// One end of a filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pad {
    /// A stream of an engine input, e.g. `[1:a]`.
    Input { index: usize, kind: StreamKind },
    /// A label produced by an earlier chain.
    Label(String),
}

impl Pad {
    pub fn video(index: usize) -> Self {
        Self::Input {
            index,
            kind: StreamKind::Video,
        }
    }

    pub fn audio(index: usize) -> Self {
        Self::Input {
            index,
            kind: StreamKind::Audio,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input { index, kind } => write!(f, "[{index}:{}]", kind.specifier()),
            Self::Label(name) => write!(f, "[{name}]"),
        }
    }
}

/// A single filter with its options.
///
/// Option values are emitted verbatim; callers escape free text with
/// [`crate::escape`] before handing it over.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    args: Vec<(Option<String>, String)>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add a `key=value` option.
    pub fn arg(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.args.push((Some(key.into()), value.to_string()));
        self
    }

    /// Add a positional option.
    pub fn value(mut self, value: impl fmt::Display) -> Self {
        self.args.push((None, value.to_string()));
        self
    }

    /// Add a `key=value` option only when `value` is present.
    pub fn arg_opt(self, key: impl Into<String>, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(v) => self.arg(key, v),
            None => self,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a keyed option's rendered value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match key {
                Some(k) => write!(f, "{k}={value}")?,
                None => f.write_str(value)?,
            }
        }
        Ok(())
    }
}

/// A linear sequence of filters between labeled pads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain {
    inputs: Vec<Pad>,
    filters: Vec<Filter>,
    outputs: Vec<String>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, pad: Pad) -> Self {
        self.inputs.push(pad);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    pub fn inputs(&self) -> &[Pad] {
        &self.inputs
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "{pad}")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for label in &self.outputs {
            write!(f, "[{label}]")?;
        }
        Ok(())
    }
}

/// An ordered set of chains with unique output labels.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    chains: Vec<Chain>,
    labels: HashSet<String>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chain.
    ///
    /// Fails if the chain has no filters, reads a label no earlier chain
    /// produced, or produces a label that already exists.
    pub fn push(&mut self, chain: Chain) -> Result<()> {
        if chain.filters.is_empty() {
            return Err(Error::Internal(format!(
                "filter chain {chain} has no filters"
            )));
        }

        for pad in &chain.inputs {
            if let Pad::Label(name) = pad {
                if !self.labels.contains(name) {
                    return Err(Error::Internal(format!(
                        "filter chain reads undefined pad [{name}]"
                    )));
                }
            }
        }

        let mut fresh = HashSet::new();
        for label in &chain.outputs {
            if self.labels.contains(label) || !fresh.insert(label.clone()) {
                return Err(Error::Internal(format!("duplicate pad label [{label}]")));
            }
        }

        self.labels.extend(fresh);
        self.chains.push(chain);
        Ok(())
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// All filters of the given name, in graph order.
    pub fn filters_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Filter> + 'a {
        self.chains
            .iter()
            .flat_map(|c| c.filters.iter())
            .filter(move |f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Render the graph in the engine's textual syntax.
    pub fn render(&self) -> String {
        self.chains
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_rendering() {
        let f = Filter::new("scale").value(1280).value(720);
        assert_eq!(f.to_string(), "scale=1280:720");

        let f = Filter::new("amix").arg("inputs", 2).arg("duration", "first");
        assert_eq!(f.to_string(), "amix=inputs=2:duration=first");
        assert_eq!(f.get("duration"), Some("first"));

        assert_eq!(Filter::new("anull").to_string(), "anull");
    }

    #[test]
    fn chain_rendering() {
        let chain = Chain::new()
            .input(Pad::video(0))
            .filter(Filter::new("settb").value("AVTB"))
            .filter(Filter::new("fps").value("30/1"))
            .output("v0");
        assert_eq!(chain.to_string(), "[0:v]settb=AVTB,fps=30/1[v0]");
    }

    #[test]
    fn graph_joins_chains() {
        let mut g = FilterGraph::new();
        g.push(
            Chain::new()
                .input(Pad::audio(0))
                .filter(Filter::new("volume").value(1))
                .output("a0"),
        )
        .unwrap();
        g.push(
            Chain::new()
                .input(Pad::label("a0"))
                .input(Pad::audio(1))
                .filter(Filter::new("amix").arg("inputs", 2))
                .output("a"),
        )
        .unwrap();
        assert_eq!(g.render(), "[0:a]volume=1[a0];[a0][1:a]amix=inputs=2[a]");
        assert!(g.has_label("a"));
    }

    #[test]
    fn duplicate_label_rejected() {
        let mut g = FilterGraph::new();
        let chain = Chain::new()
            .input(Pad::video(0))
            .filter(Filter::new("null"))
            .output("v");
        g.push(chain.clone()).unwrap();
        let err = g.push(chain).unwrap_err();
        assert!(err.to_string().contains("duplicate pad label [v]"));
    }

    #[test]
    fn duplicate_label_within_chain_rejected() {
        let mut g = FilterGraph::new();
        let chain = Chain::new()
            .input(Pad::video(0))
            .filter(Filter::new("split"))
            .output("s")
            .output("s");
        assert!(g.push(chain).is_err());
    }

    #[test]
    fn undefined_label_rejected() {
        let mut g = FilterGraph::new();
        let err = g
            .push(
                Chain::new()
                    .input(Pad::label("missing"))
                    .filter(Filter::new("null"))
                    .output("v"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("undefined pad [missing]"));
    }

    #[test]
    fn empty_chain_rejected() {
        let mut g = FilterGraph::new();
        assert!(g.push(Chain::new().input(Pad::video(0)).output("v")).is_err());
    }
}
