//! One engine invocation: inputs, filter graph, stream maps and output.

use std::path::{Path, PathBuf};

use crate::graph::FilterGraph;

/// Smallest duration used for a synthesized silent track.
pub const SILENCE_FLOOR_SECS: f64 = 0.01;

/// Duration of a silent track standing in for a missing audio stream.
///
/// Zero, negative or non-finite probe results are clamped to
/// [`SILENCE_FLOOR_SECS`].
pub fn silence_duration(probed: f64) -> f64 {
    if probed.is_finite() && probed > 0.0 {
        probed
    } else {
        SILENCE_FLOOR_SECS
    }
}

/// An engine input with its per-input options.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub options: Vec<String>,
    pub source: String,
}

impl Input {
    pub fn file(path: &Path) -> Self {
        Self {
            options: Vec::new(),
            source: path.to_string_lossy().into_owned(),
        }
    }

    /// A synthesized stereo silent track of the given length.
    pub fn silence(duration: f64) -> Self {
        Self {
            options: vec![
                "-f".into(),
                "lavfi".into(),
                "-t".into(),
                silence_duration(duration).to_string(),
            ],
            source: "anullsrc=channel_layout=stereo:sample_rate=44100".into(),
        }
    }

    /// Stream-copy join of already-normalized segments.
    pub fn concat(parts: &[PathBuf]) -> Self {
        let joined = parts
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("|");
        Self {
            options: Vec::new(),
            source: format!("concat:{joined}"),
        }
    }

    /// Prepend input options.
    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut opts: Vec<String> = options.into_iter().map(Into::into).collect();
        opts.append(&mut self.options);
        self.options = opts;
        self
    }

    pub fn is_silence(&self) -> bool {
        self.source.starts_with("anullsrc")
    }
}

/// A complete engine command line, minus the program name.
#[derive(Debug, Clone)]
pub struct Invocation {
    inputs: Vec<Input>,
    graph: Option<FilterGraph>,
    maps: Vec<String>,
    output_options: Vec<String>,
    output: PathBuf,
}

impl Invocation {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            graph: None,
            maps: Vec::new(),
            output_options: Vec::new(),
            output: output.into(),
        }
    }

    /// Add an input and return its index.
    pub fn input(&mut self, input: Input) -> usize {
        self.inputs.push(input);
        self.inputs.len() - 1
    }

    pub fn set_graph(&mut self, graph: FilterGraph) -> &mut Self {
        self.graph = Some(graph);
        self
    }

    /// Map a graph label (`[vout]`) or input stream (`0:a?`) to the output.
    pub fn map(&mut self, spec: impl Into<String>) -> &mut Self {
        self.maps.push(spec.into());
        self
    }

    pub fn output_args(
        &mut self,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.output_options.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn graph(&self) -> Option<&FilterGraph> {
        self.graph.as_ref()
    }

    pub fn maps(&self) -> &[String] {
        &self.maps
    }

    pub fn output_options(&self) -> &[String] {
        &self.output_options
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Whether `flag` appears in the output options followed by `value`.
    pub fn has_output_option(&self, flag: &str, value: &str) -> bool {
        self.output_options
            .windows(2)
            .any(|w| w[0] == flag && w[1] == value)
    }

    /// The argument vector handed to the engine.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];
        for input in &self.inputs {
            args.extend(input.options.iter().cloned());
            args.push("-i".into());
            args.push(input.source.clone());
        }
        if let Some(graph) = self.graph.as_ref().filter(|g| !g.is_empty()) {
            args.push("-filter_complex".into());
            args.push(graph.render());
        }
        for map in &self.maps {
            args.push("-map".into());
            args.push(map.clone());
        }
        args.extend(self.output_options.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Chain, Filter, Pad};

    #[test]
    fn silence_floor() {
        assert_eq!(silence_duration(0.0), SILENCE_FLOOR_SECS);
        assert_eq!(silence_duration(f64::NAN), SILENCE_FLOOR_SECS);
        assert_eq!(silence_duration(-3.0), SILENCE_FLOOR_SECS);
        assert_eq!(silence_duration(7.25), 7.25);
    }

    #[test]
    fn silence_input_args() {
        let input = Input::silence(0.0);
        assert!(input.is_silence());
        assert_eq!(input.options, vec!["-f", "lavfi", "-t", "0.01"]);
    }

    #[test]
    fn concat_source() {
        let input = Input::concat(&[PathBuf::from("/t/a.ts"), PathBuf::from("/t/b.ts")]);
        assert_eq!(input.source, "concat:/t/a.ts|/t/b.ts");
    }

    #[test]
    fn argument_vector_order() {
        let mut inv = Invocation::new("/t/out.mp4");
        let main = inv.input(Input::file(Path::new("/t/in.mp4")));
        let image = inv.input(Input::file(Path::new("/t/img.png")).with_options(["-loop", "1"]));
        assert_eq!((main, image), (0, 1));

        let mut g = FilterGraph::new();
        g.push(
            Chain::new()
                .input(Pad::video(0))
                .input(Pad::video(1))
                .filter(Filter::new("overlay").arg("x", 10).arg("y", 10))
                .output("vout"),
        )
        .unwrap();
        inv.set_graph(g);
        inv.map("[vout]").map("0:a?");
        inv.output_args(["-c:a", "copy"]);

        assert_eq!(
            inv.to_args(),
            vec![
                "-y",
                "-hide_banner",
                "-i",
                "/t/in.mp4",
                "-loop",
                "1",
                "-i",
                "/t/img.png",
                "-filter_complex",
                "[0:v][1:v]overlay=x=10:y=10[vout]",
                "-map",
                "[vout]",
                "-map",
                "0:a?",
                "-c:a",
                "copy",
                "/t/out.mp4",
            ]
        );
        assert!(inv.has_output_option("-c:a", "copy"));
    }
}
