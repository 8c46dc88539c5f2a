//! Spawning ffmpeg and ffprobe.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

/// Lines of stderr kept in the error of a failed run.
///
/// ffmpeg prints its banner and per-stream progress to stderr; the reason for
/// a failure is at the end.
pub const STDERR_TAIL_LINES: usize = 30;

/// What a finished process wrote.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// One invocation of an external media tool.
///
/// ```no_run
/// use mfx_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> mfx_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
///     .arg("/path/to/clip.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// `ffmpeg` for `/usr/bin/ffmpeg`; used as the tool name in errors.
    pub fn tool_name(&self) -> String {
        match self.program.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.program.to_string_lossy().into_owned(),
        }
    }

    /// The command line as it would be typed in a shell, for logs.
    ///
    /// Arguments with spaces or filter-graph punctuation are single-quoted.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().map(|a| shell_quote(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion with stdin closed, capturing both streams.
    ///
    /// # Errors
    ///
    /// [`mfx_core::Error::Tool`] when the process cannot be spawned or exits
    /// non-zero. In the latter case the message ends with the last
    /// [`STDERR_TAIL_LINES`] lines of stderr.
    pub async fn execute(&self) -> mfx_core::Result<ToolOutput> {
        let tool = self.tool_name();
        tracing::trace!("spawning {}", self.command_line());

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| mfx_core::Error::Tool {
                tool: tool.clone(),
                message: format!("failed to spawn: {e}"),
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| mfx_core::Error::Tool {
                tool: tool.clone(),
                message: format!("lost contact with process: {e}"),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(mfx_core::Error::Tool {
                message: format!("exited with {}: {}", output.status, stderr_tail(&stderr)),
                tool,
            });
        }

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// The trimmed last [`STDERR_TAIL_LINES`] non-empty lines of `stderr`.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
