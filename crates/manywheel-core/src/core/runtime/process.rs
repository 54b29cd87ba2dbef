//! Child processes for `pip` and `auditwheel`, with bounded output capture.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{anyhow, Context, Result};

pub const MAX_CAPTURE_BYTES_ENV: &str = "MANYWHEEL_MAX_CAPTURE_BYTES";
const DEFAULT_MAX_CAPTURE_BYTES: usize = 1024 * 1024;
const READ_CHUNK: usize = 8 * 1024;

/// Whether a tool's output is echoed to the terminal while it is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Stream,
    Capture,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// The last `lines` lines of stderr; tools print their fatal error last.
    #[must_use]
    pub fn stderr_tail(&self, lines: usize) -> Option<String> {
        let all: Vec<&str> = self.stderr.trim_end().lines().collect();
        let tail = all[all.len().saturating_sub(lines)..].join("\n");
        Some(tail).filter(|tail| !tail.trim().is_empty())
    }
}

/// Runs `program` in `cwd` and waits for it, keeping at most
/// `MANYWHEEL_MAX_CAPTURE_BYTES` of the newest output per stream.
///
/// # Errors
///
/// Returns an error when the program cannot be started or its output cannot be read.
pub fn run_tool(program: &str, args: &[String], cwd: &Path, mode: OutputMode) -> Result<RunOutput> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("no stdout pipe for {program}"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("no stderr pipe for {program}"))?;
    let limit = max_capture_bytes();

    let (status, stdout, stderr) = thread::scope(|scope| {
        let out = scope.spawn(move || match mode {
            OutputMode::Stream => drain(stdout, Some(io::stdout()), limit),
            OutputMode::Capture => drain(stdout, None::<io::Stdout>, limit),
        });
        let err = scope.spawn(move || match mode {
            OutputMode::Stream => drain(stderr, Some(io::stderr()), limit),
            OutputMode::Capture => drain(stderr, None::<io::Stderr>, limit),
        });
        let status = child.wait();
        let stdout = out.join().map_err(|_| anyhow!("stdout reader panicked"));
        let stderr = err.join().map_err(|_| anyhow!("stderr reader panicked"));
        (status, stdout, stderr)
    });
    let status = status.with_context(|| format!("failed to wait for {program}"))?;

    Ok(RunOutput {
        code: status.code().unwrap_or(-1),
        stdout: stdout??.into_text(),
        stderr: stderr??.into_text(),
    })
}

fn max_capture_bytes() -> usize {
    std::env::var(MAX_CAPTURE_BYTES_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_CAPTURE_BYTES)
}

fn drain(mut reader: impl Read, mut echo: Option<impl Write>, limit: usize) -> Result<TailBuffer> {
    let mut tail = TailBuffer::new(limit);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        if let Some(echo) = echo.as_mut() {
            echo.write_all(&chunk[..read])?;
        }
        tail.push(&chunk[..read]);
    }
    if let Some(echo) = echo.as_mut() {
        echo.flush().ok();
    }
    Ok(tail)
}

/// Byte buffer that keeps only the newest `limit` bytes.
struct TailBuffer {
    bytes: VecDeque<u8>,
    limit: usize,
    dropped: bool,
}

impl TailBuffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: VecDeque::new(),
            limit,
            dropped: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend(chunk);
        let excess = self.bytes.len().saturating_sub(self.limit);
        if excess > 0 {
            self.bytes.drain(..excess);
            self.dropped = true;
        }
    }

    fn into_text(self) -> String {
        let bytes: Vec<u8> = self.bytes.into_iter().collect();
        let text = String::from_utf8_lossy(&bytes);
        if self.dropped {
            format!("[...truncated...]\n{text}")
        } else {
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[cfg(unix)]
    #[test]
    fn capture_records_both_streams_and_exit_code() -> Result<()> {
        let output = run_tool(
            "/bin/sh",
            &sh("printf built && printf 'no compiler' >&2; exit 3"),
            Path::new("."),
            OutputMode::Capture,
        )?;
        assert_eq!(output.code, 3);
        assert!(!output.success());
        assert_eq!(output.stdout, "built");
        assert_eq!(output.stderr, "no compiler");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn stream_mode_still_records_output() -> Result<()> {
        let output = run_tool(
            "/bin/sh",
            &sh("printf wheel && printf warn >&2"),
            Path::new("."),
            OutputMode::Stream,
        )?;
        assert!(output.success());
        assert_eq!(output.stdout, "wheel");
        assert_eq!(output.stderr, "warn");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn tool_runs_inside_the_source_tree() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let output = run_tool("/bin/sh", &sh("pwd"), temp.path(), OutputMode::Capture)?;
        assert_eq!(
            std::fs::canonicalize(output.stdout.trim())?,
            std::fs::canonicalize(temp.path())?
        );
        Ok(())
    }

    #[test]
    fn missing_tool_fails_to_start() {
        let err = run_tool(
            "manywheel-no-such-pip",
            &[],
            Path::new("."),
            OutputMode::Capture,
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to start manywheel-no-such-pip"));
    }

    #[test]
    fn tail_buffer_drops_oldest_bytes() {
        let mut tail = TailBuffer::new(4);
        tail.push(b"ab");
        tail.push(b"cdef");
        tail.push(b"g");
        assert_eq!(tail.into_text(), "[...truncated...]\ndefg");

        let mut small = TailBuffer::new(8);
        small.push(b"ok");
        assert_eq!(small.into_text(), "ok");
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let output = RunOutput {
            code: 1,
            stdout: String::new(),
            stderr: (0..30).map(|i| format!("line {i}\n")).collect(),
        };
        let tail = output.stderr_tail(20).unwrap();
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));

        let quiet = RunOutput {
            code: 1,
            stdout: String::new(),
            stderr: "\n  \n".into(),
        };
        assert_eq!(quiet.stderr_tail(20), None);
    }
}
