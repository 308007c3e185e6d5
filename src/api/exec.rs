//! Purpose: Process-execution seam between the command core and the OS.
//! Exports: `Executor`, `SystemExecutor`, `ToolOutput`.
//! Role: Run the tool with compiled arguments, optionally streaming stdin.
//! Invariants: Output is stdout followed by stderr, captured as raw bytes.
//! Invariants: Implementations add no retries and no timeouts of their own.
//! Invariants: Stdin is written concurrently with output collection.
use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Output, Stdio};
use std::thread;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    pub combined: Vec<u8>,
}

impl ToolOutput {
    pub fn ok(combined: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            combined: combined.into(),
        }
    }

    pub fn failed(combined: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            combined: combined.into(),
        }
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Self {
            success: output.status.success(),
            combined,
        }
    }
}

/// Runs the external set-management tool.
///
/// Swap the implementation on [`crate::api::Ipset`] to drive the core without
/// spawning processes.
pub trait Executor: fmt::Debug + Send + Sync {
    /// Run `program` with `args` and capture its combined output.
    fn run(&self, program: &Path, args: &[String]) -> io::Result<ToolOutput>;

    /// Run `program` with `args`, writing `input` to its stdin before waiting.
    fn run_with_input(
        &self,
        program: &Path,
        args: &[String],
        input: &[u8],
    ) -> io::Result<ToolOutput>;

    /// Locate `program` on the search path.
    fn look_path(&self, program: &OsStr) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<ToolOutput> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map(ToolOutput::from)
    }

    fn run_with_input(
        &self,
        program: &Path,
        args: &[String],
        input: &[u8],
    ) -> io::Result<ToolOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take();
        // stdin is fed from its own thread so a child that fills its output
        // pipes before draining input cannot block both sides.
        thread::scope(|scope| {
            let writer = scope.spawn(move || write_input(stdin, input));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            let output = output?;
            written?;
            Ok(ToolOutput::from(output))
        })
    }
}

/// Write `input` and close the pipe. A child that exits early closes its end;
/// its exit status reports why, so a broken pipe is not an error here.
fn write_input(stdin: Option<ChildStdin>, input: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(input) {
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
        _ => Ok(()),
    }
}
