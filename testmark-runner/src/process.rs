// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running the build tool.

use crate::{command::BuildInvocation, errors::ProcessRunError};
use std::{io, process::Stdio};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tracing::debug;

/// Receives a running process's output, line by line, as it arrives.
pub trait OutputHandler {
    /// Called for each line written to standard output.
    fn on_stdout(&mut self, _line: &str) {}

    /// Called for each line written to standard error.
    fn on_stderr(&mut self, _line: &str) {}

    /// Called once the process has exited, with its exit code. The code is `None` if the process
    /// was terminated by a signal.
    fn on_exit(&mut self, _exit_code: Option<i32>) {}
}

/// Ignores all output.
impl OutputHandler for () {}

/// The captured output of a finished process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Lines written to standard output, without terminators.
    pub stdout: Vec<String>,
    /// Lines written to standard error, without terminators.
    pub stderr: Vec<String>,
    /// The exit code, if the process exited normally.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Returns standard output followed by standard error, one line per line.
    pub fn combined(&self) -> String {
        let mut combined = String::new();
        for line in self.stdout.iter().chain(&self.stderr) {
            combined.push_str(line);
            combined.push('\n');
        }
        combined
    }

    /// Returns true if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs build tool invocations to completion.
pub trait ProcessRunner {
    /// Runs `invocation`, forwarding output lines to `handler` as they arrive, and returns all of
    /// the output once the process exits.
    #[allow(async_fn_in_trait)]
    async fn run(
        &self,
        invocation: &BuildInvocation,
        handler: &mut dyn OutputHandler,
    ) -> Result<ProcessOutput, ProcessRunError>;
}

/// A [`ProcessRunner`] that spawns real processes through tokio.
///
/// There is no timeout: the process runs until it exits.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        invocation: &BuildInvocation,
        handler: &mut dyn OutputHandler,
    ) -> Result<ProcessOutput, ProcessRunError> {
        let command_str = invocation.to_string();
        debug!("running `{command_str}` in {}", invocation.working_dir);

        let mut child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| ProcessRunError::Spawn {
                command: command_str.clone(),
                error,
            })?;

        // Lines are split on raw bytes so that output in other encodings doesn't abort the run.
        let mut stdout = child.stdout.take().map(|out| BufReader::new(out).split(b'\n'));
        let mut stderr = child.stderr.take().map(|err| BufReader::new(err).split(b'\n'));
        let mut output = ProcessOutput::default();

        let read_error = |error| ProcessRunError::Read {
            command: command_str.clone(),
            error,
        };
        loop {
            tokio::select! {
                line = next_line(&mut stdout), if stdout.is_some() => {
                    match line.map_err(read_error)? {
                        Some(line) => {
                            handler.on_stdout(&line);
                            output.stdout.push(line);
                        }
                        None => stdout = None,
                    }
                }
                line = next_line(&mut stderr), if stderr.is_some() => {
                    match line.map_err(read_error)? {
                        Some(line) => {
                            handler.on_stderr(&line);
                            output.stderr.push(line);
                        }
                        None => stderr = None,
                    }
                }
                else => break,
            }
        }

        let status = child.wait().await.map_err(|error| ProcessRunError::Wait {
            command: command_str.clone(),
            error,
        })?;
        output.exit_code = status.code();
        debug!(
            "`{command_str}` exited with {status} ({} stdout lines, {} stderr lines)",
            output.stdout.len(),
            output.stderr.len()
        );
        handler.on_exit(output.exit_code);

        Ok(output)
    }
}

async fn next_line<R: AsyncBufRead + Unpin>(
    segments: &mut Option<Split<R>>,
) -> io::Result<Option<String>> {
    let Some(segments) = segments else {
        return Ok(None);
    };
    Ok(segments
        .next_segment()
        .await?
        .map(|segment| decode_line(&segment)))
}

/// Decodes a line lossily, dropping a trailing `\r`.
fn decode_line(segment: &[u8]) -> String {
    let segment = segment.strip_suffix(b"\r").unwrap_or(segment);
    String::from_utf8_lossy(segment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Collect {
        stdout: Vec<String>,
        stderr: Vec<String>,
        exit: Option<Option<i32>>,
    }

    impl OutputHandler for Collect {
        fn on_stdout(&mut self, line: &str) {
            self.stdout.push(line.to_owned());
        }

        fn on_stderr(&mut self, line: &str) {
            self.stderr.push(line.to_owned());
        }

        fn on_exit(&mut self, exit_code: Option<i32>) {
            self.exit = Some(exit_code);
        }
    }

    fn current_dir() -> Utf8PathBuf {
        Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "current_thread")]
    async fn captures_both_streams() {
        let invocation = BuildInvocation {
            program: "sh".to_owned(),
            args: vec![
                "-c".to_owned(),
                "echo one; echo two >&2; echo three; exit 3".to_owned(),
            ],
            working_dir: current_dir(),
        };

        let mut handler = Collect::default();
        let output = TokioProcessRunner
            .run(&invocation, &mut handler)
            .await
            .expect("sh runs");

        assert_eq!(output.stdout, vec!["one", "three"]);
        assert_eq!(output.stderr, vec!["two"]);
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.combined(), "one\nthree\ntwo\n");

        assert_eq!(handler.stdout, output.stdout);
        assert_eq!(handler.stderr, output.stderr);
        assert_eq!(handler.exit, Some(Some(3)));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "current_thread")]
    async fn invalid_utf8_output_is_decoded_lossily() {
        let invocation = BuildInvocation {
            program: "sh".to_owned(),
            args: vec![
                "-c".to_owned(),
                r"printf 'com.foo.BarTest\r\n  Test baz() PASSED\n\351t\351\nSUCCESS: Executed 1 tests in 1s\n'"
                    .to_owned(),
            ],
            working_dir: current_dir(),
        };

        let output = TokioProcessRunner
            .run(&invocation, &mut ())
            .await
            .expect("non-UTF-8 output is not a read error");

        assert_eq!(
            output.stdout,
            vec![
                "com.foo.BarTest",
                "  Test baz() PASSED",
                "\u{fffd}t\u{fffd}",
                "SUCCESS: Executed 1 tests in 1s",
            ]
        );
        let results = crate::results::parse(&output.combined());
        assert_eq!(results.passed.len(), 1);
        assert_eq!(results.total_passed, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn spawn_failure() {
        let invocation = BuildInvocation {
            program: "testmark-this-program-does-not-exist".to_owned(),
            args: vec!["test".to_owned()],
            working_dir: current_dir(),
        };

        let error = TokioProcessRunner
            .run(&invocation, &mut ())
            .await
            .expect_err("program does not exist");
        assert!(
            matches!(&error, ProcessRunError::Spawn { command, .. } if command == "testmark-this-program-does-not-exist test"),
            "unexpected error: {error:?}"
        );
    }
}
