// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::{error::Error, path::PathBuf};
use testmark_metadata::TestmarkExitCode;
use testmark_runner::errors::{
    DocumentReadError, LastCommandError, NearestTestError, ProcessRunError, SessionError,
    StateDirError, UserConfigError,
};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that testmark reports to the user and exits with a documented exit code for.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        error: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: PathBuf },
    #[error("user config error")]
    UserConfigError {
        #[from]
        error: UserConfigError,
    },
    #[error("state directory error")]
    StateDirError {
        #[from]
        error: StateDirError,
    },
    #[error("failed to create tokio runtime")]
    TokioRuntimeCreate {
        #[source]
        error: std::io::Error,
    },
    #[error("failed to read build output")]
    BuildOutputRead {
        /// `None` for standard input.
        path: Option<Utf8PathBuf>,
        #[source]
        error: std::io::Error,
    },
    #[error("build tool failed to run")]
    BuildToolExecFailed {
        #[source]
        error: ProcessRunError,
    },
    #[error("failed to read test document")]
    DocumentReadError {
        #[source]
        error: DocumentReadError,
    },
    #[error("no test to run")]
    NoTestToRun {
        #[source]
        error: NearestTestError,
    },
    #[error("last command error")]
    LastCommandError {
        #[source]
        error: LastCommandError,
    },
    #[error("test run failed")]
    TestRunFailed { failed: usize },
    #[error("no test results found")]
    NoResults { exit_code: Option<i32> },
    #[error("failed to write output")]
    WriteOutputError {
        #[source]
        error: std::io::Error,
    },
    #[error("failed to serialize summary")]
    SummarySerializeError {
        #[source]
        error: serde_json::Error,
    },
}

impl From<SessionError> for ExpectedError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Process(error) => Self::BuildToolExecFailed { error },
            SessionError::Document(error) => Self::DocumentReadError { error },
            SessionError::Nearest(error) => Self::NoTestToRun { error },
            SessionError::LastCommand(error) => Self::LastCommandError { error },
        }
    }
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::UserConfigError { .. }
            | Self::StateDirError { .. }
            | Self::TokioRuntimeCreate { .. }
            | Self::BuildOutputRead { .. }
            | Self::DocumentReadError { .. }
            | Self::NoTestToRun { .. }
            | Self::LastCommandError { .. } => TestmarkExitCode::SETUP_ERROR,
            Self::BuildToolExecFailed { .. } => TestmarkExitCode::BUILD_TOOL_EXEC_FAILED,
            Self::TestRunFailed { .. } => TestmarkExitCode::TEST_RUN_FAILED,
            Self::NoResults { .. } => TestmarkExitCode::NO_RESULTS,
            Self::WriteOutputError { .. } | Self::SummarySerializeError { .. } => {
                TestmarkExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { error } => {
                error!("could not determine the current directory");
                Some(error as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::UserConfigError { error } => {
                error!("failed to load user config");
                Some(error as &dyn Error)
            }
            Self::StateDirError { error } => {
                error!("failed to determine the testmark state directory");
                Some(error as &dyn Error)
            }
            Self::TokioRuntimeCreate { error } => {
                error!("failed to create tokio runtime");
                Some(error as &dyn Error)
            }
            Self::BuildOutputRead { path, error } => {
                match path {
                    Some(path) => error!(
                        "failed to read build output from `{}`",
                        path.style(styles.bold)
                    ),
                    None => error!("failed to read build output from standard input"),
                }
                Some(error as &dyn Error)
            }
            Self::BuildToolExecFailed { error } => {
                error!("{error}");
                error.source()
            }
            Self::DocumentReadError { error } => {
                error!("{error}");
                error.source()
            }
            Self::NoTestToRun { error } => {
                error!("{error}");
                error.source()
            }
            Self::LastCommandError { error } => {
                error!("failed to load the last test command");
                Some(error as &dyn Error)
            }
            Self::TestRunFailed { failed } => {
                error!(
                    "test run failed ({} failed)",
                    failed.style(styles.bold)
                );
                None
            }
            Self::NoResults { exit_code } => {
                match exit_code {
                    Some(code) if *code != 0 => error!(
                        "build tool exited with code {} and printed no test summary",
                        code.style(styles.bold)
                    ),
                    _ => error!("no test summary found in build output"),
                }
                None
            }
            Self::WriteOutputError { error } => {
                error!("failed to write output");
                Some(error as &dyn Error)
            }
            Self::SummarySerializeError { error } => {
                error!("failed to serialize run summary");
                Some(error as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
