// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testmark.

use camino::{FromPathBufError, Utf8PathBuf};
use std::path::PathBuf;
use thiserror::Error;

/// An error that occurred while loading user configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserConfigError {
    /// The user config file specified explicitly was not found.
    #[error("user config file not found at {path}")]
    FileNotFound {
        /// The path that was specified.
        path: Utf8PathBuf,
    },

    /// Failed to read the user config file.
    #[error("failed to read user config at {path}")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Failed to parse the user config file.
    #[error("failed to parse user config at {path}")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying TOML parse error.
        #[source]
        error: toml::de::Error,
    },

    /// The user config path is not valid UTF-8.
    #[error("user config path is not valid UTF-8")]
    NonUtf8Path {
        /// The underlying conversion error.
        #[source]
        error: FromPathBufError,
    },

    /// The configured build program could not be split into words.
    #[error("invalid build program `{program}` in user config")]
    InvalidProgram {
        /// The program string as written in the config.
        program: String,

        /// The underlying error.
        #[source]
        error: shell_words::ParseError,
    },

    /// The configured build program was empty after splitting into words.
    #[error("build program `{program}` in user config has no command")]
    EmptyProgram {
        /// The program string as written in the config.
        program: String,
    },
}

/// An error that occurred while running the build tool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessRunError {
    /// The process could not be spawned.
    #[error("failed to execute `{command}`")]
    Spawn {
        /// The command line that was attempted.
        command: String,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Reading the process's output failed.
    #[error("failed to read output of `{command}`")]
    Read {
        /// The command line being run.
        command: String,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("failed to wait for `{command}` to exit")]
    Wait {
        /// The command line being run.
        command: String,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while reading a source document.
#[derive(Debug, Error)]
#[error("failed to read document at {path}")]
pub struct DocumentReadError {
    path: Utf8PathBuf,
    #[source]
    error: std::io::Error,
}

impl DocumentReadError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: std::io::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// Returns the path that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurred while loading, saving or clearing the last command.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LastCommandError {
    /// Error reading the snapshot file.
    #[error("failed to read last command at {path}")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Error deserializing the snapshot.
    #[error("failed to deserialize last command at {path}")]
    Deserialize {
        /// The path that failed to be deserialized.
        path: Utf8PathBuf,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },

    /// The snapshot was written by an incompatible version.
    #[error(
        "last command at {path} has version {actual}, but this version of testmark \
         reads version {expected}"
    )]
    VersionMismatch {
        /// The snapshot path.
        path: Utf8PathBuf,
        /// The version this build understands.
        expected: u32,
        /// The version found on disk.
        actual: u32,
    },

    /// Error creating the parent directory.
    #[error("failed to create directory {path}")]
    CreateDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Error serializing the snapshot.
    #[error("failed to serialize last command")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        error: serde_json::Error,
    },

    /// Error writing the snapshot file.
    #[error("failed to write last command to {path}")]
    Write {
        /// The path that failed to be written.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Error removing the snapshot file.
    #[error("failed to remove last command at {path}")]
    Remove {
        /// The path that failed to be removed.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while determining the testmark state directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateDirError {
    /// The platform base directories could not be determined.
    #[error("failed to determine platform base directories")]
    BaseDirStrategy(#[source] etcetera::HomeDirError),

    /// The state directory is not valid UTF-8.
    #[error("state directory is not valid UTF-8: {}", .path.display())]
    StateDirNotUtf8 {
        /// The offending path.
        path: PathBuf,
    },
}

/// An error returned when no test can be selected at a position in a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NearestTestError {
    /// The line is not inside any class declaration.
    #[error("{document}:{line} is not inside a test class")]
    NoEnclosingClass {
        /// The document that was searched.
        document: Utf8PathBuf,

        /// The 1-based line that was searched.
        line: usize,
    },

    /// The document declares no class at all.
    #[error("no test class declared in {document}")]
    NoClassInDocument {
        /// The document that was searched.
        document: Utf8PathBuf,
    },
}

/// An error that occurred while running a test session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The build tool could not be run.
    #[error(transparent)]
    Process(#[from] ProcessRunError),

    /// The document to annotate could not be read.
    #[error(transparent)]
    Document(#[from] DocumentReadError),

    /// No test could be selected from the requested position.
    #[error(transparent)]
    Nearest(#[from] NearestTestError),

    /// The last command could not be loaded.
    #[error(transparent)]
    LastCommand(#[from] LastCommandError),
}
