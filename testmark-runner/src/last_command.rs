// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remembering the last test command, so it can be run again.
//!
//! The command is stored in `XDG_STATE_HOME` rather than a cache directory: it records what the
//! user last did and cannot be regenerated.

use crate::{
    command::TestCommand,
    errors::{LastCommandError, StateDirError},
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use etcetera::{BaseStrategy, choose_base_strategy};
use serde::{Deserialize, Serialize};
use std::{fs, io};
use tracing::debug;

/// Environment variable to override the testmark state directory.
pub const TESTMARK_STATE_DIR_ENV: &str = "TESTMARK_STATE_DIR";

/// Returns the directory testmark keeps state in.
///
/// If `TESTMARK_STATE_DIR` is set, that is used. Otherwise:
///
/// - Linux, macOS, and other Unix: `$XDG_STATE_HOME/testmark` or `~/.local/state/testmark`
/// - Windows: `%LOCALAPPDATA%\testmark` (Windows has no state directory, so the cache directory is
///   used instead)
pub fn state_dir() -> Result<Utf8PathBuf, StateDirError> {
    if let Ok(state_dir) = std::env::var(TESTMARK_STATE_DIR_ENV) {
        return Ok(Utf8PathBuf::from(state_dir));
    }

    let strategy = choose_base_strategy().map_err(StateDirError::BaseDirStrategy)?;
    let base_dir = strategy
        .state_dir()
        .unwrap_or_else(|| strategy.cache_dir());
    let testmark_dir = base_dir.join("testmark");
    Utf8PathBuf::from_path_buf(testmark_dir)
        .map_err(|path| StateDirError::StateDirNotUtf8 { path })
}

/// The last test command, serialized to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LastCommandSnapshot {
    /// Version of the snapshot format.
    pub version: u32,

    /// When the command was run.
    pub created_at: DateTime<Utc>,

    /// The command.
    pub command: TestCommand,
}

impl LastCommandSnapshot {
    /// Creates a snapshot of `command`, timestamped now.
    pub fn new(command: TestCommand) -> Self {
        Self {
            version: LastCommandStore::CURRENT_VERSION,
            created_at: Utc::now(),
            command,
        }
    }
}

/// Manages persistence of the last test command.
#[derive(Clone, Debug)]
pub struct LastCommandStore {
    path: Utf8PathBuf,
}

impl LastCommandStore {
    /// Current version of the snapshot format.
    const CURRENT_VERSION: u32 = 1;

    /// Creates a store that keeps its file in `state_dir`.
    pub fn new(state_dir: &Utf8Path) -> Self {
        Self {
            path: state_dir.join("last-command.json"),
        }
    }

    /// Returns the path of the snapshot file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads the snapshot from disk. Returns `Ok(None)` if no command has been saved.
    pub fn load(&self) -> Result<Option<LastCommandSnapshot>, LastCommandError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no last command at {}", self.path);
                return Ok(None);
            }
            Err(error) => {
                return Err(LastCommandError::Read {
                    path: self.path.clone(),
                    error,
                });
            }
        };

        let snapshot: LastCommandSnapshot =
            serde_json::from_str(&contents).map_err(|error| LastCommandError::Deserialize {
                path: self.path.clone(),
                error,
            })?;
        if snapshot.version != Self::CURRENT_VERSION {
            return Err(LastCommandError::VersionMismatch {
                path: self.path.clone(),
                expected: Self::CURRENT_VERSION,
                actual: snapshot.version,
            });
        }

        Ok(Some(snapshot))
    }

    /// Saves a snapshot to disk, replacing any previous one.
    pub fn save(&self, snapshot: &LastCommandSnapshot) -> Result<(), LastCommandError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| LastCommandError::CreateDir {
                path: parent.to_owned(),
                error,
            })?;
        }

        let contents = serde_json::to_string_pretty(snapshot)
            .map_err(|error| LastCommandError::Serialize { error })?;
        fs::write(&self.path, contents).map_err(|error| LastCommandError::Write {
            path: self.path.clone(),
            error,
        })?;

        debug!("saved last command to {}", self.path);
        Ok(())
    }

    /// Removes the snapshot. Removing a snapshot that doesn't exist is not an error.
    pub fn clear(&self) -> Result<(), LastCommandError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(LastCommandError::Remove {
                path: self.path.clone(),
                error,
            }),
        }
    }
}
