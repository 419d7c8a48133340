// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of the user config file location.

use crate::errors::UserConfigError;
use camino::Utf8PathBuf;
use etcetera::{BaseStrategy, HomeDirError, base_strategy::Xdg};

/// Returns the path the user config file is read from by default:
/// `$XDG_CONFIG_HOME/testmark/config.toml`, or `~/.config/testmark/config.toml` if
/// `XDG_CONFIG_HOME` is unset.
///
/// Returns `Ok(None)` if the home directory cannot be determined.
pub fn user_config_path() -> Result<Option<Utf8PathBuf>, UserConfigError> {
    let strategy = match Xdg::new() {
        Ok(s) => s,
        Err(HomeDirError) => return Ok(None),
    };

    let config_path = strategy.config_dir().join("testmark").join("config.toml");
    Utf8PathBuf::try_from(config_path)
        .map(Some)
        .map_err(|error| UserConfigError::NonUtf8Path { error })
}
