// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build tool user configuration.

use crate::errors::UserConfigError;
use serde::Deserialize;

/// Build tool configuration (deserialized form).
///
/// All fields are optional; unspecified fields use the defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(in crate::user_config) struct DeserializedBuildConfig {
    /// The build tool command line.
    pub(in crate::user_config) program: Option<String>,

    /// Arguments appended after the test selection.
    pub(in crate::user_config) extra_args: Option<Vec<String>>,
}

/// Default build tool configuration with all values required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(in crate::user_config) struct DefaultBuildConfig {
    program: String,
    extra_args: Vec<String>,
}

/// Resolved build tool configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// The build tool command, split into words. `None` means auto-detect.
    pub program: Option<Vec<String>>,

    /// Arguments appended after the test selection.
    pub extra_args: Vec<String>,
}

impl BuildConfig {
    pub(in crate::user_config) fn resolve(
        default_config: &DefaultBuildConfig,
        user_config: Option<&DeserializedBuildConfig>,
    ) -> Result<Self, UserConfigError> {
        let program = user_config
            .and_then(|config| config.program.as_deref())
            .unwrap_or(&default_config.program);
        let extra_args = user_config
            .and_then(|config| config.extra_args.clone())
            .unwrap_or_else(|| default_config.extra_args.clone());

        Ok(Self {
            program: parse_program(program)?,
            extra_args,
        })
    }
}

fn parse_program(program: &str) -> Result<Option<Vec<String>>, UserConfigError> {
    if program.trim().is_empty() {
        return Ok(None);
    }
    let words = shell_words::split(program).map_err(|error| UserConfigError::InvalidProgram {
        program: program.to_owned(),
        error,
    })?;
    match words.first() {
        Some(command) if !command.is_empty() => Ok(Some(words)),
        _ => Err(UserConfigError::EmptyProgram {
            program: program.to_owned(),
        }),
    }
}
