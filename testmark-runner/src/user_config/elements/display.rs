// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display-related user configuration.

use crate::results::OutcomeStatus;
use serde::Deserialize;

/// Display configuration (deserialized form).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(in crate::user_config) struct DeserializedDisplayConfig {
    pub(in crate::user_config) pass_marker: Option<String>,
    pub(in crate::user_config) fail_marker: Option<String>,
    pub(in crate::user_config) pass_annotation: Option<String>,
    pub(in crate::user_config) fail_annotation: Option<String>,
}

/// Default display configuration with all values required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(in crate::user_config) struct DefaultDisplayConfig {
    pass_marker: String,
    fail_marker: String,
    pass_annotation: String,
    fail_annotation: String,
}

/// Resolved display configuration: how indicators look.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Gutter marker for passed tests.
    pub pass_marker: String,
    /// Gutter marker for failed tests.
    pub fail_marker: String,
    /// End-of-line text for passed tests.
    pub pass_annotation: String,
    /// End-of-line text for failed tests.
    pub fail_annotation: String,
}

impl DisplayConfig {
    pub(in crate::user_config) fn resolve(
        default_config: &DefaultDisplayConfig,
        user_config: Option<&DeserializedDisplayConfig>,
    ) -> Self {
        let pick = |user: Option<&Option<String>>, default: &String| {
            user.and_then(|value| value.clone())
                .unwrap_or_else(|| default.clone())
        };
        Self {
            pass_marker: pick(
                user_config.map(|c| &c.pass_marker),
                &default_config.pass_marker,
            ),
            fail_marker: pick(
                user_config.map(|c| &c.fail_marker),
                &default_config.fail_marker,
            ),
            pass_annotation: pick(
                user_config.map(|c| &c.pass_annotation),
                &default_config.pass_annotation,
            ),
            fail_annotation: pick(
                user_config.map(|c| &c.fail_annotation),
                &default_config.fail_annotation,
            ),
        }
    }

    /// Returns the gutter marker for a status.
    pub fn marker(&self, status: OutcomeStatus) -> &str {
        match status {
            OutcomeStatus::Passed => &self.pass_marker,
            OutcomeStatus::Failed => &self.fail_marker,
        }
    }

    /// Returns the end-of-line annotation for a status.
    pub fn annotation(&self, status: OutcomeStatus) -> &str {
        match status {
            OutcomeStatus::Passed => &self.pass_annotation,
            OutcomeStatus::Failed => &self.fail_annotation,
        }
    }
}
