// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary of a single annotated run, as printed by `--message-format json`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct RunSummary {
    /// The version of this format. Currently always [`RunSummary::FORMAT_VERSION`].
    pub format_version: u32,

    /// The document that was annotated.
    pub document: Utf8PathBuf,

    /// Totals parsed from the build tool's summary line.
    ///
    /// These are parsed independently of `indicators` and may disagree with it.
    pub totals: SummaryTotals,

    /// One entry per source line that received an indicator, ordered by line.
    pub indicators: Vec<IndicatorSummary>,

    /// Fully-qualified names of outcomes that could not be matched to a declaration.
    #[serde(default)]
    pub unresolved: Vec<String>,
}

impl RunSummary {
    /// The current format version.
    pub const FORMAT_VERSION: u32 = 1;

    /// Creates a new summary for the given document.
    pub fn new(
        document: impl Into<Utf8PathBuf>,
        totals: SummaryTotals,
        indicators: Vec<IndicatorSummary>,
        unresolved: Vec<String>,
    ) -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            document: document.into(),
            totals,
            indicators,
            unresolved,
        }
    }

    /// Parses a summary from JSON.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}

/// Counts parsed from the build tool's summary line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SummaryTotals {
    /// Executed tests minus failed tests.
    pub passed: usize,
    /// Failed tests.
    pub failed: usize,
    /// Skipped tests.
    pub skipped: usize,
}

impl SummaryTotals {
    /// Returns the number of tests that produced a pass or fail result.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// An indicator placed on a source line.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndicatorSummary {
    /// The 1-based line the indicator is attached to.
    pub line: usize,
    /// The outcome shown by the indicator.
    pub status: OutcomeStatusSummary,
    /// The fully-qualified test name.
    pub name: String,
}

/// The outcome of a single test, in serialized form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatusSummary {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
}

impl fmt::Display for OutcomeStatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
