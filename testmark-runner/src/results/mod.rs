// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured test results scraped from build tool console output.

mod parser;

pub use parser::parse;

use std::fmt;
use testmark_metadata::{OutcomeStatusSummary, SummaryTotals};

/// Whether a test passed or failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
}

impl OutcomeStatus {
    /// Parses a status token as printed by the test logger.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "PASSED" => Some(Self::Passed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Converts this status to its serialized form.
    pub fn to_summary(self) -> OutcomeStatusSummary {
        match self {
            Self::Passed => OutcomeStatusSummary::Passed,
            Self::Failed => OutcomeStatusSummary::Failed,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_summary().fmt(f)
    }
}

/// How a test is identified in the console output.
///
/// The test logger prints either the declared method name (as `name()`) or, for tests with an
/// explicit label, the label itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TestIdentifier {
    /// The declared method name, without the trailing `()`.
    Method(String),
    /// A human-readable display name.
    DisplayName(String),
}

impl TestIdentifier {
    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Method(name) | Self::DisplayName(name) => name,
        }
    }
}

/// A single test's pass/fail result extracted from console text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    /// The fully-qualified class the test belongs to.
    pub class_name: String,
    /// The method name or display name.
    pub identifier: TestIdentifier,
    /// Whether the test passed.
    pub status: OutcomeStatus,
}

impl TestOutcome {
    /// Returns the declared method name, if the output used one.
    pub fn method_name(&self) -> Option<&str> {
        match &self.identifier {
            TestIdentifier::Method(name) => Some(name),
            TestIdentifier::DisplayName(_) => None,
        }
    }

    /// Returns the display name, if the output used one.
    pub fn display_name(&self) -> Option<&str> {
        match &self.identifier {
            TestIdentifier::Method(_) => None,
            TestIdentifier::DisplayName(name) => Some(name),
        }
    }

    /// Returns `class_name.identifier`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.class_name, self.identifier.as_str())
    }
}

/// The structured result of parsing one run's console output.
///
/// The totals come from the summary line and the per-test lists from the itemized section.
/// The two are parsed from different regions of the output and are not reconciled: for example
/// `total_passed` need not equal `passed.len()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Passed tests, in output order.
    pub passed: Vec<TestOutcome>,
    /// Failed tests, in output order.
    pub failed: Vec<TestOutcome>,
    /// Executed minus failed, from the summary line.
    pub total_passed: usize,
    /// Failed, from the summary line.
    pub total_failed: usize,
    /// Skipped, from the summary line.
    pub total_skipped: usize,
    pub(crate) summary_found: bool,
}

impl ResultSet {
    /// Returns true if a summary line was found in the output.
    ///
    /// When this is false all totals are zero, which means "could not parse", not "no tests ran".
    pub fn has_summary(&self) -> bool {
        self.summary_found
    }

    /// Returns `total_passed + total_failed`.
    pub fn total(&self) -> usize {
        self.total_passed + self.total_failed
    }

    /// Returns all outcomes: passed ones first, then failed ones.
    pub fn outcomes(&self) -> impl Iterator<Item = &TestOutcome> {
        self.passed.iter().chain(&self.failed)
    }

    /// Returns the totals in serialized form.
    pub fn totals(&self) -> SummaryTotals {
        SummaryTotals {
            passed: self.total_passed,
            failed: self.total_failed,
            skipped: self.total_skipped,
        }
    }

    fn push(&mut self, outcome: TestOutcome) {
        match outcome.status {
            OutcomeStatus::Passed => self.passed.push(outcome),
            OutcomeStatus::Failed => self.failed.push(outcome),
        }
    }
}
