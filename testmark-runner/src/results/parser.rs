// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeStatus, ResultSet, TestIdentifier, TestOutcome};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

// The test logger's "standard" theme prints, per class:
//
// com.foo.BarTest
//
//   Test baz() PASSED
//   Test should handle null input FAILED (0.1s)
//
// and, at the end of the build:
//
// FAILURE: Executed 6 tests in 1.0s (2 failed)

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[A-Z]+:\s+)?Executed (\d+) tests?\b[^(]*(?:\(([^)]*)\))?")
        .expect("summary regex is valid")
});

static SUMMARY_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) (failed|skipped)").expect("count regex is valid"));

static CLASS_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}_$][\w$]*(?:\.[\p{L}_$][\w$]*)*Test$").expect("class header regex is valid")
});

// The status token is the last PASSED/FAILED on the line, optionally followed by a duration.
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\s(PASSED|FAILED)(?:\s+\([^()]*\))?\s*$").expect("status regex is valid")
});

static METHOD_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w$]+)\(\)").expect("method call regex is valid"));

const RESULT_LINE_PREFIX: &str = "  Test ";

/// Parses the console output of a Gradle test run into a [`ResultSet`].
///
/// This never fails: lines that don't fit the expected shapes are skipped. If no summary line is
/// found, all totals are zero and [`ResultSet::has_summary`] returns false.
pub fn parse(raw_output: &str) -> ResultSet {
    let text = strip_ansi_escapes::strip_str(raw_output);
    let mut results = ResultSet::default();

    parse_summary(&text, &mut results);

    let mut current_class: Option<&str> = None;
    for line in text.lines() {
        if CLASS_HEADER_RE.is_match(line.trim_end()) {
            current_class = Some(line.trim_end());
            continue;
        }

        // Result lines only count once a class section has started.
        let Some(class_name) = current_class else {
            continue;
        };
        let Some(rest) = line.strip_prefix(RESULT_LINE_PREFIX) else {
            continue;
        };
        match parse_result_line(rest) {
            Some((identifier, status)) => results.push(TestOutcome {
                class_name: class_name.to_owned(),
                identifier,
                status,
            }),
            None => trace!("ignoring result line without a recognized status: {line:?}"),
        }
    }

    debug!(
        "parsed {} passed and {} failed outcomes (summary: {} passed, {} failed, {} skipped)",
        results.passed.len(),
        results.failed.len(),
        results.total_passed,
        results.total_failed,
        results.total_skipped,
    );
    results
}

fn parse_summary(text: &str, results: &mut ResultSet) {
    // Multi-project builds print one summary per test task. A display name can contain the same
    // words, so result lines are skipped.
    let summaries = text
        .lines()
        .filter(|line| !line.starts_with(RESULT_LINE_PREFIX))
        .filter_map(|line| SUMMARY_RE.captures(line));
    for captures in summaries {
        let Some(executed) = captures[1].parse::<usize>().ok() else {
            continue;
        };
        let mut failed = 0;
        let mut skipped = 0;
        if let Some(counts) = captures.get(2) {
            for count in SUMMARY_COUNT_RE.captures_iter(counts.as_str()) {
                let Ok(n) = count[1].parse::<usize>() else {
                    continue;
                };
                match &count[2] {
                    "failed" => failed += n,
                    _ => skipped += n,
                }
            }
        }

        results.summary_found = true;
        results.total_passed += executed.saturating_sub(failed);
        results.total_failed += failed;
        results.total_skipped += skipped;
    }
}

fn parse_result_line(rest: &str) -> Option<(TestIdentifier, OutcomeStatus)> {
    let captures = STATUS_RE.captures(rest)?;
    let status = OutcomeStatus::from_token(&captures[2])?;

    if let Some(method) = METHOD_CALL_RE.captures(rest) {
        return Some((TestIdentifier::Method(method[1].to_owned()), status));
    }

    let display_name = captures[1].trim();
    if display_name.is_empty() {
        return None;
    }
    Some((TestIdentifier::DisplayName(display_name.to_owned()), status))
}
