// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for testmark-runner.

use std::{error::Error, fmt};

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "indicator" if `count` is 1, otherwise "indicators".
    pub fn indicators_str(count: usize) -> &'static str {
        if count == 1 {
            "indicator"
        } else {
            "indicators"
        }
    }
}

/// Displays an error along with its chain of sources, on a single line.
///
/// Used when an error is only logged, not propagated.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }

        Ok(())
    }
}

/// Decodes the backslash escapes that may appear in a Java or Kotlin string literal.
///
/// Unknown escapes are kept verbatim.
pub(crate) fn unescape_string_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(c @ ('"' | '\'' | '\\' | '$')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
