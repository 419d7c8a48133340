// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for [testmark](https://crates.io/crates/testmark).
//!
//! `testmark` annotates JVM test sources with the outcome of a Gradle test run. With
//! `--message-format json` it writes a [`RunSummary`] to stdout; this crate provides the types to
//! read it back, along with the exit codes the binary documents.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
