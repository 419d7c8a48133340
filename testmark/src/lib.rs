// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run Gradle tests and mark JVM test sources with the results.
//!
//! This crate is the `testmark` binary. The engine lives in `testmark-runner`, and the
//! machine-readable output format in `testmark-metadata`.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod helpers;
mod output;
mod sink;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
