// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [testmark](https://crates.io/crates/testmark).
//!
//! The basic flow of a run is:
//!
//! 1. A [`TestCommand`](command::TestCommand) is turned into a build tool invocation and executed
//!    by a [`ProcessRunner`](process::ProcessRunner).
//! 2. The captured console text is parsed into a [`ResultSet`](results::ResultSet).
//! 3. Each outcome is matched to a declaration by a [`SourceLocator`](locate::SourceLocator).
//! 4. Matched outcomes replace the document's entry in the
//!    [`IndicatorStore`](indicators::IndicatorStore), and are painted through a
//!    [`PresentationSink`](reporter::PresentationSink).
//!
//! [`TestSession`](session::TestSession) ties these together.

pub mod command;
pub mod document;
pub mod errors;
mod helpers;
pub mod indicators;
pub mod last_command;
pub mod locate;
pub mod process;
pub mod reporter;
pub mod results;
pub mod session;
pub mod user_config;

pub use helpers::{DisplayErrorChain, plural};
