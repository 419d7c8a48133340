// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-specific configuration for testmark.
//!
//! ## Config file location
//!
//! The user config file is read from `$XDG_CONFIG_HOME/testmark/config.toml`, or
//! `~/.config/testmark/config.toml` if `XDG_CONFIG_HOME` is unset. The location can be overridden
//! with `--user-config-file` or `TESTMARK_USER_CONFIG_FILE`; the value `none` skips loading.
//!
//! ## Configuration hierarchy
//!
//! Settings are resolved in the following order (highest priority first):
//!
//! 1. The user config file.
//! 2. Built-in defaults, embedded from `default-user-config.toml`.

mod discovery;
pub mod elements;
mod imp;

pub use discovery::*;
pub use imp::*;
