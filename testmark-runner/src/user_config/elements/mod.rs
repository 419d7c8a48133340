// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User config elements.

mod build;
mod display;

pub use build::*;
pub use display::*;
