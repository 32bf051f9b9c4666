// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! # neuroblue-observability
//!
//! Logging setup shared by the NeuroBlue crates, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with retention (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known NeuroBlue crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neuroblue",
    "neuroblue-config",
    "neuroblue-protocol",
    "neuroblue-session",
];

/// Tracing target for a crate name (`neuroblue-session` -> `neuroblue_session`)
///
/// `EnvFilter` directives match module paths, which use underscores.
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
