// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-neuroblue-session`, `--debug-neuroblue-protocol`, etc.

use std::collections::HashMap;
use std::env;

use crate::{crate_target, KNOWN_CRATES};

/// Environment variable with comma-separated crate names (or `all`)
pub const DEBUG_ENV: &str = "NEUROBLUE_DEBUG";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use neuroblue_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-neuroblue-session".to_string()]);
/// assert!(flags.is_enabled("neuroblue-session"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`, plus `--debug-all`.
    /// Other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
                continue;
            }
            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string(), true);
            }
        }

        flags
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string(), true);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level filter for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags
    ///
    /// Format: `"neuroblue_session=debug,info"`, or just `default_level` if none enabled.
    /// Crate names are sorted so the filter string is stable.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut crates: Vec<&String> = self.enabled_crates.keys().collect();
        crates.sort();

        let mut filters: Vec<String> = crates
            .into_iter()
            .map(|crate_name| format!("{}=debug", crate_target(crate_name)))
            .collect();
        filters.push(default_level.to_lowercase());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and `NEUROBLUE_DEBUG`
///
/// Environment variable format: comma-separated crate names, e.g.
/// `neuroblue-session,neuroblue-protocol`, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(env_var) = env::var(DEBUG_ENV) {
        apply_debug_env(&mut flags, &env_var);
    }
    flags
}

fn apply_debug_env(flags: &mut CrateDebugFlags, env_var: &str) {
    if env_var.trim() == "all" {
        flags.enable_all();
        return;
    }
    for crate_name in env_var.split(',') {
        let crate_name = crate_name.trim();
        if !crate_name.is_empty() {
            flags.enabled_crates.insert(crate_name.to_string(), true);
        }
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {env}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {env}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuroblue-session".to_string()]);
        assert!(flags.is_enabled("neuroblue-session"));
        assert!(!flags.is_enabled("neuroblue-protocol"));
    }

    #[test]
    fn test_non_debug_args_ignored() {
        let flags = CrateDebugFlags::from_args(vec![
            "neuroblue".to_string(),
            "transport=tcp".to_string(),
        ]);
        assert!(!flags.any_enabled());
        assert_eq!(flags.to_filter_string("info"), "info");
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_module_targets() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-neuroblue-session".to_string(),
            "--debug-neuroblue-protocol".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string("WARN"),
            "neuroblue_protocol=debug,neuroblue_session=debug,warn"
        );
    }

    #[test]
    fn test_debug_env_parsing() {
        let mut flags = CrateDebugFlags::default();
        apply_debug_env(&mut flags, " neuroblue-session , ,neuroblue-config");
        assert!(flags.is_enabled("neuroblue-session"));
        assert!(flags.is_enabled("neuroblue-config"));
        assert_eq!(flags.enabled_crates.len(), 2);

        let mut all = CrateDebugFlags::default();
        apply_debug_env(&mut all, "all");
        assert_eq!(all.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuroblue-session".to_string()]);
        assert_eq!(flags.log_level("neuroblue-session"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("neuroblue-config"), tracing::Level::INFO);
    }
}
