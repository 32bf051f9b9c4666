// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeuroblueConfig, TransportKind};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "neuroblue_configuration.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "NEUROBLUE_CONFIG_PATH";

/// Find the NeuroBlue configuration file
///
/// Search order:
/// 1. `NEUROBLUE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neuroblue_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeuroblueConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeuroblueConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the built-in defaults
///
/// Returns the path that was loaded, if any. Overrides are applied either way.
pub fn load_config_or_default(
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<(NeuroblueConfig, Option<PathBuf>)> {
    match find_config_file() {
        Ok(path) => load_config(Some(&path), cli_args).map(|config| (config, Some(path))),
        Err(ConfigError::FileNotFound(_)) if env::var(CONFIG_PATH_ENV).is_err() => {
            let mut config = NeuroblueConfig::default();
            apply_environment_overrides(&mut config);
            if let Some(cli) = cli_args {
                apply_cli_overrides(&mut config, cli)?;
            }
            Ok((config, None))
        }
        Err(e) => Err(e),
    }
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROBLUE_TRANSPORT_KIND` -> `transport.kind`
/// - `NEUROBLUE_TCP_BIND` -> `transport.tcp_bind`
/// - `NEUROBLUE_DEVICE_PATH` -> `transport.device_path`
/// - `NEUROBLUE_RFCOMM_CHANNEL` -> `service.rfcomm_channel`
/// - `NEUROBLUE_TRAINING_TIME_SECS` -> `detector.training_time_secs`
/// - `NEUROBLUE_COMMAND_THRESHOLD` -> `detector.command_threshold`
/// - `NEUROBLUE_DETECTION_FEED` -> `detector.detection_feed`
/// - `NEUROBLUE_HONOR_STOP` -> `session.honor_stop`
/// - `NEUROBLUE_LOG_LEVEL` -> `logging.level`
/// - `NEUROBLUE_LOG_DIR` -> `logging.log_dir`
///
/// Unparsable numeric values are ignored and the previous value is kept.
pub fn apply_environment_overrides(config: &mut NeuroblueConfig) {
    // Transport
    if let Ok(value) = env::var("NEUROBLUE_TRANSPORT_KIND") {
        if let Ok(kind) = value.parse::<TransportKind>() {
            config.transport.kind = kind;
        }
    }
    if let Ok(value) = env::var("NEUROBLUE_TCP_BIND") {
        config.transport.tcp_bind = value;
    }
    if let Ok(value) = env::var("NEUROBLUE_DEVICE_PATH") {
        config.transport.device_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("NEUROBLUE_RFCOMM_CHANNEL") {
        if let Ok(channel) = value.parse::<u8>() {
            config.service.rfcomm_channel = channel;
        }
    }

    // Detector
    if let Ok(value) = env::var("NEUROBLUE_TRAINING_TIME_SECS") {
        if let Ok(secs) = value.parse::<u64>() {
            config.detector.training_time_secs = secs;
        }
    }
    if let Ok(value) = env::var("NEUROBLUE_COMMAND_THRESHOLD") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.detector.command_threshold = threshold;
        }
    }
    if let Ok(value) = env::var("NEUROBLUE_DETECTION_FEED") {
        config.detector.detection_feed = value;
    }

    // Session
    if let Ok(value) = env::var("NEUROBLUE_HONOR_STOP") {
        config.session.honor_stop = parse_bool(&value);
    }

    // Logging
    if let Ok(value) = env::var("NEUROBLUE_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("NEUROBLUE_LOG_DIR") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"transport": "tcp", "tcp_bind": "127.0.0.1:7003"}`)
///
/// # Errors
///
/// Unlike environment overrides, a malformed CLI value is reported as
/// `ConfigError::InvalidValue` since the user typed it explicitly.
pub fn apply_cli_overrides(
    config: &mut NeuroblueConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    fn invalid(key: &str, value: &str) -> ConfigError {
        ConfigError::InvalidValue(format!("{} = '{}'", key, value))
    }

    if let Some(value) = cli_args.get("transport") {
        config.transport.kind = value
            .parse::<TransportKind>()
            .map_err(|_| invalid("transport", value))?;
    }
    if let Some(value) = cli_args.get("tcp_bind") {
        config.transport.tcp_bind = value.clone();
    }
    if let Some(value) = cli_args.get("device_path") {
        config.transport.device_path = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("rfcomm_channel") {
        config.service.rfcomm_channel =
            value.parse().map_err(|_| invalid("rfcomm_channel", value))?;
    }
    if let Some(value) = cli_args.get("training_time_secs") {
        config.detector.training_time_secs = value
            .parse()
            .map_err(|_| invalid("training_time_secs", value))?;
    }
    if let Some(value) = cli_args.get("detection_feed") {
        config.detector.detection_feed = value.clone();
    }
    if let Some(value) = cli_args.get("honor_stop") {
        config.session.honor_stop = parse_bool(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }

    Ok(())
}
