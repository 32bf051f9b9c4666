// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are within valid ranges and consistent with
//! each other before the session driver starts.

use crate::{ConfigError, ConfigResult, NeuroblueConfig, TransportKind};
use std::net::SocketAddr;

/// Highest RFCOMM server channel
const MAX_RFCOMM_CHANNEL: u8 = 30;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: String, range: String },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { field, value, range } => {
                write!(f, "{} = {} is outside valid range ({})", field, value, range)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// All problems are collected before failing so the user sees them at once.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &NeuroblueConfig) -> ConfigResult<()> {
    let errors = collect_validation_errors(config);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Run every check and return the individual failures
pub fn collect_validation_errors(config: &NeuroblueConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_service(config, &mut errors);
    validate_transport(config, &mut errors);
    validate_detector(config, &mut errors);
    validate_session(config, &mut errors);
    errors
}

fn validate_service(config: &NeuroblueConfig, errors: &mut Vec<ConfigValidationError>) {
    let service = &config.service;
    if service.name.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "service.name".to_string(),
        });
    }
    if service.rfcomm_channel == 0 || service.rfcomm_channel > MAX_RFCOMM_CHANNEL {
        errors.push(ConfigValidationError::OutOfRange {
            field: "service.rfcomm_channel".to_string(),
            value: service.rfcomm_channel.to_string(),
            range: format!("1-{}", MAX_RFCOMM_CHANNEL),
        });
    }
}

fn validate_transport(config: &NeuroblueConfig, errors: &mut Vec<ConfigValidationError>) {
    let transport = &config.transport;
    match transport.kind {
        TransportKind::Tcp => {
            if let Err(e) = transport.tcp_bind.parse::<SocketAddr>() {
                errors.push(ConfigValidationError::InvalidValue {
                    field: "transport.tcp_bind".to_string(),
                    reason: e.to_string(),
                });
            }
        }
        TransportKind::RfcommDevice => {
            if transport.device_path.as_os_str().is_empty() {
                errors.push(ConfigValidationError::MissingRequired {
                    field: "transport.device_path".to_string(),
                });
            }
            if transport.device_wait_interval_ms == 0 {
                errors.push(ConfigValidationError::InvalidValue {
                    field: "transport.device_wait_interval_ms".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
    }
}

fn validate_detector(config: &NeuroblueConfig, errors: &mut Vec<ConfigValidationError>) {
    let detector = &config.detector;
    if !(0.0..=1.0).contains(&detector.command_threshold) {
        errors.push(ConfigValidationError::OutOfRange {
            field: "detector.command_threshold".to_string(),
            value: detector.command_threshold.to_string(),
            range: "0.0-1.0".to_string(),
        });
    }
    if detector.classifiers.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.classifiers".to_string(),
        });
    }
    if detector.features.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.features".to_string(),
        });
    }
    if detector.feature_extraction_update_size == 0 || detector.feature_extraction_window_size == 0
    {
        errors.push(ConfigValidationError::InvalidValue {
            field: "detector.feature_extraction_*_size".to_string(),
            reason: "window and update sizes must be non-zero".to_string(),
        });
    } else if detector.feature_extraction_window_size < detector.feature_extraction_update_size {
        errors.push(ConfigValidationError::InvalidValue {
            field: "detector.feature_extraction_window_size".to_string(),
            reason: format!(
                "window size {} is smaller than update size {}",
                detector.feature_extraction_window_size, detector.feature_extraction_update_size
            ),
        });
    }
    if detector.store_gestures && detector.gestures_filename.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.gestures_filename".to_string(),
        });
    }
    if detector.detection_feed.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "detector.detection_feed".to_string(),
        });
    }
}

fn validate_session(config: &NeuroblueConfig, errors: &mut Vec<ConfigValidationError>) {
    let session = &config.session;
    if session.detect_poll_min_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "session.detect_poll_min_ms".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if session.detect_poll_min_ms > session.detect_poll_max_ms {
        errors.push(ConfigValidationError::InvalidValue {
            field: "session.detect_poll_max_ms".to_string(),
            reason: format!(
                "{} is below detect_poll_min_ms {}",
                session.detect_poll_max_ms, session.detect_poll_min_ms
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(collect_validation_errors(&NeuroblueConfig::default()).is_empty());
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut config = NeuroblueConfig::default();
        config.service.rfcomm_channel = 31;
        let errors = collect_validation_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_tcp_bind_must_parse() {
        let mut config = NeuroblueConfig::default();
        config.transport.kind = TransportKind::Tcp;
        config.transport.tcp_bind = "localhost".to_string();
        assert!(validate_config(&config).is_err());

        config.transport.tcp_bind = "127.0.0.1:7003".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = NeuroblueConfig::default();
        config.detector.command_threshold = 1.5;
        config.detector.classifiers.clear();
        config.detector.feature_extraction_window_size = 50;
        config.session.detect_poll_min_ms = 30;

        let errors = collect_validation_errors(&config);
        assert_eq!(errors.len(), 4);

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("detector.command_threshold"));
                assert!(msg.contains("detector.classifiers"));
                assert!(msg.contains("window size 50"));
                assert!(msg.contains("session.detect_poll_max_ms"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
