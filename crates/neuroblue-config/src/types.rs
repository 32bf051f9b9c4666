// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neuroblue_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Serial Port Profile UUID advertised by the BioSleeve service
pub const SERIAL_PORT_PROFILE_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuroblueConfig {
    pub service: ServiceConfig,
    pub transport: TransportConfig,
    pub detector: DetectorConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Service record advertised to discovering peers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub provider: String,
    pub rfcomm_channel: u8,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            uuid: SERIAL_PORT_PROFILE_UUID,
            name: "BioSleeve".to_string(),
            description: "Communicate with the BioSleeve over Bluetooth".to_string(),
            provider: "JPL BioSleeve".to_string(),
            rfcomm_channel: 3,
        }
    }
}

/// How the single peer connection is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Plain TCP listener, used for development peers and tests
    Tcp,
    /// BlueZ serial-profile tty such as `/dev/rfcomm0`
    RfcommDevice,
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Ok(TransportKind::Tcp),
            "rfcomm_device" | "rfcomm" | "device" => Ok(TransportKind::RfcommDevice),
            other => Err(format!("unknown transport kind '{}'", other)),
        }
    }
}

/// Transport bootstrap configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub tcp_bind: String,
    pub device_path: PathBuf,
    pub device_wait_interval_ms: u64,
}

impl TransportConfig {
    pub fn device_wait_interval(&self) -> Duration {
        Duration::from_millis(self.device_wait_interval_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::RfcommDevice,
            tcp_bind: "0.0.0.0:7003".to_string(),
            device_path: PathBuf::from("/dev/rfcomm0"),
            device_wait_interval_ms: 500,
        }
    }
}

/// Classifier families the detection engine may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Svm,
}

/// Features extracted from the sensor window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    SampleVariance,
}

/// Gesture detector settings, handed to the engine once at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum confidence for a detection to be reported as a command
    pub command_threshold: f64,
    pub classifiers: Vec<ClassifierKind>,
    pub training_time_secs: u64,
    pub features: Vec<FeatureKind>,
    pub store_raw_data: bool,
    pub store_features: bool,
    pub store_gestures: bool,
    pub gestures_filename: String,
    pub feature_extraction_update_size: usize,
    pub feature_extraction_window_size: usize,
    /// Source of detection lines for the feed engine; `-` reads stdin
    pub detection_feed: String,
}

impl DetectorConfig {
    pub fn training_time(&self) -> Duration {
        Duration::from_secs(self.training_time_secs)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command_threshold: 0.5,
            classifiers: vec![ClassifierKind::Svm],
            training_time_secs: 6,
            features: vec![FeatureKind::SampleVariance],
            store_raw_data: false,
            store_features: false,
            store_gestures: true,
            gestures_filename: "gestures.txt".to_string(),
            feature_extraction_update_size: 100,
            feature_extraction_window_size: 300,
            detection_feed: "-".to_string(),
        }
    }
}

/// Command protocol session behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Poll for STOP while detecting. `false` keeps detection running until the channel closes.
    pub honor_stop: bool,
    pub detect_poll_min_ms: u64,
    pub detect_poll_max_ms: u64,
}

impl SessionConfig {
    pub fn detect_poll_min(&self) -> Duration {
        Duration::from_millis(self.detect_poll_min_ms)
    }

    pub fn detect_poll_max(&self) -> Duration {
        Duration::from_millis(self.detect_poll_max_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            honor_stop: true,
            detect_poll_min_ms: 1,
            detect_poll_max_ms: 20,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
    /// Enables per-run log folders when set
    pub log_dir: Option<PathBuf>,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
            retention_runs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid_matches_serial_port_profile() {
        let config = ServiceConfig::default();
        assert_eq!(
            config.uuid.to_string().to_uppercase(),
            "00001101-0000-1000-8000-00805F9B34FB"
        );
        assert_eq!(config.rfcomm_channel, 3);
    }

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!("tcp".parse::<TransportKind>(), Ok(TransportKind::Tcp));
        assert_eq!(
            "RFCOMM_DEVICE".parse::<TransportKind>(),
            Ok(TransportKind::RfcommDevice)
        );
        assert!("carrier-pigeon".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: NeuroblueConfig = toml::from_str(
            r#"
            [detector]
            training_time_secs = 2
            classifiers = ["svm"]

            [transport]
            kind = "tcp"
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.training_time_secs, 2);
        assert_eq!(config.detector.command_threshold, 0.5);
        assert_eq!(config.transport.kind, TransportKind::Tcp);
        assert_eq!(config.transport.tcp_bind, "0.0.0.0:7003");
        assert!(config.session.honor_stop);
    }

    #[test]
    fn test_durations() {
        let session = SessionConfig::default();
        assert_eq!(session.detect_poll_min(), Duration::from_millis(1));
        assert_eq!(session.detect_poll_max(), Duration::from_millis(20));
        assert_eq!(DetectorConfig::default().training_time(), Duration::from_secs(6));
    }
}
