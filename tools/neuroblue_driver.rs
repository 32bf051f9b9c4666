// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
NeuroBlue driver

Waits for one peer, then serves train/detect commands until the peer leaves.

Usage:
  neuroblue [--config <file>] [--transport tcp|rfcomm_device] [--feed <path|->] [--debug-<crate>]

Example:
  classifier --emit-lines | neuroblue --transport tcp --tcp-bind 127.0.0.1:7003 --feed -
*/

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use neuroblue::config::{
    load_config, load_config_or_default, validate_config, NeuroblueConfig, TransportKind,
};
use neuroblue::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingOptions};
use neuroblue::session::{
    serve, FeedEngine, RfcommDeviceBootstrap, ServiceRecord, SessionOptions, SessionSummary,
    TcpBootstrap,
};

/// NeuroBlue - serial-profile gesture session driver
#[derive(Parser, Debug)]
#[command(name = "neuroblue", version, about, long_about = None)]
struct Args {
    /// Configuration file (default: search for neuroblue_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport: tcp or rfcomm_device
    #[arg(long)]
    transport: Option<String>,

    /// Listen address for the tcp transport
    #[arg(long)]
    tcp_bind: Option<String>,

    /// RFCOMM tty for the rfcomm_device transport
    #[arg(long)]
    device_path: Option<String>,

    /// RFCOMM channel advertised in the service record
    #[arg(long)]
    rfcomm_channel: Option<String>,

    /// Seconds a training request blocks
    #[arg(long)]
    training_time_secs: Option<String>,

    /// Detection feed: file, FIFO or `-` for stdin
    #[arg(long)]
    feed: Option<String>,

    /// Leave detection when the peer sends STOP (true/false)
    #[arg(long)]
    honor_stop: Option<String>,

    /// Default log level
    #[arg(long)]
    log_level: Option<String>,

    /// Print the debug flag help and exit
    #[arg(long, default_value_t = false)]
    help_debug: bool,
}

impl Args {
    /// Overrides keyed the way the configuration loader expects them
    fn overrides(&self) -> HashMap<String, String> {
        [
            ("transport", &self.transport),
            ("tcp_bind", &self.tcp_bind),
            ("device_path", &self.device_path),
            ("rfcomm_channel", &self.rfcomm_channel),
            ("training_time_secs", &self.training_time_secs),
            ("detection_feed", &self.feed),
            ("honor_stop", &self.honor_stop),
            ("log_level", &self.log_level),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
    }
}

fn load(args: &Args) -> Result<(NeuroblueConfig, Option<PathBuf>)> {
    let overrides = args.overrides();
    let loaded = match &args.config {
        Some(path) => {
            let config = load_config(Some(path.as_path()), Some(&overrides))
                .with_context(|| format!("failed to load {}", path.display()))?;
            (config, Some(path.clone()))
        }
        None => load_config_or_default(Some(&overrides)).context("failed to load configuration")?,
    };
    validate_config(&loaded.0).context("invalid configuration")?;
    Ok(loaded)
}

fn run(config: &NeuroblueConfig) -> Result<SessionSummary> {
    let engine = FeedEngine::from_config(&config.detector).with_context(|| {
        format!("failed to open detection feed '{}'", config.detector.detection_feed)
    })?;
    let options = SessionOptions::from(&config.session);

    let summary = match config.transport.kind {
        TransportKind::Tcp => {
            let mut bootstrap =
                TcpBootstrap::bind(&config.transport.tcp_bind, ServiceRecord::from(&config.service))?;
            serve(&mut bootstrap, engine, options)?
        }
        TransportKind::RfcommDevice => {
            let mut bootstrap = RfcommDeviceBootstrap::from_config(&config.transport, &config.service);
            serve(&mut bootstrap, engine, options)?
        }
    };
    Ok(summary)
}

fn main() -> Result<()> {
    // Debug flags are not clap options; strip them before parsing
    let debug_flags = parse_debug_flags();
    let args = Args::parse_from(env::args().filter(|arg| !arg.starts_with("--debug-")));

    if args.help_debug {
        println!("{}", debug_flags_help());
        return Ok(());
    }

    let (config, source) = load(&args)?;
    let _log_guard = init_logging(&debug_flags, &LoggingOptions::from(&config.logging))?;

    info!("NeuroBlue {}", env!("CARGO_PKG_VERSION"));
    match source {
        Some(path) => info!("configuration loaded from {}", path.display()),
        None => info!("no configuration file found, using built-in defaults"),
    }

    let summary = run(&config)?;
    info!(
        "done: {} trainings, {} detections, {} rejected labels ({})",
        summary.trainings, summary.detections_sent, summary.labels_rejected, summary.end_reason
    );
    Ok(())
}
