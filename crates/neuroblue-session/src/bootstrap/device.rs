// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use neuroblue_config::{ServiceConfig, TransportConfig};
use neuroblue_protocol::DeviceChannel;
use tracing::{debug, info, warn};

use super::{ChannelBootstrap, ServiceRecord};
use crate::error::BootstrapError;

/// Bootstrap over a BlueZ serial-profile tty
///
/// The system Bluetooth daemon publishes the SDP record and binds the
/// configured RFCOMM channel; an accepted connection shows up as the device
/// node. This bootstrap waits for that node and opens it.
pub struct RfcommDeviceBootstrap {
    path: PathBuf,
    wait_interval: Duration,
    max_wait: Option<Duration>,
    raw_mode: bool,
    record: ServiceRecord,
}

impl RfcommDeviceBootstrap {
    pub fn new(path: impl Into<PathBuf>, wait_interval: Duration, record: ServiceRecord) -> Self {
        Self {
            path: path.into(),
            wait_interval,
            max_wait: None,
            raw_mode: true,
            record,
        }
    }

    pub fn from_config(transport: &TransportConfig, service: &ServiceConfig) -> Self {
        Self::new(
            &transport.device_path,
            transport.device_wait_interval(),
            ServiceRecord::from(service),
        )
    }

    /// Give up after `max_wait` instead of waiting forever
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Skip switching the tty to raw mode (regular files, pseudo devices)
    pub fn without_raw_mode(mut self) -> Self {
        self.raw_mode = false;
        self
    }

    fn wait_for_device(&self) -> Result<(), BootstrapError> {
        let started = Instant::now();
        let mut announced = false;
        while !self.path.exists() {
            if let Some(max_wait) = self.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(BootstrapError::Device {
                        path: self.path.clone(),
                        source: io::Error::new(io::ErrorKind::TimedOut, "no peer connected"),
                    });
                }
            }
            if !announced {
                info!("waiting for a peer on {}", self.path.display());
                announced = true;
            }
            thread::sleep(self.wait_interval);
        }
        Ok(())
    }
}

/// Put the tty into raw mode so bytes pass through unmodified
fn configure_raw(path: &Path) {
    match Command::new("stty").arg("-F").arg(path).args(["raw", "-echo"]).status() {
        Ok(status) if status.success() => debug!("{} switched to raw mode", path.display()),
        Ok(status) => warn!("stty on {} exited with {}", path.display(), status),
        Err(e) => warn!("could not run stty for {}: {}", path.display(), e),
    }
}

impl ChannelBootstrap for RfcommDeviceBootstrap {
    type Channel = DeviceChannel;

    fn obtain_channel(&mut self) -> Result<DeviceChannel, BootstrapError> {
        info!("advertising {} via the system Bluetooth daemon", self.record);
        self.wait_for_device()?;

        if self.raw_mode {
            configure_raw(&self.path);
        }

        let channel = DeviceChannel::open(&self.path).map_err(|source| BootstrapError::Device {
            path: self.path.clone(),
            source,
        })?;
        info!("peer connected on {}", self.path.display());
        Ok(channel)
    }
}
