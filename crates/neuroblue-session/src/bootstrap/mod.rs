// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Channel bootstrap
//!
//! A bootstrap advertises the service, waits for exactly one peer and hands
//! back the connected channel. It runs once, before the session starts; there
//! is no reconnection.
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ ChannelBootstrap              │
//! │ - TcpBootstrap                │  listen, accept one peer
//! │ - RfcommDeviceBootstrap       │  wait for /dev/rfcommN, open it
//! └───────────────┬───────────────┘
//!                 │ DuplexChannel
//! ┌───────────────▼───────────────┐
//! │ Session                       │
//! └───────────────────────────────┘
//! ```

mod device;
mod tcp;

pub use device::RfcommDeviceBootstrap;
pub use tcp::TcpBootstrap;

use std::fmt;

use neuroblue_config::ServiceConfig;
use neuroblue_protocol::DuplexChannel;
use uuid::Uuid;

use crate::error::BootstrapError;

/// Obtain the single duplex channel for this process run
pub trait ChannelBootstrap {
    type Channel: DuplexChannel;

    /// Block until one peer is connected
    fn obtain_channel(&mut self) -> Result<Self::Channel, BootstrapError>;
}

/// Service record advertised to discovering peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub provider: String,
    pub channel: u8,
}

impl From<&ServiceConfig> for ServiceRecord {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            uuid: config.uuid,
            name: config.name.clone(),
            description: config.description.clone(),
            provider: config.provider.clone(),
            channel: config.rfcomm_channel,
        }
    }
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}) by {} uuid={} channel={}",
            self.name, self.description, self.provider, self.uuid, self.channel
        )
    }
}
