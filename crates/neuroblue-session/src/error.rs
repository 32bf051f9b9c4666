// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for session and bootstrap

use std::io;
use std::path::PathBuf;

use neuroblue_protocol::ChannelError;

/// Result type alias using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport failure other than an orderly close
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// No channel could be obtained
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to accept peer: {0}")]
    Accept(#[source] io::Error),

    #[error("RFCOMM device {path} unavailable: {source}")]
    Device {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
