// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::info;

use super::{ChannelBootstrap, ServiceRecord};
use crate::error::BootstrapError;

/// Development bootstrap: accept exactly one TCP peer
pub struct TcpBootstrap {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    record: ServiceRecord,
}

impl TcpBootstrap {
    pub fn bind(addr: &str, record: ServiceRecord) -> Result<Self, BootstrapError> {
        let bind_err = |source| BootstrapError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        Ok(Self {
            listener: Some(listener),
            local_addr,
            record,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl ChannelBootstrap for TcpBootstrap {
    type Channel = TcpStream;

    fn obtain_channel(&mut self) -> Result<TcpStream, BootstrapError> {
        let listener = self.listener.take().ok_or_else(|| {
            BootstrapError::Accept(io::Error::new(
                io::ErrorKind::Other,
                "listener already used for a session",
            ))
        })?;

        info!("advertising {} on tcp://{}", self.record, self.local_addr);
        let (stream, peer) = listener.accept().map_err(BootstrapError::Accept)?;
        // Single byte per write
        stream.set_nodelay(true).map_err(BootstrapError::Accept)?;
        info!("peer connected from {}", peer);

        Ok(stream)
    }
}
