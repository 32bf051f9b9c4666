// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-byte codec over a [`DuplexChannel`]
//!
//! The codec keeps no state of its own: one call moves exactly one byte.
//! Reads distinguish a received byte, "nothing yet" and a closed channel, so
//! a vanished peer ends the session instead of looking like an endless run of
//! `NULL` labels.

use std::io;

use tracing::trace;

use crate::channel::{is_disconnect, ChannelError, DuplexChannel};
use crate::label::Label;

/// Result of reading one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One byte arrived
    Byte(u8),
    /// Nothing has arrived yet (non-blocking reads only)
    Pending,
    /// The peer closed the channel
    Closed,
}

pub struct ByteCodec<C> {
    channel: C,
}

impl<C: DuplexChannel> ByteCodec<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Block until one byte arrives or the channel closes
    ///
    /// Never returns [`ReadOutcome::Pending`].
    pub fn read_byte(&mut self) -> Result<ReadOutcome, ChannelError> {
        let mut buf = [0u8; 1];
        loop {
            match self.channel.read(&mut buf) {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(_) => {
                    trace!("rx 0x{:02X}", buf[0]);
                    return Ok(ReadOutcome::Byte(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return classify_read_error(e),
            }
        }
    }

    /// Read one byte if one is already available
    pub fn poll_byte(&mut self) -> Result<ReadOutcome, ChannelError> {
        let mut buf = [0u8; 1];
        match self.channel.try_read(&mut buf) {
            Ok(None) => Ok(ReadOutcome::Pending),
            Ok(Some(0)) => Ok(ReadOutcome::Closed),
            Ok(Some(_)) => {
                trace!("rx 0x{:02X}", buf[0]);
                Ok(ReadOutcome::Byte(buf[0]))
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                Ok(ReadOutcome::Pending)
            }
            Err(e) => classify_read_error(e),
        }
    }

    /// Write exactly one byte
    ///
    /// No acknowledgment and no retry; a vanished peer yields [`ChannelError::Closed`].
    pub fn write_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.channel
            .write_all(&[byte])
            .and_then(|_| self.channel.flush())
            .map_err(ChannelError::from_io)?;
        trace!("tx 0x{:02X}", byte);
        Ok(())
    }

    pub fn write_label(&mut self, label: Label) -> Result<(), ChannelError> {
        self.write_byte(label.as_byte())
    }
}

fn classify_read_error(err: io::Error) -> Result<ReadOutcome, ChannelError> {
    if is_disconnect(&err) {
        Ok(ReadOutcome::Closed)
    } else {
        Err(ChannelError::Io(err))
    }
}
