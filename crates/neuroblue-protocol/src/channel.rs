// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Duplex byte channel abstraction
//!
//! A channel is the connected stream to exactly one peer. Implementations
//! exist for TCP sockets, RFCOMM tty devices and an in-memory script.

use std::io;

/// Errors surfaced by a channel once the codec has classified them
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The peer went away (EOF, reset, broken pipe)
    #[error("channel closed by peer")]
    Closed,

    /// Any other transport failure
    #[error("channel I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ChannelError {
    /// Map an I/O error, folding the "peer is gone" kinds into [`ChannelError::Closed`]
    pub fn from_io(err: io::Error) -> Self {
        if is_disconnect(&err) {
            ChannelError::Closed
        } else {
            ChannelError::Io(err)
        }
    }
}

/// Linux EIO, reported by a tty whose carrier dropped
const EIO: i32 = 5;

/// `true` for errors that mean the connection no longer exists
///
/// Covers both reads and writes, so a dropped tty carrier ends the session
/// the same way whichever direction notices it first.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    ) || err.raw_os_error() == Some(EIO)
}

/// Ordered, reliable, bidirectional byte stream to one peer
///
/// Implementations do NOT need to be `Sync`: a channel is only ever used from
/// the session thread.
pub trait DuplexChannel {
    /// Short backend name for logs (e.g. "tcp", "rfcomm-device", "memory")
    fn backend_name(&self) -> &str;

    /// Block until at least one byte is available
    ///
    /// Returns `Ok(0)` once the peer has closed the stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Read without blocking
    ///
    /// Returns `Ok(None)` when nothing has arrived yet, `Ok(Some(0))` once the
    /// peer has closed the stream.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;

    /// Write the whole slice, blocking until the transport accepts it
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush any pending transmit data
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: DuplexChannel + ?Sized> DuplexChannel for Box<C> {
    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        (**self).try_read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_kinds_become_closed() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::UnexpectedEof,
        ] {
            let err = ChannelError::from_io(io::Error::from(kind));
            assert!(matches!(err, ChannelError::Closed), "{:?}", kind);
        }
    }

    #[test]
    fn test_tty_carrier_loss_becomes_closed() {
        let err = io::Error::from_raw_os_error(EIO);
        assert!(is_disconnect(&err));
        assert!(matches!(ChannelError::from_io(err), ChannelError::Closed));
    }

    #[test]
    fn test_other_kinds_stay_io() {
        let err = ChannelError::from_io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ChannelError::Io(_)));
    }
}
