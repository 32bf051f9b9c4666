// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! TCP stream as a duplex channel (development transport)

use std::io::{self, Read, Write};
use std::net::TcpStream;

use crate::channel::DuplexChannel;

impl DuplexChannel for TcpStream {
    fn backend_name(&self) -> &str {
        "tcp"
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        self.set_nonblocking(true)?;
        let result = Read::read(self, buf);
        self.set_nonblocking(false)?;

        match result {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(self, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (server, client)
    }

    #[test]
    fn test_try_read_pending_then_data() {
        let (mut server, mut client) = pair();
        let mut buf = [0u8; 1];

        assert_eq!(DuplexChannel::try_read(&mut server, &mut buf).unwrap(), None);

        DuplexChannel::write_all(&mut client, &[0x33]).unwrap();
        // Block once so the byte is guaranteed to have arrived
        assert_eq!(DuplexChannel::read(&mut server, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x33);
    }

    #[test]
    fn test_try_read_sees_close() {
        let (mut server, client) = pair();
        drop(client);

        let mut buf = [0u8; 1];
        // Closing may race with the first poll
        let mut outcome = DuplexChannel::try_read(&mut server, &mut buf).unwrap();
        for _ in 0..100 {
            if outcome.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
            outcome = DuplexChannel::try_read(&mut server, &mut buf).unwrap();
        }
        assert_eq!(outcome, Some(0));
    }

    #[test]
    fn test_stream_stays_blocking_after_poll() {
        let (mut server, mut client) = pair();
        let mut buf = [0u8; 1];
        let _ = DuplexChannel::try_read(&mut server, &mut buf).unwrap();

        let writer = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            DuplexChannel::write_all(&mut client, &[0x07]).unwrap();
            client
        });
        assert_eq!(DuplexChannel::read(&mut server, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x07);
        let _client = writer.join().unwrap();
    }
}
