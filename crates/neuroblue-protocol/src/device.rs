// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! RFCOMM tty device as a duplex channel
//!
//! BlueZ exposes an accepted RFCOMM connection as a character device
//! (`/dev/rfcommN`). A blocking file read cannot be polled portably, so a
//! dedicated receive thread moves inbound chunks onto a bounded queue and the
//! session polls the queue instead.
//!
//! Dropping the channel never waits for the receive thread. A thread that
//! has already stopped is joined; one still parked in `read()` is detached and
//! holds its cloned descriptor until that read returns, which for a tty is
//! the next inbound byte or the carrier drop that ends the connection.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, RecvError, TryRecvError};
use tracing::{debug, warn};

use crate::channel::{is_disconnect, DuplexChannel};

/// Chunks buffered between the receive thread and the session
const RX_QUEUE_CAPACITY: usize = 256;
const RX_CHUNK_SIZE: usize = 64;

enum RxEvent {
    Data(Vec<u8>),
    Eof,
    Error(io::Error),
}

pub struct DeviceChannel {
    path: PathBuf,
    writer: File,
    rx: Receiver<RxEvent>,
    pending: VecDeque<u8>,
    closed: bool,
    shutdown: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl DeviceChannel {
    /// Open the device read/write and start the receive thread
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = OpenOptions::new().read(true).write(true).open(&path)?;
        let reader_file = writer.try_clone()?;

        let (tx, rx) = channel::bounded(RX_QUEUE_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let reader = thread::Builder::new()
            .name("neuroblue-rfcomm-rx".to_string())
            .spawn(move || receive_loop(reader_file, tx, shutdown_clone))?;

        debug!("opened RFCOMM device {}", path.display());

        Ok(Self {
            path,
            writer,
            rx,
            pending: VecDeque::new(),
            closed: false,
            shutdown,
            reader: Some(reader),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn drain_pending(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        n
    }

    fn accept_event(&mut self, event: RxEvent) -> io::Result<()> {
        match event {
            RxEvent::Data(chunk) => self.pending.extend(chunk),
            RxEvent::Eof => self.closed = true,
            RxEvent::Error(e) => {
                self.closed = true;
                return Err(e);
            }
        }
        Ok(())
    }
}

fn receive_loop(mut file: File, tx: channel::Sender<RxEvent>, shutdown: Arc<AtomicBool>) {
    let mut chunk = [0u8; RX_CHUNK_SIZE];
    while !shutdown.load(Ordering::Relaxed) {
        let event = match file.read(&mut chunk) {
            Ok(0) => RxEvent::Eof,
            Ok(n) => RxEvent::Data(chunk[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_disconnect(&e) => RxEvent::Eof,
            Err(e) => RxEvent::Error(e),
        };
        let last = !matches!(event, RxEvent::Data(_));
        if tx.send(event).is_err() || last {
            break;
        }
    }
}

impl DuplexChannel for DeviceChannel {
    fn backend_name(&self) -> &str {
        "rfcomm-device"
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() && !self.closed {
            match self.rx.recv() {
                Ok(event) => self.accept_event(event)?,
                Err(RecvError) => self.closed = true,
            }
        }
        Ok(self.drain_pending(buf))
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        while self.pending.is_empty() && !self.closed {
            match self.rx.try_recv() {
                Ok(event) => self.accept_event(event)?,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => self.closed = true,
            }
        }
        Ok(Some(self.drain_pending(buf)))
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.writer, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.writer)
    }
}

impl Drop for DeviceChannel {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take() {
            if !handle.is_finished() {
                debug!(
                    "detaching RFCOMM receive thread for {}; it exits on its next wakeup",
                    self.path.display()
                );
            } else if handle.join().is_err() {
                warn!("RFCOMM receive thread for {} panicked", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_reads_file_contents_then_closed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x31, 0x05, 0x33]).unwrap();
        file.flush().unwrap();

        let mut channel = DeviceChannel::open(file.path()).unwrap();
        let mut buf = [0u8; 1];
        let mut received = Vec::new();
        loop {
            let n = DuplexChannel::read(&mut channel, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.push(buf[0]);
        }
        assert_eq!(received, vec![0x31, 0x05, 0x33]);
        assert_eq!(DuplexChannel::try_read(&mut channel, &mut buf).unwrap(), Some(0));
    }

    #[test]
    fn test_null_device_accepts_writes() {
        let mut channel = DeviceChannel::open("/dev/null").unwrap();
        DuplexChannel::write_all(&mut channel, &[0x32]).unwrap();
        DuplexChannel::flush(&mut channel).unwrap();
        assert_eq!(channel.backend_name(), "rfcomm-device");
    }

    #[test]
    fn test_drop_does_not_wait_for_parked_reader() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("rfcomm0");
        let created = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        if !created {
            return;
        }

        // Opened read/write, so the receive thread blocks with no data and no EOF
        let mut channel = DeviceChannel::open(&fifo).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(DuplexChannel::try_read(&mut channel, &mut buf).unwrap(), None);

        let started = std::time::Instant::now();
        drop(channel);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_missing_device_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeviceChannel::open(dir.path().join("rfcomm9")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
