// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory channel driven by a script of inbound events
//!
//! Used by tests and local demos in place of a real peer. Outbound bytes are
//! recorded in an [`OutboundLog`] that stays readable after the channel has
//! been moved into a session.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::DuplexChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InboundStep {
    Byte(u8),
    /// One non-blocking poll that finds nothing
    Quiet,
}

/// Shared view of everything written to a [`MemoryChannel`]
#[derive(Debug, Clone, Default)]
pub struct OutboundLog {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl OutboundLog {
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

/// Scripted peer
///
/// Once the script is exhausted the peer counts as disconnected: reads return
/// EOF.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    script: VecDeque<InboundStep>,
    outbound: OutboundLog,
    write_budget: Option<usize>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes the peer sends
    pub fn then_bytes(mut self, bytes: &[u8]) -> Self {
        self.script.extend(bytes.iter().copied().map(InboundStep::Byte));
        self
    }

    /// Queue `polls` non-blocking reads that find nothing
    ///
    /// Blocking reads skip over quiet steps.
    pub fn then_quiet(mut self, polls: usize) -> Self {
        self.script.extend(std::iter::repeat(InboundStep::Quiet).take(polls));
        self
    }

    /// Accept only `count` more bytes, then fail writes with `BrokenPipe`
    pub fn fail_writes_after(mut self, count: usize) -> Self {
        self.write_budget = Some(count);
        self
    }

    pub fn outbound(&self) -> OutboundLog {
        self.outbound.clone()
    }

    /// Inbound steps not consumed yet
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DuplexChannel for MemoryChannel {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while let Some(step) = self.script.pop_front() {
            if let InboundStep::Byte(byte) = step {
                buf[0] = byte;
                return Ok(1);
            }
        }
        Ok(0)
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        match self.script.pop_front() {
            Some(InboundStep::Byte(byte)) => {
                buf[0] = byte;
                Ok(Some(1))
            }
            Some(InboundStep::Quiet) => Ok(None),
            None => Ok(Some(0)),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if let Some(budget) = self.write_budget.as_mut() {
            if *budget < data.len() {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            *budget -= data.len();
        }
        self.outbound.bytes.lock().extend_from_slice(data);
        Ok(())
    }
}
