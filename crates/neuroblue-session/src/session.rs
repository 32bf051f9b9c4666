// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session driver
//!
//! One session per connected peer. The session owns the channel, the engine
//! and the protocol state, and runs on a single thread until the channel
//! closes.

use std::fmt;
use std::thread;
use std::time::Duration;

use neuroblue_config::SessionConfig;
use neuroblue_protocol::{ByteCodec, ChannelError, DuplexChannel, Label, ReadOutcome};
use tracing::{debug, info, warn};

use crate::engine::GestureEngine;
use crate::error::Result;
use crate::machine::{Action, CommandStateMachine, ProtocolState};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Leave detection on `STOP`; when false detection only ends with the channel
    pub honor_stop: bool,
    /// Detection poll backoff floor
    pub poll_min: Duration,
    /// Detection poll backoff ceiling
    pub poll_max: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            honor_stop: config.honor_stop,
            poll_min: config.detect_poll_min(),
            poll_max: config.detect_poll_max(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A read found the channel closed
    ClosedWhileReading,
    /// A write found the channel closed
    ClosedWhileWriting,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::ClosedWhileReading => write!(f, "peer closed the channel"),
            EndReason::ClosedWhileWriting => write!(f, "write failed, peer gone"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub trainings: u64,
    pub detections_sent: u64,
    pub labels_rejected: u64,
    pub ignored_while_detecting: u64,
    pub end_reason: EndReason,
}

#[derive(Debug, Default, Clone)]
struct SessionStats {
    trainings: u64,
    detections_sent: u64,
    labels_rejected: u64,
    ignored_while_detecting: u64,
}

/// Result of processing one inbound byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Ended(EndReason),
}

pub struct Session<C, E> {
    codec: ByteCodec<C>,
    engine: E,
    machine: CommandStateMachine,
    options: SessionOptions,
    stats: SessionStats,
}

impl<C: DuplexChannel, E: GestureEngine> Session<C, E> {
    pub fn new(channel: C, engine: E, options: SessionOptions) -> Self {
        Self {
            codec: ByteCodec::new(channel),
            engine,
            machine: CommandStateMachine::new(),
            options,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.machine.state()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn channel(&self) -> &C {
        self.codec.channel()
    }

    pub fn into_parts(self) -> (C, E) {
        (self.codec.into_inner(), self.engine)
    }

    /// Run until the channel closes
    ///
    /// An orderly close is not an error: it ends the run with a summary.
    pub fn run(&mut self) -> Result<SessionSummary> {
        info!(
            "session started on {} channel (honor_stop={})",
            self.codec.channel().backend_name(),
            self.options.honor_stop
        );

        loop {
            let step = self.step();
            if !matches!(step, Ok(Step::Continue)) && self.machine.state() == ProtocolState::Detecting {
                self.engine.stop();
            }
            if let Step::Ended(reason) = step? {
                let summary = self.summary(reason);
                info!(
                    "session ended: {} (trainings={}, detections={}, rejected={})",
                    summary.end_reason,
                    summary.trainings,
                    summary.detections_sent,
                    summary.labels_rejected
                );
                return Ok(summary);
            }
        }
    }

    /// Block for one inbound byte and act on it
    ///
    /// A `DETECT` byte runs the whole detection sub-loop before returning.
    pub fn step(&mut self) -> Result<Step> {
        match self.codec.read_byte()? {
            ReadOutcome::Byte(byte) => self.handle_byte(byte),
            ReadOutcome::Pending => Ok(Step::Continue),
            ReadOutcome::Closed => Ok(Step::Ended(EndReason::ClosedWhileReading)),
        }
    }

    fn handle_byte(&mut self, byte: u8) -> Result<Step> {
        match self.machine.on_byte(byte) {
            Action::None => Ok(Step::Continue),
            Action::AwaitTrainTarget => {
                info!("awaiting gesture name");
                Ok(Step::Continue)
            }
            Action::Train(id) => {
                info!("training gesture {}", id);
                self.engine.train(id);
                self.stats.trainings += 1;
                if let Some(reason) = self.send(Label::TrainingDone.as_byte())? {
                    return Ok(Step::Ended(reason));
                }
                debug!("training of gesture {} acknowledged", id);
                Ok(Step::Continue)
            }
            Action::BeginDetect => self.detect(),
            Action::Rejected(byte) => {
                self.stats.labels_rejected += 1;
                warn!("invalid label 0x{:02X}", byte);
                Ok(Step::Continue)
            }
            // Only produced while detecting, which the sub-loop handles
            Action::EndDetect | Action::IgnoredWhileDetecting(_) => Ok(Step::Continue),
        }
    }

    /// Detection sub-loop; returns once detection ends or the channel closes
    ///
    /// At most one gesture is written per iteration, so inbound bytes are
    /// polled between writes even while the engine never runs dry.
    fn detect(&mut self) -> Result<Step> {
        info!("detection started");
        self.engine.start();
        let mut backoff = self.options.poll_min;

        loop {
            let mut progressed = false;

            if self.engine.gesture_available() {
                if let Some(id) = self.engine.next_gesture() {
                    if let Some(reason) = self.send(id.as_byte())? {
                        return Ok(Step::Ended(reason));
                    }
                    self.stats.detections_sent += 1;
                    info!("detected gesture {}", id);
                    progressed = true;
                }
            }

            if self.options.honor_stop {
                match self.codec.poll_byte()? {
                    ReadOutcome::Pending => {}
                    ReadOutcome::Closed => return Ok(Step::Ended(EndReason::ClosedWhileReading)),
                    ReadOutcome::Byte(byte) => {
                        progressed = true;
                        match self.machine.on_byte(byte) {
                            Action::EndDetect => {
                                self.engine.stop();
                                info!("detection stopped");
                                return Ok(Step::Continue);
                            }
                            Action::IgnoredWhileDetecting(byte) => {
                                self.stats.ignored_while_detecting += 1;
                                warn!("ignored 0x{:02X} during detection", byte);
                            }
                            _ => {}
                        }
                    }
                }
            }

            if progressed {
                backoff = self.options.poll_min;
            } else {
                thread::sleep(backoff);
                backoff = (backoff * 2).min(self.options.poll_max);
            }
        }
    }

    /// Write one byte; `Some(reason)` when the peer is gone
    fn send(&mut self, byte: u8) -> Result<Option<EndReason>> {
        match self.codec.write_byte(byte) {
            Ok(()) => Ok(None),
            Err(ChannelError::Closed) => Ok(Some(EndReason::ClosedWhileWriting)),
            Err(e) => Err(e.into()),
        }
    }

    fn summary(&self, end_reason: EndReason) -> SessionSummary {
        SessionSummary {
            trainings: self.stats.trainings,
            detections_sent: self.stats.detections_sent,
            labels_rejected: self.stats.labels_rejected,
            ignored_while_detecting: self.stats.ignored_while_detecting,
            end_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroblue_protocol::{GestureId, MemoryChannel};

    #[derive(Default)]
    struct CountingEngine {
        trained: Vec<GestureId>,
    }

    impl GestureEngine for CountingEngine {
        fn train(&mut self, id: GestureId) {
            self.trained.push(id);
        }
        fn start(&mut self) {}
        fn gesture_available(&mut self) -> bool {
            false
        }
        fn next_gesture(&mut self) -> Option<GestureId> {
            None
        }
    }

    #[test]
    fn test_step_by_step() {
        let channel = MemoryChannel::new().then_bytes(&[0x31, 0x30, 0x09]);
        let outbound = channel.outbound();
        let mut session = Session::new(channel, CountingEngine::default(), SessionOptions::default());

        assert_eq!(session.step().unwrap(), Step::Continue);
        assert_eq!(session.state(), ProtocolState::AwaitingTrainTarget);
        assert_eq!(session.step().unwrap(), Step::Continue);
        assert!(outbound.is_empty());
        assert_eq!(session.step().unwrap(), Step::Continue);
        assert_eq!(session.state(), ProtocolState::Idle);
        assert_eq!(outbound.bytes(), vec![0x32]);
        assert_eq!(
            session.step().unwrap(),
            Step::Ended(EndReason::ClosedWhileReading)
        );
        assert_eq!(session.engine().trained, vec![GestureId(0x09)]);
    }

    #[test]
    fn test_training_done_write_failure_ends_session() {
        let channel = MemoryChannel::new()
            .then_bytes(&[0x31, 0x02])
            .fail_writes_after(0);
        let mut session = Session::new(channel, CountingEngine::default(), SessionOptions::default());

        let summary = session.run().unwrap();
        assert_eq!(summary.end_reason, EndReason::ClosedWhileWriting);
        assert_eq!(summary.trainings, 1);
    }

    /// Reads a fixed script, fails every write with EIO like a tty whose carrier dropped
    struct CarrierLostChannel {
        inbound: Vec<u8>,
    }

    impl DuplexChannel for CarrierLostChannel {
        fn backend_name(&self) -> &str {
            "carrier-lost"
        }

        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.inbound.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.inbound.remove(0);
            Ok(1)
        }

        fn try_read(&mut self, buf: &mut [u8]) -> std::io::Result<Option<usize>> {
            self.read(buf).map(Some)
        }

        fn write_all(&mut self, _data: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::from_raw_os_error(5))
        }
    }

    #[test]
    fn test_carrier_loss_on_write_ends_session_cleanly() {
        let channel = CarrierLostChannel {
            inbound: vec![0x31, 0x31],
        };
        let mut session = Session::new(channel, CountingEngine::default(), SessionOptions::default());

        let summary = session.run().unwrap();
        assert_eq!(summary.end_reason, EndReason::ClosedWhileWriting);
        assert_eq!(summary.trainings, 1);
        assert_eq!(session.engine().trained, vec![GestureId(0x31)]);
    }

    /// Always has a gesture ready; counts stop calls
    #[derive(Default)]
    struct BusyEngine {
        stops: usize,
    }

    impl GestureEngine for BusyEngine {
        fn train(&mut self, _id: GestureId) {}
        fn start(&mut self) {}
        fn gesture_available(&mut self) -> bool {
            true
        }
        fn next_gesture(&mut self) -> Option<GestureId> {
            Some(GestureId(0x01))
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    /// Fails writes with a non-disconnect error
    struct RejectingChannel;

    impl DuplexChannel for RejectingChannel {
        fn backend_name(&self) -> &str {
            "rejecting"
        }

        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            buf[0] = 0x33;
            Ok(1)
        }

        fn try_read(&mut self, _buf: &mut [u8]) -> std::io::Result<Option<usize>> {
            Ok(None)
        }

        fn write_all(&mut self, _data: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
        }
    }

    #[test]
    fn test_io_error_during_detection_stops_engine() {
        let mut session = Session::new(RejectingChannel, BusyEngine::default(), SessionOptions::default());

        assert!(session.run().is_err());
        assert_eq!(session.state(), ProtocolState::Detecting);
        assert_eq!(session.engine().stops, 1);
    }

    #[test]
    fn test_options_from_config() {
        let config = SessionConfig {
            honor_stop: false,
            detect_poll_min_ms: 2,
            detect_poll_max_ms: 50,
        };
        let options = SessionOptions::from(&config);
        assert!(!options.honor_stop);
        assert_eq!(options.poll_min, Duration::from_millis(2));
        assert_eq!(options.poll_max, Duration::from_millis(50));
    }
}
