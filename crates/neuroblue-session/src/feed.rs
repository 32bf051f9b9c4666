// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Line-fed gesture engine
//!
//! Detection results come from an external classifier as text lines, one
//! detection per line:
//!
//! ```text
//! 7          # gesture 7, no confidence reported
//! 0x0A 0.82  # gesture 10 at confidence 0.82
//! ```
//!
//! A worker thread reads the source (file, FIFO or stdin) into a bounded
//! queue; the session thread drains the queue when it polls for gestures.

use std::collections::{BTreeSet, VecDeque};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use neuroblue_config::DetectorConfig;
use neuroblue_protocol::GestureId;
use tracing::{debug, info, warn};

use crate::engine::GestureEngine;

const FEED_QUEUE_CAPACITY: usize = 1024;

/// Settings the feed engine takes from the detector configuration
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub command_threshold: f64,
    pub training_time: Duration,
}

impl From<&DetectorConfig> for FeedSettings {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            command_threshold: config.command_threshold,
            training_time: config.training_time(),
        }
    }
}

/// One parsed detection line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub id: GestureId,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedParseError {
    #[error("invalid gesture id '{0}'")]
    InvalidId(String),
    #[error("invalid confidence '{0}'")]
    InvalidConfidence(String),
    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),
}

/// Parse one feed line
///
/// Returns `None` for blank lines and `#` comments.
pub fn parse_detection_line(line: &str) -> Option<Result<Detection, FeedParseError>> {
    let content = line.split('#').next().unwrap_or("").trim();
    if content.is_empty() {
        return None;
    }

    let mut fields = content.split_whitespace();
    let id_field = fields.next()?;
    Some(parse_fields(id_field, fields.next(), fields.next()))
}

fn parse_fields(
    id: &str,
    confidence: Option<&str>,
    extra: Option<&str>,
) -> Result<Detection, FeedParseError> {
    if let Some(extra) = extra {
        return Err(FeedParseError::TrailingInput(extra.to_string()));
    }

    let parsed = match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => id.parse::<u8>(),
    };
    let id = parsed.map_err(|_| FeedParseError::InvalidId(id.to_string()))?;

    let confidence = confidence
        .map(|c| {
            c.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FeedParseError::InvalidConfidence(c.to_string()))
        })
        .transpose()?;

    Ok(Detection {
        id: GestureId(id),
        confidence,
    })
}

pub struct FeedEngine {
    settings: FeedSettings,
    rx: Receiver<String>,
    ready: VecDeque<GestureId>,
    trained: BTreeSet<GestureId>,
    running: bool,
    feed_ended: bool,
}

impl FeedEngine {
    /// Build from the detector configuration, opening `detection_feed`
    pub fn from_config(config: &DetectorConfig) -> io::Result<Self> {
        info!(
            "detector: threshold={} classifiers={:?} features={:?} training={}s window={}/{}",
            config.command_threshold,
            config.classifiers,
            config.features,
            config.training_time_secs,
            config.feature_extraction_window_size,
            config.feature_extraction_update_size
        );
        debug!(
            "classifier storage: raw={} features={} gestures={} ({})",
            config.store_raw_data, config.store_features, config.store_gestures, config.gestures_filename
        );

        let settings = FeedSettings::from(config);
        if config.detection_feed == "-" {
            info!("reading detections from stdin");
            Self::from_reader(io::stdin(), settings)
        } else {
            info!("reading detections from {}", config.detection_feed);
            let file = File::open(&config.detection_feed)?;
            Self::from_reader(file, settings)
        }
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R, settings: FeedSettings) -> io::Result<Self> {
        let (tx, rx) = channel::bounded(FEED_QUEUE_CAPACITY);
        thread::Builder::new()
            .name("neuroblue-feed".to_string())
            .spawn(move || read_feed(reader, tx))?;

        Ok(Self {
            settings,
            rx,
            ready: VecDeque::new(),
            trained: BTreeSet::new(),
            running: false,
            feed_ended: false,
        })
    }

    pub fn trained(&self) -> &BTreeSet<GestureId> {
        &self.trained
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn pump(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(line) => self.accept_line(&line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.feed_ended {
                        self.feed_ended = true;
                        info!("detection feed ended");
                    }
                    break;
                }
            }
        }
    }

    fn accept_line(&mut self, line: &str) {
        match parse_detection_line(line) {
            None => {}
            Some(Err(e)) => warn!("discarding feed line: {}", e),
            Some(Ok(detection)) => match detection.confidence {
                Some(c) if c < self.settings.command_threshold => {
                    debug!(
                        "gesture {} below threshold ({:.2} < {:.2})",
                        detection.id, c, self.settings.command_threshold
                    );
                }
                _ => self.ready.push_back(detection.id),
            },
        }
    }
}

fn read_feed<R: Read>(reader: R, tx: Sender<String>) {
    for line in BufReader::new(reader).lines() {
        match line {
            Ok(line) => {
                if tx.send(line).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("detection feed read failed: {}", e);
                return;
            }
        }
    }
}

impl GestureEngine for FeedEngine {
    fn train(&mut self, id: GestureId) {
        info!("training gesture {} for {:?}", id, self.settings.training_time);
        thread::sleep(self.settings.training_time);
        self.trained.insert(id);
    }

    fn start(&mut self) {
        let stale = self.rx.try_iter().count();
        if stale > 0 {
            debug!("discarded {} detections received before start", stale);
        }
        self.running = true;
    }

    fn gesture_available(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.ready.is_empty() {
            self.pump();
        }
        !self.ready.is_empty()
    }

    fn next_gesture(&mut self) -> Option<GestureId> {
        self.ready.pop_front()
    }

    fn stop(&mut self) {
        self.running = false;
        self.ready.clear();
    }
}
