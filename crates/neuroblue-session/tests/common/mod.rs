// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test doubles: a scripted gesture engine and a log capture layer

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use neuroblue_protocol::GestureId;
use neuroblue_session::GestureEngine;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Engine that trains instantly and emits a fixed list of detections once started
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub trained: Vec<GestureId>,
    pub starts: usize,
    pub stops: usize,
    pending: VecDeque<GestureId>,
    running: bool,
}

impl FakeEngine {
    pub fn with_detections(ids: &[u8]) -> Self {
        Self {
            pending: ids.iter().copied().map(GestureId).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl GestureEngine for FakeEngine {
    fn train(&mut self, id: GestureId) {
        self.trained.push(id);
    }

    fn start(&mut self) {
        self.starts += 1;
        self.running = true;
    }

    fn gesture_available(&mut self) -> bool {
        self.running && !self.pending.is_empty()
    }

    fn next_gesture(&mut self) -> Option<GestureId> {
        self.pending.pop_front()
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.running = false;
    }
}

/// Engine that always has gesture 0x01 ready once started
#[derive(Debug, Default)]
pub struct EndlessEngine {
    pub stops: usize,
    running: bool,
}

impl GestureEngine for EndlessEngine {
    fn train(&mut self, _id: GestureId) {}

    fn start(&mut self) {
        self.running = true;
    }

    fn gesture_available(&mut self) -> bool {
        self.running
    }

    fn next_gesture(&mut self) -> Option<GestureId> {
        self.running.then_some(GestureId(0x01))
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.running = false;
    }
}

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Run `f` with every event on this thread recorded
    pub fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Warnings whose message contains `needle`
    pub fn warnings_containing(&self, needle: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == Level::WARN && e.message.contains(needle))
            .map(|e| e.message)
            .collect()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}
