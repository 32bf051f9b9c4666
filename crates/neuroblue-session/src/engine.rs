// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gesture detection engine seam

use neuroblue_protocol::GestureId;

/// Training and continuous classification of gestures
///
/// The session drives the engine from a single thread. Engines report their
/// own failures through logging; nothing here can fail from the protocol's
/// point of view.
pub trait GestureEngine {
    /// Train `id`; blocks for as long as training takes
    fn train(&mut self, id: GestureId);

    /// Begin continuous sampling and classification
    fn start(&mut self);

    /// Non-blocking: is at least one detection buffered?
    fn gesture_available(&mut self) -> bool;

    /// Take the oldest buffered detection
    fn next_gesture(&mut self) -> Option<GestureId>;

    /// Halt sampling when detection ends
    fn stop(&mut self) {}
}

impl<E: GestureEngine + ?Sized> GestureEngine for Box<E> {
    fn train(&mut self, id: GestureId) {
        (**self).train(id)
    }

    fn start(&mut self) {
        (**self).start()
    }

    fn gesture_available(&mut self) -> bool {
        (**self).gesture_available()
    }

    fn next_gesture(&mut self) -> Option<GestureId> {
        (**self).next_gesture()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
