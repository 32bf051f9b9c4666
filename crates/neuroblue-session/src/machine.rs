// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command protocol state machine
//!
//! Pure and deterministic: no I/O, no sleeps. Each inbound byte yields one
//! [`Action`] that the session carries out.
//!
//! | State | Byte | Action | Next |
//! |-------|------|--------|------|
//! | Idle | `NULL` | none | Idle |
//! | Idle | `TRAIN` | await target | AwaitingTrainTarget |
//! | Idle | `DETECT` | begin detection | Detecting |
//! | Idle | other | reject | Idle |
//! | AwaitingTrainTarget | `NULL` | none | AwaitingTrainTarget |
//! | AwaitingTrainTarget | other | train | Idle |
//! | Detecting | `STOP` | end detection | Idle |
//! | Detecting | `NULL` | none | Detecting |
//! | Detecting | other | ignore | Detecting |

use neuroblue_protocol::{GestureId, Label};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    Idle,
    AwaitingTrainTarget,
    Detecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    AwaitTrainTarget,
    /// Train the gesture, then acknowledge with `TRAINING_DONE`
    Train(GestureId),
    BeginDetect,
    EndDetect,
    /// Byte is not a label accepted while idle
    Rejected(u8),
    IgnoredWhileDetecting(u8),
}

#[derive(Debug, Clone)]
pub struct CommandStateMachine {
    state: ProtocolState,
}

impl Default for CommandStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStateMachine {
    pub fn new() -> Self {
        Self {
            state: ProtocolState::Idle,
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Advance by one inbound byte
    pub fn on_byte(&mut self, byte: u8) -> Action {
        match self.state {
            ProtocolState::Idle => match Label::try_from(byte) {
                Ok(Label::Null) => Action::None,
                Ok(Label::Train) => {
                    self.state = ProtocolState::AwaitingTrainTarget;
                    Action::AwaitTrainTarget
                }
                Ok(Label::Detect) => {
                    self.state = ProtocolState::Detecting;
                    Action::BeginDetect
                }
                // STOP and TRAINING_DONE have no idle transition
                Ok(Label::Stop) | Ok(Label::TrainingDone) | Err(_) => Action::Rejected(byte),
            },
            ProtocolState::AwaitingTrainTarget => {
                if Label::is_null(byte) {
                    Action::None
                } else {
                    self.state = ProtocolState::Idle;
                    Action::Train(GestureId(byte))
                }
            }
            ProtocolState::Detecting => match Label::try_from(byte) {
                Ok(Label::Stop) => {
                    self.state = ProtocolState::Idle;
                    Action::EndDetect
                }
                Ok(Label::Null) => Action::None,
                _ => Action::IgnoredWhileDetecting(byte),
            },
        }
    }
}
