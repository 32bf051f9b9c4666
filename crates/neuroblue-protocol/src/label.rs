// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command labels and gesture identifiers

use std::fmt;

/// Single-byte command/response discriminator
///
/// Values start at ASCII `'0'` so a terminal peer can type them.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// No command yet
    Null = 0x30,
    /// Train the gesture named by the next non-null byte
    Train = 0x31,
    /// Outbound acknowledgment after training
    TrainingDone = 0x32,
    /// Enter continuous detection
    Detect = 0x33,
    /// Leave continuous detection
    Stop = 0x34,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Null,
        Label::Train,
        Label::TrainingDone,
        Label::Detect,
        Label::Stop,
    ];

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// `true` for `byte == NULL`
    pub fn is_null(byte: u8) -> bool {
        byte == Label::Null as u8
    }
}

/// Byte that is not one of the five defined labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid label 0x{0:02X}")]
pub struct UnknownLabel(pub u8);

impl TryFrom<u8> for Label {
    type Error = UnknownLabel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x30 => Ok(Label::Null),
            0x31 => Ok(Label::Train),
            0x32 => Ok(Label::TrainingDone),
            0x33 => Ok(Label::Detect),
            0x34 => Ok(Label::Stop),
            other => Err(UnknownLabel(other)),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label as u8
    }
}

/// Opaque gesture token owned by the detection engine
///
/// The protocol never interprets it; it is round-tripped byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(pub u8);

impl GestureId {
    pub fn as_byte(self) -> u8 {
        self.0
    }
}

impl From<u8> for GestureId {
    fn from(value: u8) -> Self {
        GestureId(value)
    }
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
