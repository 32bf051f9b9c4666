// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! NeuroBlue wire protocol (transport-agnostic)
//!
//! Every protocol unit is one unsigned byte: no length prefix, no checksum.
//! The transport (RFCOMM serial profile, TCP during development) is assumed to
//! deliver bytes reliably and in order.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Session (neuroblue-session)            │
//! └─────────────────┬───────────────────────┘
//!                   │ labels / gesture ids
//! ┌─────────────────▼───────────────────────┐
//! │  ByteCodec (codec.rs)                   │
//! │  - one byte in, one byte out            │
//! │  - Byte / Pending / Closed outcomes     │
//! └─────────────────┬───────────────────────┘
//!                   │ raw bytes
//! ┌─────────────────▼───────────────────────┐
//! │  DuplexChannel (channel.rs)             │
//! │  - TcpStream                            │
//! │  - RFCOMM tty device                    │
//! │  - in-memory script                     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! | Direction | Bytes | Meaning |
//! |-----------|-------|---------|
//! | in  | `TRAIN`, `<id>` | train gesture `<id>` |
//! | out | `TRAINING_DONE` | training finished |
//! | in  | `DETECT` | start continuous detection |
//! | out | `<id>` ... | one byte per detected gesture |
//! | in  | `STOP` | leave detection |

pub mod channel;
pub mod codec;
pub mod device;
pub mod label;
pub mod memory;
pub mod tcp;

pub use channel::{ChannelError, DuplexChannel};
pub use codec::{ByteCodec, ReadOutcome};
pub use device::DeviceChannel;
pub use label::{GestureId, Label, UnknownLabel};
pub use memory::{MemoryChannel, OutboundLog};
