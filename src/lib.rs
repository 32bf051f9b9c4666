// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! # NeuroBlue
//!
//! Session driver that exposes an onboard gesture detector to one remote
//! peer over a serial-profile link. The peer asks for gestures to be trained,
//! starts continuous detection and receives one byte per detected gesture.
//!
//! ## Crates
//!
//! - **`config`**: TOML configuration with environment and CLI overrides
//! - **`observability`**: logging setup and per-crate debug flags
//! - **`protocol`**: labels, duplex channels and the single-byte codec
//! - **`session`**: state machine, session driver, bootstraps and engines
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neuroblue::prelude::*;
//!
//! let config = NeuroblueConfig::default();
//! let channel = MemoryChannel::new().then_bytes(&[Label::Train.as_byte(), 0x07]);
//! let engine = FeedEngine::from_config(&config.detector)?;
//! let summary = Session::new(channel, engine, SessionOptions::from(&config.session)).run()?;
//! assert_eq!(summary.trainings, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use neuroblue_config as config;
pub use neuroblue_observability as observability;
pub use neuroblue_protocol as protocol;
pub use neuroblue_session as session;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{NeuroblueConfig, TransportKind};
    pub use crate::protocol::{ByteCodec, DuplexChannel, GestureId, Label, MemoryChannel, ReadOutcome};
    pub use crate::session::{
        serve, ChannelBootstrap, FeedEngine, GestureEngine, RfcommDeviceBootstrap, ServiceRecord,
        Session, SessionOptions, SessionSummary, TcpBootstrap,
    };
}
