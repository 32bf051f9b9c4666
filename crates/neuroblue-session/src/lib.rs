// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! NeuroBlue session driver
//!
//! Obtains one peer channel, then runs the command protocol over it:
//! train gestures on request and stream detections back until the peer
//! leaves.
//!
//! ```rust,no_run
//! use neuroblue_config::NeuroblueConfig;
//! use neuroblue_session::{serve, FeedEngine, ServiceRecord, SessionOptions, TcpBootstrap};
//!
//! let config = NeuroblueConfig::default();
//! let mut bootstrap = TcpBootstrap::bind("127.0.0.1:7003", ServiceRecord::from(&config.service))?;
//! let engine = FeedEngine::from_config(&config.detector)?;
//! let summary = serve(&mut bootstrap, engine, SessionOptions::from(&config.session))?;
//! println!("{} detections sent", summary.detections_sent);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bootstrap;
pub mod engine;
pub mod error;
pub mod feed;
pub mod machine;
pub mod session;

pub use bootstrap::{ChannelBootstrap, RfcommDeviceBootstrap, ServiceRecord, TcpBootstrap};
pub use engine::GestureEngine;
pub use error::{BootstrapError, Result, SessionError};
pub use feed::{parse_detection_line, Detection, FeedEngine, FeedParseError, FeedSettings};
pub use machine::{Action, CommandStateMachine, ProtocolState};
pub use session::{EndReason, Session, SessionOptions, SessionSummary, Step};

/// Obtain the channel from `bootstrap` and run one session over it
pub fn serve<B, E>(bootstrap: &mut B, engine: E, options: SessionOptions) -> Result<SessionSummary>
where
    B: ChannelBootstrap,
    E: GestureEngine,
{
    let channel = bootstrap.obtain_channel()?;
    Session::new(channel, engine, options).run()
}
