//! # Ringtap
//!
//! A tick-driven round engine for reaction-timing arcade sessions.
//!
//! A session shows a pool of targets ("rings"). It lights up one at a time for
//! a shrinking window and scores each activation as a hit or a miss, until the
//! player runs out of lives.
//!
//! ## Core Concepts
//!
//! - **RoundController**: A synchronous state machine (`Intro -> Playing ->
//!   GameOver`) that owns the session clock. It only moves when you call
//!   `tick`, `tap`, `start` or `restart`, so it is fully deterministic under
//!   test.
//! - **TargetSlot**: One target. A tap and the slot's timeout race to resolve
//!   it. Exactly one of them wins, and the timeout wins ties.
//! - **Presenter**: The narrow output port. Rendering, audio and effects live
//!   behind it and never inside the core.
//! - **RingtapEngine**: An async wrapper that drives a controller from a
//!   real-time `SystemClock` and publishes `GameEvent`s on a broadcast bus.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ringtap::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load configuration (file optional, RINGTAP_* env overrides).
//!     let config = RingtapConfig::load(None)?;
//!
//!     // 2. Create the engine. Invalid configuration is refused here.
//!     let engine = RingtapEngine::new(config)?;
//!
//!     // 3. Subscribe before starting, then react to activations.
//!     let mut events = engine.subscribe_game_events();
//!     let player = engine.clone();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let GameEvent::TargetActivated { target } = event {
//!                 player.tap(target).await;
//!             }
//!         }
//!     });
//!
//!     // 4. Run until Ctrl+C.
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Ringtap Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod controller;
pub mod engine;
pub mod events;
pub mod highscores;
pub mod presenter;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod time;

/// A prelude module for easy importing of the most common Ringtap types.
pub mod prelude {
    pub use crate::common::{Outcome, TargetId};
    pub use crate::config::{ClockResolution, ConfigError, RingtapConfig};
    pub use crate::controller::{Phase, RoundController, SessionSnapshot, TapResult};
    pub use crate::engine::RingtapEngine;
    pub use crate::events::{GameEvent, RejectReason, SystemEvent};
    pub use crate::highscores::HighScores;
    pub use crate::presenter::{BroadcastPresenter, NullPresenter, Presenter};
}
