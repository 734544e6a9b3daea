//! Defines all public event types broadcast by the Ringtap engine.
//!
//! This module acts as the public API for the engine's event system. Presentation
//! layers subscribe to these strongly-typed events to drive whatever they render.

use crate::common::{Outcome, TargetId};
use crate::session::Hud;
use std::time::Duration;
use tokio::time::Instant;

/// Notifications about the game itself, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// One countdown token should be shown now.
    IntroToken { index: usize, token: &'static str },
    /// The cosmetic accent for this session.
    AccentChosen { color: String },
    /// A round began and `target` was picked.
    RoundStarted {
        round: u32,
        target: TargetId,
        window: Duration,
    },
    TargetActivated { target: TargetId },
    TargetResolved { target: TargetId, outcome: Outcome },
    /// Score, combo or lives changed.
    HudUpdated(Hud),
    /// The last life was lost. Fired exactly once per session.
    GameOver { final_score: u64, rounds: u32 },
}

/// Why an input was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Input is ignored while the countdown plays.
    Intro,
    /// The session is over and waiting for a restart.
    GameOver,
    /// No target has that id.
    UnknownTarget,
}

/// Events related to the lifecycle of the engine itself.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemEvent {
    /// Fired once when the engine's `run` loop begins.
    EngineStarted { timestamp: Instant },
    /// Fired once when the engine's `run` loop is about to exit.
    EngineShutdown,
    /// A tap arrived at a moment it could not count.
    TapRejected {
        target: TargetId,
        reason: RejectReason,
    },
    /// A restart was applied.
    SessionRestarted,
    /// A finished session made the leaderboard at `rank` (1-based).
    HighScoreRecorded { rank: usize, score: u64 },
}
