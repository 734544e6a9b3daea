//! The narrow output port through which the core talks to presentation.
//!
//! The controller never reaches for audio, particles or UI directly. It calls a
//! `Presenter` it was handed at construction time.

use crate::common::{Outcome, TargetId};
use crate::events::GameEvent;
use crate::session::Hud;
use std::time::Duration;
use tokio::sync::broadcast;

/// Receives read-only notifications from the round controller.
///
/// All methods default to doing nothing, so implementors only override what
/// they render.
pub trait Presenter: Send {
    fn intro_token(&mut self, _index: usize, _token: &'static str) {}
    fn accent_chosen(&mut self, _color: &str) {}
    fn round_started(&mut self, _round: u32, _target: TargetId, _window: Duration) {}
    fn target_activated(&mut self, _target: TargetId) {}
    fn target_resolved(&mut self, _target: TargetId, _outcome: Outcome) {}
    fn hud_updated(&mut self, _hud: Hud) {}
    fn game_over(&mut self, _final_score: u64, _rounds: u32) {}
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Re-publishes every notification as a `GameEvent` on a broadcast channel.
///
/// Having no subscribers is not an error; events are simply dropped.
#[derive(Debug, Clone)]
pub struct BroadcastPresenter {
    sender: broadcast::Sender<GameEvent>,
}

impl BroadcastPresenter {
    pub fn new(sender: broadcast::Sender<GameEvent>) -> Self {
        Self { sender }
    }

    fn publish(&self, event: GameEvent) {
        self.sender.send(event).ok();
    }
}

impl Presenter for BroadcastPresenter {
    fn intro_token(&mut self, index: usize, token: &'static str) {
        self.publish(GameEvent::IntroToken { index, token });
    }

    fn accent_chosen(&mut self, color: &str) {
        self.publish(GameEvent::AccentChosen {
            color: color.to_string(),
        });
    }

    fn round_started(&mut self, round: u32, target: TargetId, window: Duration) {
        self.publish(GameEvent::RoundStarted {
            round,
            target,
            window,
        });
    }

    fn target_activated(&mut self, target: TargetId) {
        self.publish(GameEvent::TargetActivated { target });
    }

    fn target_resolved(&mut self, target: TargetId, outcome: Outcome) {
        self.publish(GameEvent::TargetResolved { target, outcome });
    }

    fn hud_updated(&mut self, hud: Hud) {
        self.publish(GameEvent::HudUpdated(hud));
    }

    fn game_over(&mut self, final_score: u64, rounds: u32) {
        self.publish(GameEvent::GameOver { final_score, rounds });
    }
}

/// Collects notifications as `GameEvent`s. Handy for assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    pub events: Vec<GameEvent>,
}

impl RecordingPresenter {
    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Presenter for RecordingPresenter {
    fn intro_token(&mut self, index: usize, token: &'static str) {
        self.events.push(GameEvent::IntroToken { index, token });
    }

    fn accent_chosen(&mut self, color: &str) {
        self.events.push(GameEvent::AccentChosen {
            color: color.to_string(),
        });
    }

    fn round_started(&mut self, round: u32, target: TargetId, window: Duration) {
        self.events.push(GameEvent::RoundStarted {
            round,
            target,
            window,
        });
    }

    fn target_activated(&mut self, target: TargetId) {
        self.events.push(GameEvent::TargetActivated { target });
    }

    fn target_resolved(&mut self, target: TargetId, outcome: Outcome) {
        self.events.push(GameEvent::TargetResolved { target, outcome });
    }

    fn hud_updated(&mut self, hud: Hud) {
        self.events.push(GameEvent::HudUpdated(hud));
    }

    fn game_over(&mut self, final_score: u64, rounds: u32) {
        self.events.push(GameEvent::GameOver { final_score, rounds });
    }
}
