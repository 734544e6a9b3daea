//! Mutable per-session bookkeeping: score, combo, lives, round and window.

use crate::config::SessionConfig;
use crate::scoring::{HitAward, MissPenalty, MAX_COMBO, MIN_COMBO};
use std::time::Duration;

/// Session counters. Every setter clamps, so values are never observed out
/// of range.
#[derive(Debug, Clone)]
pub struct SessionState {
    score: u64,
    combo: u32,
    lives: u32,
    round_number: u32,
    current_active_time: Duration,
    starting_lives: u32,
    initial_active_time: Duration,
    min_active_time: Duration,
    time_decay_per_round: Duration,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            score: 0,
            combo: MIN_COMBO,
            lives: config.starting_lives,
            round_number: 0,
            current_active_time: config.initial_active_time,
            starting_lives: config.starting_lives,
            initial_active_time: config.initial_active_time,
            min_active_time: config.min_active_time,
            time_decay_per_round: config.time_decay_per_round,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn current_active_time(&self) -> Duration {
        self.current_active_time
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }

    /// Back to the values a fresh session starts with.
    pub fn reset(&mut self) {
        self.score = 0;
        self.combo = MIN_COMBO;
        self.lives = self.starting_lives;
        self.round_number = 0;
        self.current_active_time = self.initial_active_time;
    }

    /// Counts a new round and returns its number (1-based).
    pub fn begin_round(&mut self) -> u32 {
        self.round_number = self.round_number.saturating_add(1);
        self.round_number
    }

    pub fn apply_hit(&mut self, award: HitAward) {
        self.score = self.score.saturating_add(award.points);
        self.combo = award.combo.clamp(MIN_COMBO, MAX_COMBO);
    }

    pub fn apply_miss(&mut self, penalty: MissPenalty) {
        self.score = penalty.score;
        self.combo = penalty.combo.clamp(MIN_COMBO, MAX_COMBO);
        self.lives = penalty.lives.min(self.starting_lives);
    }

    /// Shrinks the activation window by one decay step, never below the floor.
    pub fn decay_window(&mut self) -> Duration {
        self.current_active_time = self
            .current_active_time
            .saturating_sub(self.time_decay_per_round)
            .max(self.min_active_time);
        self.current_active_time
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            combo: self.combo,
            lives: self.lives,
        }
    }
}

/// The three numbers the HUD shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub score: u64,
    pub combo: u32,
    pub lives: u32,
}
