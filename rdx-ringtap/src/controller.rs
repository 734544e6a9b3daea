//! The round controller: intro, the endless round loop, game over and restart.
//!
//! The controller is a plain synchronous state machine. It owns the session
//! clock, and the only things that move it are `tick`, `tap`, `start` and
//! `restart`. Every timed wait (an intro token, a target's window, the quiet
//! gap between rounds) is a one-shot timer in a single `TimerQueue`, checked
//! against the session clock on each tick. Entering game over or restarting
//! clears that queue, so nothing scheduled before can fire afterwards.

use crate::common::{Outcome, TargetId};
use crate::components::intro::{IntroSequence, IntroStep};
use crate::components::target::{Resolution, TargetPool};
use crate::config::{ConfigError, RingtapConfig, SessionConfig};
use crate::events::RejectReason;
use crate::presenter::Presenter;
use crate::scoring;
use crate::session::{Hud, SessionState};
use crate::stats::SessionStats;
use crate::time::{DueTimer, SimClock, SimInstant, TimerQueue};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, error, info, trace};

/// The coarse state the controller is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built but not started.
    Ready,
    /// Countdown playing; taps are ignored.
    Intro,
    /// Rounds are running.
    Playing,
    /// Out of lives; waiting for a restart.
    GameOver,
}

/// What happened to a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapResult {
    /// The tap resolved the active target.
    Resolved(Outcome),
    /// The target exists but was not live. Late and stray taps land here.
    Ignored,
    /// The tap could not count at all.
    Rejected(RejectReason),
}

/// What a pending timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    IntroStep,
    Timeout(TargetId),
    RoundPause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Ready,
    Intro,
    AwaitingResolution(TargetId),
    Pausing,
    GameOver,
}

/// A read-only view of the controller, cheap to clone out of a lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub hud: Hud,
    pub round: u32,
    pub window: Duration,
    pub active_target: Option<TargetId>,
    pub accent: Option<String>,
    pub stats: SessionStats,
    pub elapsed: Duration,
}

/// Sequences intro, rounds and game over for one play session.
pub struct RoundController<R, P> {
    config: SessionConfig,
    clock: SimClock,
    timers: TimerQueue<TimerKind>,
    pool: TargetPool,
    session: SessionState,
    stats: SessionStats,
    intro: IntroSequence,
    stage: Stage,
    accent: Option<String>,
    rng: R,
    presenter: P,
}

impl<R: Rng, P: Presenter> RoundController<R, P> {
    /// Validates `config` and builds an idle controller.
    ///
    /// The random source picks targets and the accent color; pass a seeded
    /// generator for reproducible sessions.
    pub fn new(config: &RingtapConfig, rng: R, presenter: P) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        Ok(Self {
            clock: SimClock::new(),
            timers: TimerQueue::new(),
            pool: TargetPool::new(config.target_count),
            session: SessionState::new(&config),
            stats: SessionStats::default(),
            intro: IntroSequence::new(config.intro_step_time),
            stage: Stage::Ready,
            accent: None,
            rng,
            presenter,
            config,
        })
    }

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Ready => Phase::Ready,
            Stage::Intro => Phase::Intro,
            Stage::AwaitingResolution(_) | Stage::Pausing => Phase::Playing,
            Stage::GameOver => Phase::GameOver,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn pool(&self) -> &TargetPool {
        &self.pool
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn now(&self) -> SimInstant {
        self.clock.now()
    }

    pub fn accent(&self) -> Option<&str> {
        self.accent.as_deref()
    }

    /// Number of timers still waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            hud: self.session.hud(),
            round: self.session.round_number(),
            window: self.session.current_active_time(),
            active_target: self.pool.active(),
            accent: self.accent.clone(),
            stats: self.stats.clone(),
            elapsed: self.clock.now().since_start(),
        }
    }

    /// Begins the first session. Does nothing if already started.
    pub fn start(&mut self) {
        if self.stage != Stage::Ready {
            debug!("start() ignored; controller is already {:?}.", self.phase());
            return;
        }
        info!("Session starting with {} targets.", self.pool.len());
        self.enter_intro();
    }

    /// Discards the current session and starts a fresh one from the intro.
    ///
    /// Pending timers are dropped first, so no part of the old session can
    /// fire into the new one.
    pub fn restart(&mut self) {
        info!(
            "Restarting session (was {:?}, score {}, round {}).",
            self.phase(),
            self.session.score(),
            self.session.round_number()
        );
        self.timers.clear();
        self.pool.reset_all();
        self.session.reset();
        self.stats = SessionStats::default();
        self.enter_intro();
    }

    /// Advances the session clock by `delta` and fires every timer that came
    /// due, in deadline order.
    pub fn tick(&mut self, delta: Duration) {
        let now = self.clock.advance(delta);
        trace!("Tick #{} at {:?}.", self.clock.ticks(), now);
        while let Some(due) = self.timers.pop_due(now) {
            self.on_timer(due);
        }
    }

    /// The player touched `target` at the current session time.
    pub fn tap(&mut self, target: TargetId) -> TapResult {
        match self.stage {
            Stage::Ready | Stage::Intro => return TapResult::Rejected(RejectReason::Intro),
            Stage::GameOver => return TapResult::Rejected(RejectReason::GameOver),
            Stage::AwaitingResolution(live) if live != target => {
                trace!("Stray tap on {} while {} is live.", target, live);
            }
            Stage::AwaitingResolution(_) | Stage::Pausing => {}
        }
        let now = self.clock.now();
        let Some(slot) = self.pool.get_mut(target) else {
            return TapResult::Rejected(RejectReason::UnknownTarget);
        };
        match slot.report_tap(now) {
            Some(resolution) => {
                let outcome = resolution.outcome;
                self.resolve_round(resolution, now);
                TapResult::Resolved(outcome)
            }
            None => {
                trace!("Tap on {} ignored; not active.", target);
                TapResult::Ignored
            }
        }
    }

    fn on_timer(&mut self, due: DueTimer<TimerKind>) {
        let at = due.deadline;
        match due.payload {
            TimerKind::IntroStep => self.advance_intro(at),
            TimerKind::Timeout(target) => {
                let resolution = self.pool.get_mut(target).and_then(|slot| slot.expire());
                match resolution {
                    Some(resolution) => self.resolve_round(resolution, at),
                    None => trace!("Stale timeout for {} dropped.", target),
                }
            }
            TimerKind::RoundPause => {
                let window = self.session.decay_window();
                trace!("Window decayed to {:?}.", window);
                self.start_round(at);
            }
        }
    }

    fn enter_intro(&mut self) {
        self.accent = self.config.palette.choose(&mut self.rng).cloned();
        if let Some(color) = &self.accent {
            self.presenter.accent_chosen(color);
        }
        self.stage = Stage::Intro;
        let first = self.intro.begin();
        self.show_intro_step(first, self.clock.now());
    }

    fn advance_intro(&mut self, at: SimInstant) {
        if self.stage != Stage::Intro {
            return;
        }
        let step = self.intro.advance();
        self.show_intro_step(step, at);
    }

    fn show_intro_step(&mut self, step: IntroStep, at: SimInstant) {
        match step {
            IntroStep::Show { index, token } => {
                debug!("Intro token {:?}.", token);
                self.presenter.intro_token(index, token);
                self.timers
                    .schedule(at, self.intro.step_time(), TimerKind::IntroStep);
            }
            IntroStep::Completed => {
                info!("Intro complete; play begins.");
                self.start_round(at);
            }
        }
    }

    fn start_round(&mut self, at: SimInstant) {
        if let Some(active) = self.pool.active() {
            error!("Target {} is still live; refusing a second activation.", active);
            panic!("single-active-target invariant broken: {active} still active");
        }
        let round = self.session.begin_round();
        let target = TargetId(self.rng.gen_range(0..self.config.target_count));
        let window = self.session.current_active_time();
        let timeout = self.timers.schedule(at, window, TimerKind::Timeout(target));
        if let Some(slot) = self.pool.get_mut(target) {
            if let Some(abandoned) = slot.activate(at, window, timeout) {
                self.timers.cancel(abandoned);
            }
        }
        self.stage = Stage::AwaitingResolution(target);
        debug!("Round {} -> target {} for {:?}.", round, target, window);
        self.presenter.round_started(round, target, window);
        self.presenter.target_activated(target);
    }

    fn resolve_round(&mut self, resolution: Resolution, at: SimInstant) {
        self.timers.cancel(resolution.timeout);
        self.presenter
            .target_resolved(resolution.target, resolution.outcome);

        match resolution.outcome {
            Outcome::Hit => {
                let award =
                    scoring::on_hit(resolution.elapsed, resolution.window, self.session.combo());
                self.session.apply_hit(award);
                debug!(
                    "Hit on {} after {:?}: +{} (combo {}).",
                    resolution.target, resolution.elapsed, award.points, award.combo
                );
            }
            Outcome::Miss => {
                let penalty = scoring::on_miss(
                    self.session.score(),
                    self.session.lives(),
                    self.session.combo(),
                );
                self.session.apply_miss(penalty);
                debug!("Miss on {}: {} lives left.", resolution.target, penalty.lives);
            }
        }
        self.stats
            .record(resolution.outcome, resolution.elapsed, self.session.combo());
        self.presenter.hud_updated(self.session.hud());

        if self.session.is_out_of_lives() {
            self.enter_game_over();
        } else {
            self.stage = Stage::Pausing;
            self.timers
                .schedule(at, self.config.inter_round_pause, TimerKind::RoundPause);
        }
    }

    fn enter_game_over(&mut self) {
        self.timers.clear();
        self.pool.reset_all();
        self.stage = Stage::GameOver;
        let score = self.session.score();
        let rounds = self.session.round_number();
        info!("Game over after {} rounds with score {}.", rounds, score);
        self.presenter.game_over(score, rounds);
    }
}
