//! The async engine that drives a `RoundController` in real time.

use crate::common::TargetId;
use crate::config::{ConfigError, RingtapConfig};
use crate::controller::{Phase, RoundController, SessionSnapshot, TapResult};
use crate::events::{GameEvent, SystemEvent};
use crate::highscores::{HighScoreEntry, HighScores};
use crate::presenter::BroadcastPresenter;
use crate::time::{SystemClock, TickEvent};
use chrono::Utc;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

type Controller = RoundController<Pcg32, BroadcastPresenter>;

/// A controller plus the real instant its session clock was last synced to.
///
/// Real time maps onto session time one to one. Every input first catches the
/// controller up to the instant it arrived, so timeouts that are already due
/// fire before a tap is judged, and ticks lost to lag are not lost time.
struct Driver {
    controller: Controller,
    synced_at: Instant,
}

impl Driver {
    fn catch_up(&mut self, now: Instant) {
        let delta = now.saturating_duration_since(self.synced_at);
        if delta.is_zero() {
            return;
        }
        self.controller.tick(delta);
        self.synced_at = now;
    }
}

/// The main Ringtap engine.
///
/// This struct is the central point of control. It owns the round controller,
/// forwards real-time ticks into it, and publishes what happens on broadcast
/// channels. The `Engine` is designed to be cloned and shared across tasks,
/// providing a handle to the running session.
#[derive(Clone)]
pub struct RingtapEngine {
    config: Arc<RingtapConfig>,
    driver: Arc<Mutex<Driver>>,
    tick_sender: broadcast::Sender<Arc<TickEvent>>,
    game_event_sender: broadcast::Sender<GameEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
    high_scores: Arc<RwLock<HighScores>>,
}

// Core implementation block for internal logic.
impl RingtapEngine {
    /// Creates a new engine, refusing invalid configuration.
    ///
    /// The session RNG is seeded from `config.seed` when present, so a fixed
    /// seed replays the same target sequence.
    pub fn new(config: RingtapConfig) -> Result<Self, ConfigError> {
        const CHANNEL_CAPACITY: usize = 256;
        let (tick_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (game_event_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (system_event_sender, _) = broadcast::channel(64);

        let rng = match config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_entropy(),
        };
        let presenter = BroadcastPresenter::new(game_event_sender.clone());
        let controller = RoundController::new(&config, rng, presenter)?;

        let high_scores = match config.highscore_path.as_deref() {
            Some(path) => HighScores::load(path).unwrap_or_else(|e| {
                warn!("Ignoring unreadable high scores: {}", e);
                HighScores::new()
            }),
            None => HighScores::new(),
        };

        Ok(Self {
            config: Arc::new(config),
            driver: Arc::new(Mutex::new(Driver {
                controller,
                synced_at: Instant::now(),
            })),
            tick_sender,
            game_event_sender,
            system_event_sender,
            high_scores: Arc::new(RwLock::new(high_scores)),
        })
    }

    /// Runs the engine until a Ctrl+C signal is received.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await
    }

    /// Runs the engine until `shutdown` completes.
    ///
    /// This method will:
    /// 1. Start the session (the intro begins immediately).
    /// 2. Spawn the `SystemClock` task.
    /// 3. Spawn the dispatcher task that feeds ticks to the controller.
    /// 4. Wait for `shutdown`, then stop both tasks and wait for them to exit.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        info!("RingtapEngine starting up...");
        let (shutdown_tx, _) = broadcast::channel(1);

        {
            let mut driver = self.driver.lock().await;
            driver.synced_at = Instant::now();
            driver.controller.start();
        }

        let clock = SystemClock::new(self.config.resolution, self.tick_sender.clone());
        let clock_task = tokio::spawn(clock.run(shutdown_tx.subscribe()));

        let dispatcher = self.clone();
        let dispatcher_shutdown_rx = shutdown_tx.subscribe();
        let dispatcher_task =
            tokio::spawn(async move { dispatcher.dispatcher_loop(dispatcher_shutdown_rx).await });

        info!(
            "Engine running at {} ticks/s.",
            self.config.resolution.ticks_per_second()
        );
        shutdown.await;

        info!("Shutdown requested. Broadcasting to all tasks...");
        if shutdown_tx.send(()).is_err() {
            error!("Failed to send shutdown signal. Some tasks may not terminate gracefully.");
        }
        clock_task.await?;
        dispatcher_task.await?;
        self.system_event_sender
            .send(SystemEvent::EngineShutdown)
            .ok();
        info!("RingtapEngine has shut down.");
        Ok(())
    }

    #[doc(hidden)]
    async fn dispatcher_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut tick_rx = self.tick_sender.subscribe();
        self.system_event_sender
            .send(SystemEvent::EngineStarted {
                timestamp: tokio::time::Instant::now(),
            })
            .ok();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                received = tick_rx.recv() => match received {
                    Ok(tick) => {
                        trace!("Tick #{} received.", tick.tick_count);
                        let finished = {
                            let mut driver = self.driver.lock().await;
                            let before = driver.controller.phase();
                            driver.catch_up(tick.timestamp);
                            self.after_step(before, &driver.controller).await
                        };
                        if let Some(board) = finished {
                            self.persist(board).await;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // The next tick's timestamp covers the skipped time.
                        warn!("Dispatcher fell behind by {} ticks.", missed);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    /// Records the finished session if this step ended it.
    ///
    /// Returns a copy of the board when it changed and needs writing to disk.
    /// The caller saves it after releasing the controller.
    #[doc(hidden)]
    async fn after_step(&self, before: Phase, controller: &Controller) -> Option<HighScores> {
        if before == Phase::GameOver || controller.phase() != Phase::GameOver {
            return None;
        }
        let snapshot = controller.snapshot();
        let entry = HighScoreEntry {
            score: snapshot.hud.score,
            rounds: snapshot.round,
            best_combo: snapshot.stats.best_combo,
            achieved_at: Utc::now(),
        };
        let mut scores = self.high_scores.write().await;
        let rank = scores.add_score(entry)?;
        info!("New high score #{}: {}", rank, snapshot.hud.score);
        self.system_event_sender
            .send(SystemEvent::HighScoreRecorded {
                rank,
                score: snapshot.hud.score,
            })
            .ok();
        self.config.highscore_path.as_ref().map(|_| scores.clone())
    }

    /// Writes the leaderboard on the blocking pool.
    #[doc(hidden)]
    async fn persist(&self, board: HighScores) {
        let Some(path) = self.config.highscore_path.clone() else {
            return;
        };
        match tokio::task::spawn_blocking(move || board.save(&path)).await {
            Ok(Ok(())) => debug!("High scores saved."),
            Ok(Err(e)) => warn!("Could not save high scores: {}", e),
            Err(e) => error!("High score writer failed: {}", e),
        }
    }
}

// Public API implementation block.
impl RingtapEngine {
    /// Forwards a tap on `target` to the session, judged at the instant it
    /// arrives rather than at the last clock tick.
    ///
    /// Taps that cannot count (during the intro, after game over, or on an
    /// unknown target) are reported as `SystemEvent::TapRejected`.
    pub async fn tap(&self, target: TargetId) -> TapResult {
        let (result, finished) = {
            let mut driver = self.driver.lock().await;
            let before = driver.controller.phase();
            driver.catch_up(Instant::now());
            let result = driver.controller.tap(target);
            (result, self.after_step(before, &driver.controller).await)
        };
        if let TapResult::Rejected(reason) = result {
            warn!("Tap on {} rejected: {:?}", target, reason);
            self.system_event_sender
                .send(SystemEvent::TapRejected { target, reason })
                .ok();
        }
        if let Some(board) = finished {
            self.persist(board).await;
        }
        result
    }

    /// Throws away the current session and starts over from the intro.
    pub async fn restart(&self) {
        self.driver.lock().await.controller.restart();
        self.system_event_sender
            .send(SystemEvent::SessionRestarted)
            .ok();
    }

    /// A point-in-time view of the session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.driver.lock().await.controller.snapshot()
    }

    /// A copy of the leaderboard.
    pub async fn high_scores(&self) -> HighScores {
        self.high_scores.read().await.clone()
    }

    pub fn target_count(&self) -> u8 {
        self.config.target_count
    }

    /// Subscribes to the `GameEvent` stream.
    pub fn subscribe_game_events(&self) -> broadcast::Receiver<GameEvent> {
        self.game_event_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }

    /// Subscribes to the raw `TickEvent` stream.
    pub fn subscribe_tick_events(&self) -> broadcast::Receiver<Arc<TickEvent>> {
        self.tick_sender.subscribe()
    }
}
