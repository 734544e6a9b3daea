//! Time sources: the simulated session clock, the one-shot timer queue, and the
//! real-time `SystemClock` that drives them.
//!
//! Game logic never reads the wall clock. It only sees `SimInstant`s, which
//! advance when the engine forwards a tick. This keeps every timing decision
//! reproducible under test.

use crate::common::TimerId;
use crate::config::ClockResolution;
use slotmap::SlotMap;
use std::ops::{Add, Sub};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// A point on the simulated session timeline, measured from session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// The start of the timeline.
    pub const ZERO: SimInstant = SimInstant(Duration::ZERO);

    /// Time elapsed since session start.
    pub fn since_start(self) -> Duration {
        self.0
    }

    /// Time from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: SimInstant) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = SimInstant;

    fn add(self, rhs: Duration) -> SimInstant {
        SimInstant(self.0.saturating_add(rhs))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: SimInstant) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

/// A monotonically advancing clock fed by explicit ticks.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: SimInstant,
    ticks: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimInstant {
        self.now
    }

    /// Number of ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances the clock. Time never runs backwards.
    pub fn advance(&mut self, delta: Duration) -> SimInstant {
        self.now = self.now + delta;
        self.ticks += 1;
        self.now
    }
}

struct ScheduledTimer<P> {
    deadline: SimInstant,
    seq: u64,
    payload: P,
}

/// A timer handed back by `TimerQueue::pop_due`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTimer<P> {
    pub id: TimerId,
    /// When the timer was due. Follow-up timers should be scheduled from here,
    /// not from the tick that noticed it, so coarse ticks do not add drift.
    pub deadline: SimInstant,
    pub payload: P,
}

/// A set of one-shot timers, each carrying a payload that names its purpose.
///
/// Timers are checked against a shared `SimInstant` rather than running on their
/// own. `pop_due` hands back expired timers earliest-first. Timers with equal
/// deadlines come back in the order they were scheduled.
pub struct TimerQueue<P> {
    timers: SlotMap<TimerId, ScheduledTimer<P>>,
    next_seq: u64,
}

impl<P> Default for TimerQueue<P> {
    fn default() -> Self {
        Self {
            timers: SlotMap::with_key(),
            next_seq: 0,
        }
    }
}

impl<P> TimerQueue<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to come due `after` the given instant.
    pub fn schedule(&mut self, now: SimInstant, after: Duration, payload: P) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(ScheduledTimer {
            deadline: now + after,
            seq,
            payload,
        })
    }

    /// Cancels a pending timer. Returns `true` if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        if !self.timers.is_empty() {
            debug!("Discarding {} pending timer(s).", self.timers.len());
        }
        self.timers.clear();
    }

    pub fn deadline(&self, id: TimerId) -> Option<SimInstant> {
        self.timers.get(id).map(|t| t.deadline)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Removes and returns the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: SimInstant) -> Option<DueTimer<P>> {
        let id = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(id, _)| id)?;
        let timer = self.timers.remove(id)?;
        trace!("Timer {:?} due at {:?}.", id, timer.deadline);
        Some(DueTimer {
            id,
            deadline: timer.deadline,
            payload: timer.payload,
        })
    }
}

/// One beat of the `SystemClock`.
#[derive(Debug, Clone)]
pub struct TickEvent {
    /// Ticks emitted since the clock started.
    pub tick_count: u64,
    /// Real time since the previous tick.
    pub delta: Duration,
    /// When the tick was produced.
    pub timestamp: Instant,
}

/// The real-time ticker that drives the engine.
///
/// It fires at the configured `ClockResolution` and broadcasts a `TickEvent`
/// each time, carrying the real elapsed time since the last beat.
pub struct SystemClock {
    period: Duration,
    tick_sender: broadcast::Sender<Arc<TickEvent>>,
}

impl SystemClock {
    pub fn new(resolution: ClockResolution, tick_sender: broadcast::Sender<Arc<TickEvent>>) -> Self {
        Self {
            period: resolution.period(),
            tick_sender,
        }
    }

    /// Runs until a shutdown signal arrives.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = ticker.tick().await;
        let mut tick_count = 0u64;
        debug!("SystemClock started with period {:?}.", self.period);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                now = ticker.tick() => {
                    tick_count += 1;
                    let event = TickEvent {
                        tick_count,
                        delta: now.saturating_duration_since(last),
                        timestamp: now,
                    };
                    last = now;
                    self.tick_sender.send(Arc::new(event)).ok();
                }
            }
        }
        debug!("SystemClock stopped after {} ticks.", tick_count);
    }
}
