//! Target slots and the fixed pool that owns them.
//!
//! A slot's resolution is raced by two triggers: the player's tap and the
//! slot's own timeout. Both funnel into `TargetSlot::resolve`, the single write
//! path out of `Active`, so exactly one of them wins per activation and the
//! loser becomes a no-op.

use crate::common::{Outcome, TargetId, TimerId};
use crate::time::SimInstant;
use std::time::Duration;
use tracing::trace;

/// Lifecycle of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Idle,
    Active {
        started_at: SimInstant,
        window: Duration,
        /// The pending timeout that will resolve this activation as a miss.
        timeout: TimerId,
    },
    Resolved {
        outcome: Outcome,
        elapsed: Duration,
    },
}

/// The result handed to whichever trigger won the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub target: TargetId,
    pub outcome: Outcome,
    pub elapsed: Duration,
    pub window: Duration,
    /// The timeout timer that was armed for this activation. A tap winner
    /// must cancel it.
    pub timeout: TimerId,
}

/// One activatable target.
#[derive(Debug, Clone)]
pub struct TargetSlot {
    id: TargetId,
    status: SlotStatus,
}

impl TargetSlot {
    pub fn new(id: TargetId) -> Self {
        Self {
            id,
            status: SlotStatus::Idle,
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SlotStatus::Active { .. })
    }

    /// Deadline of the current activation, if any.
    pub fn deadline(&self) -> Option<SimInstant> {
        match self.status {
            SlotStatus::Active {
                started_at, window, ..
            } => Some(started_at + window),
            _ => None,
        }
    }

    /// Time from activation to resolution. Only meaningful once resolved.
    pub fn elapsed(&self) -> Option<Duration> {
        match self.status {
            SlotStatus::Resolved { elapsed, .. } => Some(elapsed),
            _ => None,
        }
    }

    /// Opens a new window. `timeout` is the already-scheduled timer that will
    /// call `expire` at `now + window`.
    ///
    /// If the slot was still active, that activation is abandoned and its
    /// timer id is returned so the caller can cancel it.
    pub fn activate(&mut self, now: SimInstant, window: Duration, timeout: TimerId) -> Option<TimerId> {
        let abandoned = match self.status {
            SlotStatus::Active { timeout, .. } => Some(timeout),
            _ => None,
        };
        self.status = SlotStatus::Active {
            started_at: now,
            window,
            timeout,
        };
        trace!("Target {} active for {:?}.", self.id, window);
        abandoned
    }

    /// The player touched this slot at `now`.
    ///
    /// Returns `None` when the slot is not active, so stray and late taps do
    /// nothing. A tap at or past the deadline counts as the timeout firing,
    /// because the timeout wins ties.
    pub fn report_tap(&mut self, now: SimInstant) -> Option<Resolution> {
        let deadline = self.deadline()?;
        if now >= deadline {
            return self.expire();
        }
        self.resolve(Outcome::Hit, now)
    }

    /// The slot's timeout fired. A no-op if a tap already resolved it.
    pub fn expire(&mut self) -> Option<Resolution> {
        let deadline = self.deadline()?;
        self.resolve(Outcome::Miss, deadline)
    }

    /// Returns the slot to `Idle`, dropping any activation without resolving it.
    pub fn reset(&mut self) {
        self.status = SlotStatus::Idle;
    }

    /// The check-and-set guard: the only transition out of `Active`.
    fn resolve(&mut self, outcome: Outcome, at: SimInstant) -> Option<Resolution> {
        let SlotStatus::Active {
            started_at,
            window,
            timeout,
        } = self.status
        else {
            return None;
        };
        let elapsed = match outcome {
            Outcome::Hit => at.saturating_duration_since(started_at).min(window),
            Outcome::Miss => window,
        };
        self.status = SlotStatus::Resolved { outcome, elapsed };
        Some(Resolution {
            target: self.id,
            outcome,
            elapsed,
            window,
            timeout,
        })
    }
}

/// The session's fixed set of targets, indexed by `TargetId`.
#[derive(Debug, Clone)]
pub struct TargetPool {
    slots: Vec<TargetSlot>,
}

impl TargetPool {
    pub fn new(count: u8) -> Self {
        Self {
            slots: (0..count).map(|i| TargetSlot::new(TargetId(i))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetSlot> {
        self.slots.get(id.index())
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut TargetSlot> {
        self.slots.get_mut(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetSlot> {
        self.slots.iter()
    }

    /// The currently active slot, if any. There is never more than one.
    pub fn active(&self) -> Option<TargetId> {
        self.slots.iter().find(|s| s.is_active()).map(TargetSlot::id)
    }

    pub fn reset_all(&mut self) {
        self.slots.iter_mut().for_each(TargetSlot::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimerQueue;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn at(n: u64) -> SimInstant {
        SimInstant::ZERO + ms(n)
    }

    fn armed_slot(window: Duration) -> (TargetSlot, TimerId) {
        let mut timers = TimerQueue::new();
        let timeout = timers.schedule(SimInstant::ZERO, window, ());
        let mut slot = TargetSlot::new(TargetId(2));
        assert_eq!(slot.activate(SimInstant::ZERO, window, timeout), None);
        (slot, timeout)
    }

    #[test]
    fn tap_inside_window_is_a_hit() {
        let (mut slot, timeout) = armed_slot(ms(1_500));
        let res = slot.report_tap(at(600)).expect("resolves");
        assert_eq!(res.outcome, Outcome::Hit);
        assert_eq!(res.elapsed, ms(600));
        assert_eq!(res.timeout, timeout);
        assert_eq!(slot.elapsed(), Some(ms(600)));
    }

    #[test]
    fn timeout_is_a_miss_with_full_window_elapsed() {
        let (mut slot, _) = armed_slot(ms(1_500));
        let res = slot.expire().expect("resolves");
        assert_eq!(res.outcome, Outcome::Miss);
        assert_eq!(res.elapsed, ms(1_500));
    }

    #[test]
    fn tap_exactly_at_deadline_loses_to_timeout() {
        let (mut slot, _) = armed_slot(ms(1_500));
        let res = slot.report_tap(at(1_500)).expect("resolves");
        assert_eq!(res.outcome, Outcome::Miss);
    }

    #[test]
    fn resolved_slot_ignores_both_triggers() {
        let (mut slot, _) = armed_slot(ms(1_000));
        slot.report_tap(at(100)).expect("first tap wins");
        let settled = slot.status();
        assert_eq!(slot.expire(), None);
        assert_eq!(slot.report_tap(at(200)), None);
        assert_eq!(slot.status(), settled);
    }

    #[test]
    fn idle_slot_ignores_taps() {
        let mut slot = TargetSlot::new(TargetId(0));
        assert_eq!(slot.report_tap(at(10)), None);
        assert_eq!(slot.expire(), None);
        assert_eq!(slot.status(), SlotStatus::Idle);
    }

    #[test]
    fn reactivating_an_active_slot_hands_back_the_old_timer() {
        let mut timers = TimerQueue::new();
        let first = timers.schedule(SimInstant::ZERO, ms(500), ());
        let second = timers.schedule(SimInstant::ZERO, ms(500), ());
        let mut slot = TargetSlot::new(TargetId(1));
        slot.activate(SimInstant::ZERO, ms(500), first);
        assert_eq!(slot.activate(at(10), ms(500), second), Some(first));
        assert_eq!(slot.deadline(), Some(at(510)));
    }

    #[test]
    fn pool_reports_single_active_slot() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new(4);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.active(), None);

        let timeout = timers.schedule(SimInstant::ZERO, ms(300), ());
        pool.get_mut(TargetId(3))
            .expect("slot exists")
            .activate(SimInstant::ZERO, ms(300), timeout);
        assert_eq!(pool.active(), Some(TargetId(3)));

        pool.reset_all();
        assert!(pool.iter().all(|s| s.status() == SlotStatus::Idle));
        assert!(pool.get(TargetId(4)).is_none());
    }
}
