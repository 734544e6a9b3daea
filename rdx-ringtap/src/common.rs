//! Contains common, primitive types shared across the engine.
//!
//! This module defines the basic ID types used to identify targets and scheduled
//! timers. Using distinct types keeps a target index from ever being confused
//! with a timer handle.

use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a scheduled timer in a `TimerQueue`.
    ///
    /// Keys are never reused, so a handle kept past cancellation can never
    /// match a newer timer.
    pub struct TimerId;
}

/// Identifies one target (ring) in the session's pool.
///
/// Ids are dense, `0..target_count`, and stable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u8);

impl TargetId {
    /// The pool index this id refers to.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The player tapped the target inside its window.
    Hit,
    /// The window closed first.
    Miss,
}
