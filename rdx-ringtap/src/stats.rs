//! Running per-session statistics, reset on restart.

use crate::common::Outcome;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub hits: u32,
    pub misses: u32,
    pub best_combo: u32,
    /// Sum of hit reaction times, for the mean.
    total_reaction: Duration,
    pub fastest_reaction: Option<Duration>,
}

impl SessionStats {
    pub fn record(&mut self, outcome: Outcome, elapsed: Duration, combo_after: u32) {
        match outcome {
            Outcome::Hit => {
                self.hits += 1;
                self.total_reaction += elapsed;
                self.fastest_reaction = Some(match self.fastest_reaction {
                    Some(best) => best.min(elapsed),
                    None => elapsed,
                });
            }
            Outcome::Miss => self.misses += 1,
        }
        self.best_combo = self.best_combo.max(combo_after);
    }

    pub fn rounds(&self) -> u32 {
        self.hits + self.misses
    }

    /// Mean reaction time over hits only.
    pub fn mean_reaction(&self) -> Option<Duration> {
        (self.hits > 0).then(|| self.total_reaction / self.hits)
    }

    /// Hits as a fraction of resolved rounds.
    pub fn accuracy(&self) -> f64 {
        match self.rounds() {
            0 => 0.0,
            n => f64::from(self.hits) / f64::from(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_reactions_from_hits_only() {
        let mut stats = SessionStats::default();
        stats.record(Outcome::Hit, Duration::from_millis(300), 2);
        stats.record(Outcome::Miss, Duration::from_millis(1_500), 1);
        stats.record(Outcome::Hit, Duration::from_millis(500), 2);

        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.rounds(), 3);
        assert_eq!(stats.best_combo, 2);
        assert_eq!(stats.fastest_reaction, Some(Duration::from_millis(300)));
        assert_eq!(stats.mean_reaction(), Some(Duration::from_millis(400)));
        assert!((stats.accuracy() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stats_have_no_mean() {
        let stats = SessionStats::default();
        assert_eq!(stats.mean_reaction(), None);
        assert_eq!(stats.accuracy(), 0.0);
    }
}
