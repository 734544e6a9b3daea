//! Pure scoring rules. No state, no side effects.

use std::time::Duration;

/// Combo never exceeds this multiplier.
pub const MAX_COMBO: u32 = 10;
/// Combo resets to this on a miss.
pub const MIN_COMBO: u32 = 1;
/// Points for a hit at combo 1 with no speed bonus.
pub const BASE_POINTS: f64 = 10.0;
/// Points lost on a miss, floored at zero.
pub const MISS_PENALTY: u64 = 5;

/// What a hit earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitAward {
    pub points: u64,
    pub combo: u32,
}

/// What a miss costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissPenalty {
    pub score: u64,
    pub lives: u32,
    pub combo: u32,
}

/// How fast the tap was, as a fraction of the window left over: 1.0 for an
/// instant tap, 0.0 at the deadline.
pub fn speed_ratio(elapsed: Duration, window: Duration) -> f64 {
    if window.is_zero() {
        return 0.0;
    }
    (1.0 - elapsed.as_secs_f64() / window.as_secs_f64()).clamp(0.0, 1.0)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Scores a hit: a 1x to 2x speed bonus scaled by the current combo.
pub fn on_hit(elapsed: Duration, window: Duration, combo: u32) -> HitAward {
    let combo = combo.clamp(MIN_COMBO, MAX_COMBO);
    let speed_bonus = lerp(1.0, 2.0, speed_ratio(elapsed, window));
    let points = (BASE_POINTS * speed_bonus * f64::from(combo)).round() as u64;
    HitAward {
        points,
        combo: (combo + 1).min(MAX_COMBO),
    }
}

/// Applies a miss: combo resets, score and lives drop, both floored at zero.
pub fn on_miss(score: u64, lives: u32, _combo: u32) -> MissPenalty {
    MissPenalty {
        score: score.saturating_sub(MISS_PENALTY),
        lives: lives.saturating_sub(1),
        combo: MIN_COMBO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn instant_tap_doubles_points() {
        let award = on_hit(Duration::ZERO, Duration::from_millis(1_500), 1);
        assert_eq!(award, HitAward { points: 20, combo: 2 });
    }

    #[test]
    fn tap_at_deadline_earns_base_points() {
        let window = Duration::from_millis(1_500);
        assert_eq!(on_hit(window, window, 3).points, 30);
    }

    #[test]
    fn halfway_tap_rounds_to_nearest() {
        let award = on_hit(Duration::from_millis(750), Duration::from_millis(1_500), 1);
        assert_eq!(award.points, 15);
    }

    #[test]
    fn combo_caps_at_ten() {
        let award = on_hit(Duration::ZERO, Duration::from_secs(1), MAX_COMBO);
        assert_eq!(award.combo, MAX_COMBO);
        assert_eq!(award.points, 200);
    }

    #[test]
    fn miss_floors_score_and_lives() {
        assert_eq!(
            on_miss(3, 0, 7),
            MissPenalty {
                score: 0,
                lives: 0,
                combo: 1
            }
        );
        assert_eq!(on_miss(42, 3, 4).score, 37);
    }

    proptest! {
        #[test]
        fn hit_points_stay_between_one_and_two_times_combo(
            window_ms in 1u64..5_000,
            frac in 0.0f64..=1.0,
            combo in MIN_COMBO..=MAX_COMBO,
        ) {
            let window = Duration::from_millis(window_ms);
            let elapsed = window.mul_f64(frac);
            let award = on_hit(elapsed, window, combo);
            let combo64 = u64::from(combo);
            prop_assert!(award.points >= 10 * combo64);
            prop_assert!(award.points <= 20 * combo64);
            prop_assert_eq!(award.combo, (combo + 1).min(MAX_COMBO));
        }

        #[test]
        fn miss_never_leaves_range(score in 0u64..1_000, lives in 0u32..10, combo in MIN_COMBO..=MAX_COMBO) {
            let penalty = on_miss(score, lives, combo);
            prop_assert_eq!(penalty.combo, MIN_COMBO);
            prop_assert!(penalty.score <= score);
            prop_assert!(penalty.lives <= lives);
        }
    }
}
