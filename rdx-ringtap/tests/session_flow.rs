// Drives complete sessions through the public controller API with a seeded RNG,
// checking the cross-module rules: clamped counters, window decay, a single
// game-over, and a clean restart.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use ringtap::presenter::RecordingPresenter;
use ringtap::prelude::*;
use ringtap::session::Hud;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn new_controller(config: RingtapConfig, seed: u64) -> RoundController<Pcg32, RecordingPresenter> {
    RoundController::new(&config, Pcg32::seed_from_u64(seed), RecordingPresenter::default())
        .expect("valid config")
}

/// Ticks at 60 fps until `done` holds, with a generous safety cap.
fn run_until(
    c: &mut RoundController<Pcg32, RecordingPresenter>,
    mut done: impl FnMut(&RoundController<Pcg32, RecordingPresenter>) -> bool,
) {
    for _ in 0..1_000_000 {
        if done(c) {
            return;
        }
        c.tick(FRAME);
    }
    panic!("condition never reached");
}

#[test]
fn a_perfect_player_climbs_combo_and_shrinks_the_window() {
    let mut c = new_controller(RingtapConfig::default(), 1);
    c.start();

    let mut last_window = c.session().current_active_time();
    for round in 1..=60u32 {
        run_until(&mut c, |c| c.pool().active().is_some());
        assert_eq!(c.session().round_number(), round);

        let window = c.session().current_active_time();
        assert!(window <= last_window);
        assert!(window >= Duration::from_millis(400));
        last_window = window;

        let target = c.pool().active().expect("live target");
        assert_eq!(c.tap(target), TapResult::Resolved(Outcome::Hit));
        assert!(c.session().combo() <= 10);
    }

    assert_eq!(c.session().combo(), 10);
    assert_eq!(c.session().lives(), 3);
    assert_eq!(last_window, Duration::from_millis(400));
    assert_eq!(c.stats().hits, 60);
}

#[test]
fn an_absent_player_loses_exactly_three_lives() {
    let mut c = new_controller(RingtapConfig::default(), 2);
    c.start();
    run_until(&mut c, |c| c.phase() == Phase::GameOver);

    let events = c.presenter_mut().take();
    let lives: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::HudUpdated(hud) => Some(hud.lives),
            _ => None,
        })
        .collect();
    assert_eq!(lives, [2, 1, 0]);

    let game_overs = events
        .iter()
        .filter(|e| matches!(e, GameEvent::GameOver { .. }))
        .count();
    assert_eq!(game_overs, 1);
    assert_eq!(events.last(), Some(&GameEvent::GameOver { final_score: 0, rounds: 3 }));

    // Nothing further resolves however long the clock keeps running.
    for _ in 0..1_000 {
        c.tick(FRAME);
    }
    assert!(c.presenter_mut().take().is_empty());
}

#[test]
fn every_activation_resolves_exactly_once() {
    let mut c = new_controller(
        RingtapConfig {
            starting_lives: 5,
            ..Default::default()
        },
        3,
    );
    c.start();

    // Alternate: hit one round, let the next time out, and spam stale taps.
    let mut hit_next = true;
    while c.phase() != Phase::GameOver {
        run_until(&mut c, |c| {
            c.pool().active().is_some() || c.phase() == Phase::GameOver
        });
        let Some(target) = c.pool().active() else {
            break;
        };
        if hit_next {
            c.tap(target);
            assert_eq!(c.tap(target), TapResult::Ignored);
        } else {
            run_until(&mut c, |c| c.pool().active().is_none());
            assert_ne!(c.tap(target), TapResult::Resolved(Outcome::Hit));
        }
        hit_next = !hit_next;
    }

    let events = c.presenter().events.clone();
    let activated = events
        .iter()
        .filter(|e| matches!(e, GameEvent::TargetActivated { .. }))
        .count();
    let resolved = events
        .iter()
        .filter(|e| matches!(e, GameEvent::TargetResolved { .. }))
        .count();
    assert_eq!(activated, resolved);
    assert_eq!(c.stats().misses, 5);
    assert_eq!(c.stats().hits as usize + 5, resolved);
}

#[test]
fn restart_after_game_over_restores_a_fresh_session() {
    let config = RingtapConfig::default();
    let mut c = new_controller(config, 4);
    c.start();
    run_until(&mut c, |c| c.pool().active().is_some());
    let target = c.pool().active().expect("live target");
    c.tap(target);
    run_until(&mut c, |c| c.phase() == Phase::GameOver);

    c.restart();
    assert_eq!(c.phase(), Phase::Intro);
    assert_eq!(c.session().hud(), Hud { score: 0, combo: 1, lives: 3 });
    assert_eq!(c.session().round_number(), 0);
    assert_eq!(c.session().current_active_time(), Duration::from_millis(1_500));

    // The new session plays normally.
    run_until(&mut c, |c| c.pool().active().is_some());
    assert_eq!(c.session().round_number(), 1);
}

#[test]
fn seeded_sessions_replay_identically() {
    let play = |seed| {
        let mut c = new_controller(RingtapConfig::default(), seed);
        c.start();
        run_until(&mut c, |c| c.phase() == Phase::GameOver);
        (c.accent().map(str::to_owned), c.presenter_mut().take())
    };
    assert_eq!(play(77), play(77));
}
