use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use ringtap::highscores::HighScores;
use ringtap::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging. RUST_LOG overrides the default.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load configuration: optional TOML path as the first argument.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = RingtapConfig::load(config_path.as_deref())?;
    let player_seed = config.seed.map(|s| s.wrapping_add(1));

    // 3. Create the engine.
    let engine = RingtapEngine::new(config)?;

    // 4. Spawn listeners and the automatic player.
    let (game_over_tx, game_over_rx) = oneshot::channel();
    spawn_event_listeners(&engine, game_over_tx);
    spawn_auto_player(&engine, player_seed);

    // 5. Run until the first game over (or Ctrl+C).
    engine
        .run_until(async {
            tokio::select! {
                _ = game_over_rx => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        })
        .await?;

    print_summary(&engine.snapshot().await, &engine.high_scores().await);
    Ok(())
}

/// Logs game and system events, and signals when the session ends.
fn spawn_event_listeners(engine: &RingtapEngine, game_over_tx: oneshot::Sender<()>) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let mut game_rx = engine.subscribe_game_events();
    tokio::spawn(async move {
        let mut game_over_tx = Some(game_over_tx);
        while let Ok(event) = game_rx.recv().await {
            match event {
                GameEvent::IntroToken { token, .. } => info!("[INTRO] {}", token),
                GameEvent::HudUpdated(hud) => info!(
                    "[HUD] score {} | combo x{} | lives {}",
                    hud.score, hud.combo, hud.lives
                ),
                GameEvent::GameOver { final_score, rounds } => {
                    info!("[GAME OVER] {} points in {} rounds", final_score, rounds);
                    if let Some(tx) = game_over_tx.take() {
                        tx.send(()).ok();
                    }
                }
                other => info!("[GAME] => {:?}", other),
            }
        }
    });
}

/// Taps each activated target after a random reaction delay. The delay can
/// overshoot the window, so the bot misses now and then.
fn spawn_auto_player(engine: &RingtapEngine, seed: Option<u64>) {
    let mut game_rx = engine.subscribe_game_events();
    let engine = engine.clone();
    let mut rng = match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_entropy(),
    };
    tokio::spawn(async move {
        let mut window = Duration::from_secs(1);
        while let Ok(event) = game_rx.recv().await {
            match event {
                GameEvent::RoundStarted { window: w, .. } => window = w,
                GameEvent::TargetActivated { target } => {
                    let reaction = window.mul_f64(rng.gen_range(0.15..1.2));
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(reaction).await;
                        let result = engine.tap(target).await;
                        info!("[BOT] tapped {} after {:?}: {:?}", target, reaction, result);
                    });
                }
                _ => {}
            }
        }
    });
}

fn print_summary(snapshot: &SessionSnapshot, scores: &HighScores) {
    let stats = &snapshot.stats;
    println!();
    println!("Final score : {}", snapshot.hud.score);
    println!("Rounds      : {}", snapshot.round);
    println!("Hits/Misses : {}/{}", stats.hits, stats.misses);
    println!("Accuracy    : {:.0}%", stats.accuracy() * 100.0);
    println!("Best combo  : x{}", stats.best_combo);
    if let Some(mean) = stats.mean_reaction() {
        println!("Mean react  : {:?}", mean);
    }
    if let Some(fastest) = stats.fastest_reaction {
        println!("Fastest     : {:?}", fastest);
    }
    println!();
    println!("High scores:");
    for (rank, entry) in scores.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:>6}  ({} rounds, best x{}, {})",
            rank + 1,
            entry.score,
            entry.rounds,
            entry.best_combo,
            entry.achieved_at.format("%Y-%m-%d %H:%M")
        );
    }
}
