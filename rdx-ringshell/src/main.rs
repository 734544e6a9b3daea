use anyhow::Result;
use colored::Colorize;
use ringtap::prelude::*;
use ringtap::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.magenta());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    let rule = "-".repeat(72);
    println!("{}", rule.dimmed());
    println!("{}", version_string);
    println!("{}", rule.dimmed());
}

fn print_help() {
    println!("Available commands:");
    println!("  tap <ID>     - Taps target ID (also: just type the number).");
    println!("  restart      - Throws away the session and starts over.");
    println!("  status       - Shows score, combo, lives and the live target.");
    println!("  scores       - Shows the high score table.");
    println!("  help         - Shows this list.");
    println!("  exit         - Quits the shell.");
}

/// Prints game events as they happen, colored by what they mean.
fn spawn_event_listeners(engine: &RingtapEngine) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            match event {
                SystemEvent::TapRejected { target, reason } => {
                    println!("<-- {} tap on {} ({:?})", "rejected".dimmed(), target, reason)
                }
                SystemEvent::HighScoreRecorded { rank, score } => {
                    println!("<-- {} #{} with {}", "NEW HIGH SCORE".yellow().bold(), rank, score)
                }
                _ => {}
            }
        }
    });

    let mut game_rx = engine.subscribe_game_events();
    tokio::spawn(async move {
        while let Ok(event) = game_rx.recv().await {
            match event {
                GameEvent::IntroToken { token, .. } => println!("<-- {}", token.bold()),
                GameEvent::AccentChosen { color } => println!("<-- accent {}", color.dimmed()),
                GameEvent::RoundStarted { round, target, window } => println!(
                    "<-- round {} : {} {} ({:.2}s)",
                    round,
                    "TAP".green().bold(),
                    target.0.to_string().green().bold(),
                    window.as_secs_f64()
                ),
                GameEvent::TargetResolved { target, outcome } => match outcome {
                    Outcome::Hit => println!("<-- {} {}", "HIT".green(), target),
                    Outcome::Miss => println!("<-- {} {}", "MISS".red(), target),
                },
                GameEvent::HudUpdated(hud) => println!(
                    "    score {}  combo x{}  lives {}",
                    hud.score.to_string().cyan(),
                    hud.combo,
                    "♥".repeat(hud.lives as usize).red()
                ),
                GameEvent::GameOver { final_score, rounds } => println!(
                    "<-- {} {} points in {} rounds. Type 'restart' to play again.",
                    "GAME OVER".red().bold(),
                    final_score,
                    rounds
                ),
                GameEvent::TargetActivated { .. } => {}
            }
        }
    });
}

async fn tap(engine: &RingtapEngine, arg: Option<&str>) {
    let Some(raw) = arg else {
        println!("Usage: tap <ID>");
        return;
    };
    match raw.parse::<u8>() {
        Ok(id) => {
            if let TapResult::Ignored = engine.tap(TargetId(id)).await {
                println!("--> #{} is not lit.", id);
            }
        }
        Err(_) => println!(
            "Error: '{}' is not a target id (0-{}).",
            raw,
            engine.target_count().saturating_sub(1)
        ),
    }
}

async fn print_status(engine: &RingtapEngine) {
    let s = engine.snapshot().await;
    println!("Phase   : {:?}", s.phase);
    println!("Score   : {}  (combo x{}, lives {})", s.hud.score, s.hud.combo, s.hud.lives);
    println!("Round   : {}  (window {:.2}s)", s.round, s.window.as_secs_f64());
    match s.active_target {
        Some(target) => println!("Live    : {}", target),
        None => println!("Live    : -"),
    }
    println!(
        "Stats   : {} hits, {} misses, best combo x{}",
        s.stats.hits, s.stats.misses, s.stats.best_combo
    );
}

async fn print_scores(engine: &RingtapEngine) {
    let scores = engine.high_scores().await;
    if scores.is_empty() {
        println!("No high scores yet.");
        return;
    }
    for (rank, entry) in scores.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:>6}  {} rounds  x{}",
            rank + 1,
            entry.score,
            entry.rounds,
            entry.best_combo
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = RingtapConfig::load(config_path.as_deref())?;
    let engine = RingtapEngine::new(config)?;
    let engine_handle = engine.clone();

    spawn_event_listeners(&engine_handle);

    info!("Spawning {} in the background...", ENGINE_NAME);
    tokio::spawn(async move {
        if let Err(e) = engine.run().await {
            eprintln!("\nEngine stopped with an error: {}", e);
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} is running with {} targets. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.magenta(),
        engine_handle.target_count()
    );

    loop {
        let prompt = format!("{}", ">> ".magenta().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();
                match args.first().copied() {
                    Some("tap") => tap(&engine_handle, args.get(1).copied()).await,
                    Some("restart") => {
                        engine_handle.restart().await;
                        println!("--> Session restarted.");
                    }
                    Some("status") => print_status(&engine_handle).await,
                    Some("scores") => print_scores(&engine_handle).await,
                    Some("help") => print_help(),
                    Some("exit") => break,
                    Some(cmd) if cmd.parse::<u8>().is_ok() => tap(&engine_handle, Some(cmd)).await,
                    Some(_) => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
                    None => {}
                }
            }
            Err(_) => {
                println!("Exiting ringshell...");
                break;
            }
        }
    }

    Ok(())
}
