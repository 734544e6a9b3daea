//! High score leaderboard.
//!
//! Keeps the top ten finished sessions, best first. The board can be saved to
//! and loaded from a JSON file; without a path it lives in memory only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Error)]
pub enum HighScoreError {
    #[error("could not access high score file: {0}")]
    Io(#[from] io::Error),
    #[error("high score file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Rounds played in the session
    pub rounds: u32,
    pub best_combo: u32,
    pub achieved_at: DateTime<Utc>,
}

/// High score leaderboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map_or(true, |e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished session to the leaderboard (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add_score(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let rank = self.potential_rank(entry.score)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Loads a leaderboard from `path`. A missing file is an empty board.
    pub fn load(path: &Path) -> Result<Self, HighScoreError> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let scores: HighScores = serde_json::from_str(&json)?;
                info!("Loaded {} high scores from {}", scores.entries.len(), path.display());
                Ok(scores)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No high scores at {}, starting fresh", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the leaderboard to `path` as pretty JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), HighScoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u64) -> HighScoreEntry {
        HighScoreEntry {
            score,
            rounds: 10,
            best_combo: 4,
            achieved_at: Utc::now(),
        }
    }

    #[test]
    fn zero_never_qualifies() {
        let mut board = HighScores::new();
        assert!(!board.qualifies(0));
        assert_eq!(board.add_score(entry(0)), None);
        assert!(board.is_empty());
    }

    #[test]
    fn keeps_scores_sorted_descending() {
        let mut board = HighScores::new();
        assert_eq!(board.add_score(entry(50)), Some(1));
        assert_eq!(board.add_score(entry(80)), Some(1));
        assert_eq!(board.add_score(entry(60)), Some(2));
        assert_eq!(board.add_score(entry(10)), Some(4));
        let scores: Vec<u64> = board.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, [80, 60, 50, 10]);
        assert_eq!(board.top_score(), Some(80));
    }

    #[test]
    fn full_board_drops_the_lowest() {
        let mut board = HighScores::new();
        for score in 1..=MAX_HIGH_SCORES as u64 {
            board.add_score(entry(score * 10));
        }
        assert!(!board.qualifies(10));
        assert_eq!(board.potential_rank(15), Some(10));
        assert_eq!(board.add_score(entry(15)), Some(10));
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(board.entries.last().map(|e| e.score), Some(15));
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("scores.json");

        assert!(HighScores::load(&path).expect("missing is empty").is_empty());

        let mut board = HighScores::new();
        board.add_score(entry(120));
        board.add_score(entry(90));
        board.save(&path).expect("saves");

        assert_eq!(HighScores::load(&path).expect("loads"), board);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores.json");
        fs::write(&path, "not json").expect("write");
        assert!(matches!(HighScores::load(&path), Err(HighScoreError::Json(_))));
    }
}
