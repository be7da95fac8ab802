//! Run scoring and high score leaderboard
//!
//! Score is distance travelled plus collected pickups. The leaderboard is kept
//! in memory and serialized as JSON, optionally to a file the host names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::settings::ScoringSettings;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Accumulates score for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreCounter {
    settings: ScoringSettings,
    /// World units travelled
    pub distance: f32,
    /// Pickups collected
    pub pickups: u32,
}

impl ScoreCounter {
    pub fn new(settings: ScoringSettings) -> Self {
        Self {
            settings,
            distance: 0.0,
            pickups: 0,
        }
    }

    /// Add forward travel; negative or non-finite values are ignored
    pub fn add_distance(&mut self, distance: f32) {
        if distance.is_finite() && distance > 0.0 {
            self.distance += distance;
        }
    }

    pub fn collect_pickups(&mut self, count: u32) {
        self.pickups = self.pickups.saturating_add(count);
    }

    pub fn score(&self) -> u64 {
        let travel = (self.distance * self.settings.points_per_unit).max(0.0).floor() as u64;
        travel.saturating_add(self.settings.pickup_value.saturating_mul(self.pickups as u64))
    }

    pub fn reset(&mut self) {
        self.distance = 0.0;
        self.pickups = 0;
    }
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score
    pub score: u64,
    /// Distance reached
    pub distance: f32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, distance: f32, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            distance,
            timestamp,
        };

        // Sorted descending by score; ties keep the earlier run first
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn to_json(&self) -> Result<String, TrackError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let mut scores: Self = serde_json::from_str(json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    /// Load a leaderboard file; a missing file is an empty leaderboard
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(json) => Self::from_json(&json),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TrackError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("High scores saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_combines_distance_and_pickups() {
        let mut counter = ScoreCounter::new(ScoringSettings {
            points_per_unit: 2.0,
            pickup_value: 25,
        });
        counter.add_distance(10.4);
        counter.add_distance(-5.0);
        counter.collect_pickups(3);
        assert_eq!(counter.score(), 20 + 75);

        counter.reset();
        assert_eq!(counter.score(), 0);
    }

    #[test]
    fn test_leaderboard_ranks_and_truncates() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        for s in 1..=MAX_HIGH_SCORES as u64 {
            assert!(scores.add_score(s * 100, s as f32, 0.0).is_some());
        }
        assert_eq!(scores.top_score(), Some(1000));
        assert!(!scores.qualifies(100));
        assert_eq!(scores.potential_rank(550), Some(6));

        assert_eq!(scores.add_score(2000, 50.0, 1.0), Some(1));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(200));
    }

    #[test]
    fn test_json_reload_sorts() {
        let json = r#"{"entries":[{"score":5,"distance":1.0,"timestamp":0.0},{"score":9,"distance":2.0,"timestamp":0.0}]}"#;
        let scores = HighScores::from_json(json).unwrap();
        assert_eq!(scores.top_score(), Some(9));

        let again = HighScores::from_json(&scores.to_json().unwrap()).unwrap();
        assert_eq!(again.entries.len(), 2);
    }

    #[test]
    fn test_file_round_trip_and_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "endless_runner_scores_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        assert!(HighScores::load(&path).unwrap().is_empty());

        let mut scores = HighScores::new();
        scores.add_score(420, 400.0, 1.0);
        scores.save(&path).unwrap();
        assert_eq!(HighScores::load(&path).unwrap().top_score(), Some(420));
        let _ = std::fs::remove_file(&path);
    }
}
