use serde::{Deserialize, Serialize};

use crate::*;

/// How many runs the leaderboard keeps.
pub const MAX_HIGH_SCORES: usize = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: Score,
    /// Stages cleared when the run ended.
    pub stage: u32,
}

impl HighScoreEntry {
    pub const fn new(score: Score, stage: u32) -> Self {
        Self { score, stage }
    }
}

/// Top runs, best first.
///
/// Serializes as a plain JSON array of `{"score", "stage"}` objects. Deserialized lists are re-sorted and truncated,
/// so whatever ends up in storage cannot break the ordering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HighScoreEntry>", into = "Vec<HighScoreEntry>")]
pub struct HighScores {
    entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(mut entries: Vec<HighScoreEntry>) -> Self {
        entries.retain(|entry| entry.score > 0);
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_HIGH_SCORES);
        Self { entries }
    }

    /// Parses a stored slot, anything unreadable counts as no scores at all.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(scores) => scores,
            Err(err) => {
                log::warn!("Discarding unreadable high scores: {}", err);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Adds a finished run, returning its rank when it made the board.
    ///
    /// Runs that scored nothing are never recorded.
    pub fn record(&mut self, score: Score, stage: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }

        // ties keep the older run ahead
        let rank = self.entries.partition_point(|entry| entry.score >= score);
        if rank >= MAX_HIGH_SCORES {
            return None;
        }

        self.entries.insert(rank, HighScoreEntry::new(score, stage));
        self.entries.truncate(MAX_HIGH_SCORES);
        log::debug!("high score {} recorded at rank {}", score, rank + 1);
        Some(rank)
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<HighScoreEntry> {
        self.entries.first().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<HighScoreEntry>> for HighScores {
    fn from(entries: Vec<HighScoreEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<HighScores> for Vec<HighScoreEntry> {
    fn from(scores: HighScores) -> Self {
        scores.entries
    }
}
