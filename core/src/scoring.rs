use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

pub const BASE_SCORE: Score = 1000;

/// Bonus points per full second left on the clock.
pub const TIME_BONUS_PER_SECOND: Score = 10;

/// What a click on a base-colored cell costs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissPenalty {
    /// Deducted from the stage countdown, floored at zero.
    Time(Duration),
    /// Deducted from the score, floored at zero.
    Score(Score),
}

impl MissPenalty {
    /// Returns the new `(score, time_remaining)`.
    pub fn apply(self, score: Score, time_remaining: Duration) -> (Score, Duration) {
        match self {
            Self::Time(penalty) => (score, time_remaining.saturating_sub(penalty)),
            Self::Score(penalty) => (score.saturating_sub(penalty), time_remaining),
        }
    }
}

/// `(110 - delta) / 100` expressed in percent, so smaller deltas pay more.
pub const fn delta_multiplier_percent(color_delta: u8) -> Score {
    110u32.saturating_sub(color_delta as Score)
}

/// `floor(seconds * 10)`.
pub fn time_bonus(time_remaining: Duration) -> Score {
    let bonus = time_remaining.as_millis() * u128::from(TIME_BONUS_PER_SECOND) / 1000;
    bonus.try_into().unwrap_or(Score::MAX)
}

/// Points awarded for finding every target in a stage.
pub fn stage_bonus(config: &StageConfig, time_remaining: Duration) -> Score {
    let delta_score = BASE_SCORE * delta_multiplier_percent(config.color_delta) / 100;
    delta_score.saturating_add(time_bonus(time_remaining))
}
