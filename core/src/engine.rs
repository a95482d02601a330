use core::time::Duration;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Main menu, no run in progress.
    Idle,
    InStage,
    /// All targets of the stage found, waiting for the host to call [`GameEngine::advance`].
    StageCleared,
    Cleared,
    Failed,
}

impl GamePhase {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Cleared | Self::Failed)
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::InStage | Self::StageCleared)
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Timing and penalty policy for a run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedRules")]
pub struct GameRules {
    pub stage_duration: Duration,
    pub miss_penalty: MissPenalty,
    pub color_space: ColorSpace,
    /// Pause between finding the last target and the next stage.
    pub feedback_delay: Duration,
}

impl GameRules {
    /// 15 second stages, every miss costs 3 seconds. The default.
    pub const fn time_penalty() -> Self {
        Self {
            stage_duration: Duration::from_secs(15),
            miss_penalty: MissPenalty::Time(Duration::from_secs(3)),
            color_space: ColorSpace::Rgb,
            feedback_delay: Duration::from_millis(500),
        }
    }

    /// 10 second stages, every miss costs 100 points.
    pub const fn score_penalty() -> Self {
        Self {
            stage_duration: Duration::from_secs(10),
            miss_penalty: MissPenalty::Score(100),
            color_space: ColorSpace::Hsl,
            feedback_delay: Duration::from_millis(500),
        }
    }

    pub const fn with_color_space(self, color_space: ColorSpace) -> Self {
        Self {
            color_space,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stage_duration.is_zero() {
            return Err(GameError::InvalidStageDuration);
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct UncheckedRules {
    stage_duration: Duration,
    miss_penalty: MissPenalty,
    color_space: ColorSpace,
    feedback_delay: Duration,
}

impl TryFrom<UncheckedRules> for GameRules {
    type Error = GameError;

    fn try_from(raw: UncheckedRules) -> Result<Self> {
        let rules = Self {
            stage_duration: raw.stage_duration,
            miss_penalty: raw.miss_penalty,
            color_space: raw.color_space,
            feedback_delay: raw.feedback_delay,
        };
        rules.validate()?;
        Ok(rules)
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::time_penalty()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Cleared,
    Failed,
}

/// What the result screen shows once a run is over.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub score: Score,
    /// Stages cleared, the index of the stage that timed out on failure.
    pub stage_reached: u32,
    /// Position on the leaderboard, if the run made it.
    pub high_score_rank: Option<usize>,
}

/// Transient feedback for the presentation layer to render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Target was already found.
    NoChange,
    Found {
        remaining: CellCount,
    },
    /// Last target found; pass `advance` to [`GameEngine::advance`] after the feedback delay.
    StageCleared {
        bonus: Score,
        advance: Epoch,
    },
    Missed,
    /// Miss penalty drained the clock.
    TimedOut(RunSummary),
}

impl ClickOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub const fn feedback(self) -> Option<Feedback> {
        use ClickOutcome::*;
        match self {
            NoChange => None,
            Found { .. } | StageCleared { .. } => Some(Feedback::Correct),
            Missed | TimedOut(_) => Some(Feedback::Incorrect),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Token from an earlier stage or the run was left, nothing happened.
    Stale,
    StageStarted(Epoch),
    Cleared(RunSummary),
}

/// Owns a whole play session: current run, countdown and leaderboard.
#[derive(Clone, Debug)]
pub struct GameEngine {
    campaign: Campaign,
    rules: GameRules,
    rng: SmallRng,
    phase: GamePhase,
    stage_index: usize,
    score: Score,
    grid: Option<Grid>,
    found: Array2<bool>,
    remaining_targets: CellCount,
    countdown: Countdown,
    high_scores: HighScores,
    last_run: Option<RunSummary>,
}

impl GameEngine {
    pub fn new(
        campaign: Campaign,
        rules: GameRules,
        seed: u64,
        high_scores: HighScores,
    ) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            campaign,
            rules,
            rng: SmallRng::seed_from_u64(seed),
            phase: Default::default(),
            stage_index: 0,
            score: 0,
            grid: None,
            found: Array2::default((0, 0)),
            remaining_targets: 0,
            countdown: Countdown::new(rules.stage_duration),
            high_scores,
            last_run: None,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn stage_count(&self) -> usize {
        self.campaign.len()
    }

    pub fn current_stage(&self) -> Option<&StageConfig> {
        self.campaign.get(self.stage_index)
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn remaining_targets(&self) -> CellCount {
        self.remaining_targets
    }

    pub fn found_targets(&self) -> CellCount {
        self.grid
            .as_ref()
            .map_or(0, |grid| grid.target_count() - self.remaining_targets)
    }

    pub fn is_found(&self, index: CellCount) -> bool {
        self.grid.as_ref().is_some_and(|grid| {
            index < grid.total_cells() && self.found[grid.coords_of(index).to_nd_index()]
        })
    }

    pub fn time_remaining(&self) -> Duration {
        self.countdown.remaining()
    }

    /// For the timer bar, `1.0` is a full clock.
    pub fn time_fraction(&self) -> f64 {
        self.countdown.fraction()
    }

    /// Epoch that countdown ticks must carry to be accepted.
    pub fn epoch(&self) -> Epoch {
        self.countdown.epoch()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn last_run(&self) -> Option<RunSummary> {
        self.last_run
    }

    /// Begins a fresh run at the first stage, from any phase.
    pub fn start(&mut self) -> Epoch {
        log::debug!("starting new run");
        self.stage_index = 0;
        self.score = 0;
        self.last_run = None;
        self.begin_stage()
    }

    pub fn retry(&mut self) -> Epoch {
        log::debug!("retry");
        self.start()
    }

    pub fn to_main_menu(&mut self) {
        log::debug!("back to main menu");
        self.countdown.cancel();
        self.phase = GamePhase::Idle;
        self.grid = None;
        self.remaining_targets = 0;
    }

    pub fn tile_click(&mut self, index: CellCount) -> Result<ClickOutcome> {
        if !matches!(self.phase, GamePhase::InStage) {
            return Err(GameError::NotInStage);
        }
        let grid = self.grid.as_ref().ok_or(GameError::NotInStage)?;
        let index = grid.validate_index(index)?;
        let is_target = grid.is_target(index);
        let coords = grid.coords_of(index).to_nd_index();

        if !is_target {
            log::trace!("miss at {}", index);
            return Ok(self.apply_miss());
        }

        if self.found[coords] {
            return Ok(ClickOutcome::NoChange);
        }
        self.found[coords] = true;
        self.remaining_targets -= 1;
        log::trace!("target at {}, {} left", index, self.remaining_targets);

        if self.remaining_targets > 0 {
            return Ok(ClickOutcome::Found {
                remaining: self.remaining_targets,
            });
        }

        let config = self.campaign[self.stage_index];
        let bonus = stage_bonus(&config, self.countdown.remaining());
        self.score = self.score.saturating_add(bonus);
        let advance = self.countdown.cancel();
        self.phase = GamePhase::StageCleared;
        log::debug!(
            "stage {} cleared, bonus {}, score {}",
            self.stage_index + 1,
            bonus,
            self.score
        );

        Ok(ClickOutcome::StageCleared { bonus, advance })
    }

    /// Feeds elapsed time from a scheduled tick into the stage countdown.
    pub fn tick(&mut self, epoch: Epoch, elapsed: Duration) -> TickOutcome {
        if !matches!(self.phase, GamePhase::InStage) {
            return TickOutcome::Stale;
        }

        let outcome = self.countdown.tick(epoch, elapsed);
        if outcome.is_expired() {
            log::debug!("time up on stage {}", self.stage_index + 1);
            self.finish(RunOutcome::Failed);
        }
        outcome
    }

    /// Continues after a stage clear, into the next stage or the end of the campaign.
    pub fn advance(&mut self, token: Epoch) -> AdvanceOutcome {
        if !matches!(self.phase, GamePhase::StageCleared) || token != self.countdown.epoch() {
            return AdvanceOutcome::Stale;
        }

        self.stage_index += 1;
        if self.stage_index >= self.campaign.len() {
            AdvanceOutcome::Cleared(self.finish(RunOutcome::Cleared))
        } else {
            AdvanceOutcome::StageStarted(self.begin_stage())
        }
    }

    fn begin_stage(&mut self) -> Epoch {
        let config = self.campaign[self.stage_index];
        let grid = RandomGridGenerator::new(self.rng.random(), self.rules.color_space)
            .generate(&config);

        self.found = Array2::default((grid.side(), grid.side()).to_nd_index());
        self.remaining_targets = grid.target_count();
        self.grid = Some(grid);
        self.phase = GamePhase::InStage;
        log::debug!(
            "stage {}/{}: {:?}",
            self.stage_index + 1,
            self.campaign.len(),
            config
        );
        self.countdown.restart()
    }

    fn apply_miss(&mut self) -> ClickOutcome {
        let (score, remaining) = self
            .rules
            .miss_penalty
            .apply(self.score, self.countdown.remaining());
        self.score = score;

        if self.countdown.set_remaining(remaining).is_expired() {
            log::debug!("miss penalty ran out the clock");
            ClickOutcome::TimedOut(self.finish(RunOutcome::Failed))
        } else {
            ClickOutcome::Missed
        }
    }

    fn finish(&mut self, outcome: RunOutcome) -> RunSummary {
        self.countdown.cancel();
        self.phase = match outcome {
            RunOutcome::Cleared => GamePhase::Cleared,
            RunOutcome::Failed => GamePhase::Failed,
        };

        let stage_reached = self.stage_index.min(self.campaign.len()) as u32;
        let high_score_rank = self.high_scores.record(self.score, stage_reached);
        let summary = RunSummary {
            outcome,
            score: self.score,
            stage_reached,
            high_score_rank,
        };
        log::info!("run ended: {:?}", summary);
        self.last_run = Some(summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn engine(rules: GameRules) -> GameEngine {
        GameEngine::new(Campaign::standard(), rules, 1234, HighScores::new()).unwrap()
    }

    fn target_indices(engine: &GameEngine) -> Vec<CellCount> {
        engine.grid().unwrap().target_indices().collect()
    }

    fn base_index(engine: &GameEngine) -> CellCount {
        let grid = engine.grid().unwrap();
        (0..grid.total_cells())
            .find(|&i| !grid.is_target(i))
            .unwrap()
    }

    fn clear_stage(engine: &mut GameEngine) -> Epoch {
        let mut token = None;
        for index in target_indices(engine) {
            if let ClickOutcome::StageCleared { advance, .. } = engine.tile_click(index).unwrap() {
                token = Some(advance);
            }
        }
        token.unwrap()
    }

    #[test]
    fn starts_idle_and_rejects_clicks() {
        let mut engine = engine(GameRules::default());
        assert_eq!(engine.phase(), GamePhase::Idle);
        assert_eq!(engine.tile_click(0), Err(GameError::NotInStage));
    }

    #[test]
    fn start_enters_first_stage() {
        let mut engine = engine(GameRules::default());
        let epoch = engine.start();

        assert_eq!(engine.phase(), GamePhase::InStage);
        assert_eq!(engine.stage_index(), 0);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.epoch(), epoch);
        assert_eq!(engine.time_remaining(), 15 * SECOND);
        assert_eq!(engine.current_stage(), Some(&STANDARD_STAGES[0]));

        let grid = engine.grid().unwrap();
        assert_eq!(grid.side(), 7);
        assert_eq!(grid.target_count(), 1);
        assert_eq!(engine.remaining_targets(), 1);
    }

    #[test]
    fn finding_the_only_target_scores_and_advances() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let target = target_indices(&engine)[0];

        let outcome = engine.tile_click(target).unwrap();
        let ClickOutcome::StageCleared { bonus, advance } = outcome else {
            panic!("unexpected outcome {:?}", outcome);
        };
        assert_eq!(bonus, 100 + 150);
        assert_eq!(engine.score(), 250);
        assert_eq!(engine.remaining_targets(), 0);
        assert_eq!(engine.phase(), GamePhase::StageCleared);
        assert_eq!(outcome.feedback(), Some(Feedback::Correct));
        assert!(engine.is_found(target));

        // the clock is suspended during the feedback delay
        assert_eq!(engine.tick(advance, SECOND), TickOutcome::Stale);
        assert_eq!(engine.tile_click(target), Err(GameError::NotInStage));

        assert!(matches!(
            engine.advance(advance),
            AdvanceOutcome::StageStarted(_)
        ));
        assert_eq!(engine.stage_index(), 1);
        assert_eq!(engine.grid().unwrap().side(), 8);
        assert_eq!(engine.time_remaining(), 15 * SECOND);
    }

    #[test]
    fn time_left_adds_to_the_bonus() {
        let mut engine = engine(GameRules::default());
        let epoch = engine.start();
        engine.tick(epoch, Duration::from_millis(4_550));
        let target = target_indices(&engine)[0];

        let outcome = engine.tile_click(target).unwrap();
        assert!(matches!(outcome, ClickOutcome::StageCleared { bonus: 204, .. }));
    }

    #[test]
    fn found_target_is_not_counted_twice() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let token = clear_stage(&mut engine);
        engine.advance(token);
        let token = clear_stage(&mut engine);
        engine.advance(token);
        let token = clear_stage(&mut engine);
        engine.advance(token);

        // stage 3 has two targets
        let targets = target_indices(&engine);
        assert_eq!(targets.len(), 2);
        assert_eq!(
            engine.tile_click(targets[0]),
            Ok(ClickOutcome::Found { remaining: 1 })
        );
        let score = engine.score();
        assert_eq!(engine.tile_click(targets[0]), Ok(ClickOutcome::NoChange));
        assert_eq!(engine.remaining_targets(), 1);
        assert_eq!(engine.found_targets(), 1);
        assert_eq!(engine.score(), score);
    }

    #[test]
    fn miss_costs_time_under_default_rules() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let miss = base_index(&engine);

        let outcome = engine.tile_click(miss).unwrap();
        assert_eq!(outcome, ClickOutcome::Missed);
        assert_eq!(outcome.feedback(), Some(Feedback::Incorrect));
        assert_eq!(engine.time_remaining(), 12 * SECOND);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.remaining_targets(), 1);
        assert_eq!(engine.phase(), GamePhase::InStage);
        assert_eq!(engine.stage_index(), 0);
    }

    #[test]
    fn miss_costs_points_under_score_rules() {
        let mut engine = engine(GameRules::score_penalty());
        engine.start();
        assert_eq!(engine.time_remaining(), 10 * SECOND);
        let token = clear_stage(&mut engine);
        engine.advance(token);
        let score = engine.score();
        assert_eq!(score, 100 + 100);

        let miss = base_index(&engine);
        assert_eq!(engine.tile_click(miss), Ok(ClickOutcome::Missed));
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.tile_click(miss), Ok(ClickOutcome::Missed));
        assert_eq!(engine.tile_click(miss), Ok(ClickOutcome::Missed));
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.time_remaining(), 10 * SECOND);
        assert_eq!(engine.phase(), GamePhase::InStage);
    }

    #[test]
    fn misses_that_drain_the_clock_fail_the_run() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let miss = base_index(&engine);

        for _ in 0..4 {
            assert_eq!(engine.tile_click(miss), Ok(ClickOutcome::Missed));
        }
        assert_eq!(engine.time_remaining(), 3 * SECOND);

        let outcome = engine.tile_click(miss).unwrap();
        assert!(matches!(outcome, ClickOutcome::TimedOut(_)));
        assert_eq!(engine.phase(), GamePhase::Failed);
        assert!(engine.high_scores().is_empty());
    }

    #[test]
    fn timeout_fails_and_records_stage_index() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let token = clear_stage(&mut engine);
        let epoch = match engine.advance(token) {
            AdvanceOutcome::StageStarted(epoch) => epoch,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(engine.tick(epoch, 10 * SECOND), TickOutcome::Running);
        assert_eq!(engine.tick(epoch, 5 * SECOND), TickOutcome::Expired);
        assert_eq!(engine.phase(), GamePhase::Failed);

        let summary = engine.last_run().unwrap();
        assert_eq!(summary.outcome, RunOutcome::Failed);
        assert_eq!(summary.score, 250);
        assert_eq!(summary.stage_reached, 1);
        assert_eq!(summary.high_score_rank, Some(0));
        assert_eq!(
            engine.high_scores().entries(),
            &[HighScoreEntry::new(250, 1)]
        );
    }

    #[test]
    fn zero_score_failure_leaves_board_alone() {
        let mut engine = engine(GameRules::default());
        let epoch = engine.start();

        assert_eq!(engine.tick(epoch, 15 * SECOND), TickOutcome::Expired);
        assert_eq!(engine.last_run().unwrap().stage_reached, 0);
        assert_eq!(engine.last_run().unwrap().high_score_rank, None);
        assert!(engine.high_scores().is_empty());
    }

    #[test]
    fn stale_ticks_do_not_touch_the_next_stage() {
        let mut engine = engine(GameRules::default());
        let first = engine.start();
        let token = clear_stage(&mut engine);
        engine.advance(token);

        assert_eq!(engine.tick(first, 14 * SECOND), TickOutcome::Stale);
        assert_eq!(engine.time_remaining(), 15 * SECOND);
    }

    #[test]
    fn stale_advance_after_leaving_is_ignored() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let token = clear_stage(&mut engine);
        engine.to_main_menu();

        assert_eq!(engine.advance(token), AdvanceOutcome::Stale);
        assert_eq!(engine.phase(), GamePhase::Idle);
        assert!(engine.grid().is_none());

        engine.start();
        assert_eq!(engine.advance(token), AdvanceOutcome::Stale);
        assert_eq!(engine.stage_index(), 0);
    }

    #[test]
    fn clearing_every_stage_ends_cleared() {
        let mut engine = engine(GameRules::default());
        engine.start();

        let mut expected_score = 0;
        let mut last = AdvanceOutcome::Stale;
        for (stage, config) in STANDARD_STAGES.iter().enumerate() {
            assert_eq!(engine.stage_index(), stage);
            assert_eq!(engine.grid().unwrap().side(), config.grid_size);
            expected_score += stage_bonus(config, 15 * SECOND);
            let token = clear_stage(&mut engine);
            assert_eq!(engine.score(), expected_score);
            last = engine.advance(token);
        }

        let AdvanceOutcome::Cleared(summary) = last else {
            panic!("unexpected {:?}", last);
        };
        assert_eq!(engine.phase(), GamePhase::Cleared);
        assert_eq!(engine.current_stage(), None);
        assert_eq!(summary.outcome, RunOutcome::Cleared);
        assert_eq!(summary.stage_reached, 9);
        assert_eq!(summary.score, expected_score);
        assert_eq!(
            engine.high_scores().best(),
            Some(HighScoreEntry::new(expected_score, 9))
        );
    }

    #[test]
    fn retry_resets_the_run() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let token = clear_stage(&mut engine);
        engine.advance(token);
        let epoch = engine.epoch();
        engine.tick(epoch, 20 * SECOND);
        assert_eq!(engine.phase(), GamePhase::Failed);

        engine.retry();
        assert_eq!(engine.phase(), GamePhase::InStage);
        assert_eq!(engine.stage_index(), 0);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.last_run(), None);
        assert_eq!(engine.high_scores().len(), 1);
    }

    #[test]
    fn rejects_out_of_range_click() {
        let mut engine = engine(GameRules::default());
        engine.start();
        assert_eq!(engine.tile_click(49), Err(GameError::InvalidCellIndex));
        assert!(!engine.is_found(49));
    }

    #[test]
    fn score_never_decreases_under_time_rules() {
        let mut engine = engine(GameRules::default());
        engine.start();
        let mut prev = engine.score();
        for _ in 0..STANDARD_STAGES.len() {
            let miss = base_index(&engine);
            engine.tile_click(miss).unwrap();
            assert!(engine.score() >= prev);
            let token = clear_stage(&mut engine);
            assert!(engine.score() >= prev);
            prev = engine.score();
            engine.advance(token);
        }
        assert_eq!(engine.phase(), GamePhase::Cleared);
    }

    #[test]
    fn rejects_rules_without_stage_time() {
        assert_eq!(GameRules::time_penalty().validate(), Ok(()));
        assert_eq!(GameRules::score_penalty().validate(), Ok(()));

        let rules = GameRules {
            stage_duration: Duration::ZERO,
            ..GameRules::default()
        };
        assert_eq!(rules.validate(), Err(GameError::InvalidStageDuration));
        assert!(matches!(
            GameEngine::new(Campaign::standard(), rules, 1, HighScores::new()),
            Err(GameError::InvalidStageDuration)
        ));
    }

    #[test]
    fn deserializing_rules_validates_them() {
        let json = serde_json::to_string(&GameRules::score_penalty()).unwrap();
        let rules: GameRules = serde_json::from_str(&json).unwrap();
        assert_eq!(rules, GameRules::score_penalty());

        let zero = GameRules {
            stage_duration: Duration::ZERO,
            ..GameRules::score_penalty()
        };
        let json = serde_json::to_string(&zero).unwrap();
        assert!(serde_json::from_str::<GameRules>(&json).is_err());
    }
}
