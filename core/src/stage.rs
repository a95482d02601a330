use core::ops::Index;
use serde::{Deserialize, Serialize};

use crate::*;

/// Largest accepted color delta, the stage bonus multiplier stays positive up to here.
pub const MAX_COLOR_DELTA: u8 = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Cells per row and per column.
    pub grid_size: Coord,
    pub target_count: CellCount,
    /// Color difference between base and target, smaller is harder.
    pub color_delta: u8,
}

impl StageConfig {
    pub const fn new(grid_size: Coord, target_count: CellCount, color_delta: u8) -> Self {
        Self {
            grid_size,
            target_count,
            color_delta,
        }
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.grid_size, self.grid_size)
    }

    /// `stage` is only used to label the error.
    pub fn validate(&self, stage: usize) -> Result<()> {
        if self.grid_size == 0 {
            return Err(GameError::EmptyGrid { stage });
        }
        if self.target_count == 0 {
            return Err(GameError::NoTargets { stage });
        }
        if self.target_count >= self.total_cells() {
            return Err(GameError::TooManyTargets { stage });
        }
        if self.color_delta == 0 || self.color_delta > MAX_COLOR_DELTA {
            return Err(GameError::InvalidColorDelta { stage });
        }
        Ok(())
    }
}

/// The shipped campaign, ordered by difficulty.
pub const STANDARD_STAGES: [StageConfig; 9] = [
    StageConfig::new(7, 1, 100),
    StageConfig::new(8, 1, 90),
    StageConfig::new(9, 1, 80),
    StageConfig::new(7, 2, 70),
    StageConfig::new(8, 2, 60),
    StageConfig::new(9, 2, 50),
    StageConfig::new(7, 3, 40),
    StageConfig::new(8, 3, 25),
    StageConfig::new(9, 3, 10),
];

/// Validated, non-empty sequence of stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StageConfig>", into = "Vec<StageConfig>")]
pub struct Campaign {
    stages: Vec<StageConfig>,
}

impl Campaign {
    pub fn new(stages: Vec<StageConfig>) -> Result<Self> {
        if stages.is_empty() {
            return Err(GameError::EmptyCampaign);
        }
        for (stage, config) in stages.iter().enumerate() {
            config.validate(stage)?;
        }
        Ok(Self { stages })
    }

    pub fn standard() -> Self {
        Self {
            stages: STANDARD_STAGES.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, stage: usize) -> Option<&StageConfig> {
        self.stages.get(stage)
    }

    pub fn stages(&self) -> &[StageConfig] {
        &self.stages
    }
}

impl Default for Campaign {
    fn default() -> Self {
        Self::standard()
    }
}

impl Index<usize> for Campaign {
    type Output = StageConfig;

    fn index(&self, stage: usize) -> &Self::Output {
        &self.stages[stage]
    }
}

impl TryFrom<Vec<StageConfig>> for Campaign {
    type Error = GameError;

    fn try_from(stages: Vec<StageConfig>) -> Result<Self> {
        Self::new(stages)
    }
}

impl From<Campaign> for Vec<StageConfig> {
    fn from(campaign: Campaign) -> Self {
        campaign.stages
    }
}
