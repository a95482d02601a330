use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Campaign has no stages")]
    EmptyCampaign,
    #[error("Stage {stage} has an empty grid")]
    EmptyGrid { stage: usize },
    #[error("Stage {stage} has no targets")]
    NoTargets { stage: usize },
    #[error("Stage {stage} has too many targets, must be fewer than the cell count")]
    TooManyTargets { stage: usize },
    #[error("Stage {stage} color delta must be within 1..=100")]
    InvalidColorDelta { stage: usize },
    #[error("Stage duration must be longer than zero")]
    InvalidStageDuration,
    #[error("Invalid cell index")]
    InvalidCellIndex,
    #[error("Not in a stage, clicks are not accepted")]
    NotInStage,
}

pub type Result<T> = core::result::Result<T, GameError>;
