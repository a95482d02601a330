//! Game logic for Chroma Seek: find the tiles whose color is slightly off, stage after stage, before the clock runs
//! out.
//!
//! Nothing in here touches the DOM or any timer. Hosts feed clicks and elapsed time into a [`GameEngine`] and render
//! whatever it exposes.

pub use color::*;
pub use countdown::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use highscore::*;
pub use scoring::*;
pub use stage::*;
pub use types::*;

mod color;
mod countdown;
mod engine;
mod error;
mod generator;
mod grid;
mod highscore;
mod scoring;
mod stage;
mod types;
