use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// One tile as the presentation layer sees it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub is_target: bool,
    pub color: Rgb,
}

/// Square grid of tiles, a handful of which are targets painted in the target color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    target_mask: Array2<bool>,
    target_count: CellCount,
    colors: ColorPair,
}

impl Grid {
    pub fn from_target_mask(target_mask: Array2<bool>, colors: ColorPair) -> Self {
        let target_count = target_mask
            .iter()
            .filter(|&&is_target| is_target)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self {
            target_mask,
            target_count,
            colors,
        }
    }

    pub fn from_target_indices(
        side: Coord,
        target_indices: impl IntoIterator<Item = CellCount>,
        colors: ColorPair,
    ) -> Result<Self> {
        let mut target_mask: Array2<bool> = Array2::default((side, side).to_nd_index());
        let total = mult(side, side);

        for index in target_indices {
            if index >= total {
                return Err(GameError::InvalidCellIndex);
            }
            target_mask[index_to_coords(index, side).to_nd_index()] = true;
        }

        Ok(Self::from_target_mask(target_mask, colors))
    }

    /// Cells per row and per column.
    pub fn side(&self) -> Coord {
        self.target_mask.nrows().try_into().unwrap_or(Coord::MAX)
    }

    pub fn total_cells(&self) -> CellCount {
        self.target_mask.len().try_into().unwrap_or(CellCount::MAX)
    }

    pub fn target_count(&self) -> CellCount {
        self.target_count
    }

    pub fn colors(&self) -> ColorPair {
        self.colors
    }

    pub fn validate_index(&self, index: CellCount) -> Result<CellCount> {
        if index < self.total_cells() {
            Ok(index)
        } else {
            Err(GameError::InvalidCellIndex)
        }
    }

    pub fn coords_of(&self, index: CellCount) -> Coord2 {
        index_to_coords(index, self.side())
    }

    /// # Panics
    ///
    /// If `index` is not below [`Grid::total_cells`], see [`Grid::get`] for
    /// the checked version.
    pub fn is_target(&self, index: CellCount) -> bool {
        self[index]
    }

    /// # Panics
    ///
    /// If `index` is out of range, like [`Grid::is_target`].
    pub fn color_at(&self, index: CellCount) -> Rgb {
        if self.is_target(index) {
            self.colors.target
        } else {
            self.colors.base
        }
    }

    /// # Panics
    ///
    /// If `index` is out of range, like [`Grid::is_target`].
    pub fn cell_at(&self, index: CellCount) -> Cell {
        Cell {
            is_target: self.is_target(index),
            color: self.color_at(index),
        }
    }

    pub fn get(&self, index: CellCount) -> Option<Cell> {
        let index = self.validate_index(index).ok()?;
        Some(self.cell_at(index))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.target_mask.iter().map(|&is_target| Cell {
            is_target,
            color: if is_target {
                self.colors.target
            } else {
                self.colors.base
            },
        })
    }

    pub fn target_indices(&self) -> impl Iterator<Item = CellCount> + '_ {
        self.target_mask
            .iter()
            .enumerate()
            .filter(|&(_, &is_target)| is_target)
            .map(|(index, _)| index as CellCount)
    }
}

/// Target flag of a row-major cell index, panics past the last cell.
impl Index<CellCount> for Grid {
    type Output = bool;

    fn index(&self, index: CellCount) -> &Self::Output {
        &self.target_mask[self.coords_of(index).to_nd_index()]
    }
}
