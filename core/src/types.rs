/// Single coordinate axis used for grid width/height and positions.
pub type Coord = u8;

/// Count type used for target counts, total-cell counts and flat cell indices.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// Points awarded over a run.
pub type Score = u32;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Maps a flat row-major index to coordinates on a square grid of side `side`.
pub const fn index_to_coords(index: CellCount, side: Coord) -> Coord2 {
    let side = side as CellCount;
    ((index / side) as Coord, (index % side) as Coord)
}

/// Inverse of [`index_to_coords`].
pub const fn coords_to_index((row, col): Coord2, side: Coord) -> CellCount {
    mult(row, side) + col as CellCount
}
