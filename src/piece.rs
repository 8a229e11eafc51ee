//! Piece model: the seven tetromino shapes and the matrix rotation used for every orientation.

/// Tetromino kinds (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Pool used when S and Z are switched off.
    pub const WITHOUT_S_Z: [Self; 5] = [Self::I, Self::O, Self::T, Self::L, Self::J];

    /// Spawn orientation of this kind.
    pub fn shape(self) -> Shape {
        shape_cells(self)
    }
}

/// Occupancy matrix of a piece. `rows[y][x]` is true where the piece has a block.
///
/// Always rectangular; width and height are read off the rows, so they follow the
/// matrix through every rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    /// Build from 0/1 rows. Rows must have equal length.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        debug_assert!(
            rows.windows(2).all(|pair| pair[0].len() == pair[1].len()),
            "shape rows must all have the same length"
        );
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&v| v != 0).collect())
                .collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_filled(&self, col: usize, row: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Occupied cells as (col, row) offsets from the top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, r)| {
            r.iter()
                .enumerate()
                .filter(|&(_, &filled)| filled)
                .map(move |(col, _)| (col, row))
        })
    }

    pub fn rotated(&self) -> Self {
        rotate(self)
    }
}

/// Hand-authored spawn matrix for each kind. All orientations derive from these.
pub fn shape_cells(kind: TetrominoKind) -> Shape {
    match kind {
        TetrominoKind::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
        TetrominoKind::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
        TetrominoKind::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1]]),
        TetrominoKind::L => Shape::from_rows(&[&[1, 0], &[1, 0], &[1, 1]]),
        TetrominoKind::J => Shape::from_rows(&[&[0, 1], &[0, 1], &[1, 1]]),
        TetrominoKind::S => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
        TetrominoKind::Z => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
    }
}

/// Quarter turn clockwise: reverse the row order, then transpose.
/// A `h × w` matrix becomes `w × h`.
pub fn rotate(shape: &Shape) -> Shape {
    let (w, h) = (shape.width(), shape.height());
    let rows = (0..w)
        .map(|r| (0..h).map(|c| shape.is_filled(r, h - 1 - c)).collect())
        .collect();
    Shape { rows }
}
