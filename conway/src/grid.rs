// grid.rs - Grid state for Conway's Game of Life boards

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};
use crate::transition;

/// Transport form of a grid: rows outer, columns inner.
pub type TRow = Vec<bool>;
pub type TGrid = Vec<TRow>;

/// BLAKE3 digest of a grid's dimensions and cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

/// Rectangular boolean matrix, stored row-major.
///
/// Dimensions are fixed at construction and never zero. The only way in from
/// the outside is [`GridState::from_rows`] (or serde, which goes through it),
/// so every instance is well formed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TGrid", into = "TGrid")]
pub struct GridState {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl GridState {
    /// Builds a grid from its row-major transport form.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> BoardResult<Self> {
        let first = rows
            .first()
            .ok_or_else(|| BoardError::MalformedGrid("grid has no rows".to_string()))?;
        let cols = first.as_ref().len();
        if cols == 0 {
            return Err(BoardError::MalformedGrid("grid rows are empty".to_string()));
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(BoardError::MalformedGrid(format!(
                    "row {index} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            cells.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    /// All-dead grid of the given size.
    pub fn dead(rows: usize, cols: usize) -> BoardResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::MalformedGrid(format!(
                "grid dimensions must be positive, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        })
    }

    /// Caller guarantees `cells.len() == rows * cols` with both non-zero.
    pub(crate) fn from_parts(rows: usize, cols: usize, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    pub fn to_rows(&self) -> TGrid {
        self.cells.chunks(self.cols).map(<[bool]>::to_vec).collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// `None` when `(row, col)` lies outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Out-of-bounds writes are ignored.
    pub(crate) fn set(&mut self, row: usize, col: usize, alive: bool) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = alive;
        }
    }

    pub fn live_cells(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Stable content hash used for equality and cycle detection.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.rows as u32).to_le_bytes());
        hasher.update(&(self.cols as u32).to_le_bytes());
        let packed: Vec<u8> = self.cells.iter().map(|&alive| alive as u8).collect();
        hasher.update(&packed);
        Fingerprint(*hasher.finalize().as_bytes())
    }

    /// Next generation, choosing the strategy by size.
    pub fn next_generation(&self) -> GridState {
        transition::next_generation(self)
    }
}

impl TryFrom<TGrid> for GridState {
    type Error = BoardError;

    fn try_from(rows: TGrid) -> Result<Self, Self::Error> {
        GridState::from_rows(&rows)
    }
}

impl From<GridState> for TGrid {
    fn from(grid: GridState) -> Self {
        grid.to_rows()
    }
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols) {
            let line: String = row.iter().map(|&alive| if alive { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridState")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("live", &self.live_cells())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
