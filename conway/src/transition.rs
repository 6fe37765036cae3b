// transition.rs - Next-generation computation (B3/S23, bounded grid)
//
// Every output row depends only on the input grid, so rows can be computed in
// any order and on any thread. Both strategies fill the same row-major buffer.

use rayon::prelude::*;

use crate::grid::GridState;

/// Cell count at which rows are fanned out across the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

// Neighbor offsets; anything outside the grid counts as dead.
#[rustfmt::skip]
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel,
}

impl Strategy {
    pub fn for_grid(grid: &GridState, threshold: usize) -> Self {
        if grid.cell_count() >= threshold {
            Strategy::Parallel
        } else {
            Strategy::Sequential
        }
    }
}

pub fn next_generation(grid: &GridState) -> GridState {
    next_generation_auto(grid, DEFAULT_PARALLEL_THRESHOLD)
}

pub fn next_generation_auto(grid: &GridState, threshold: usize) -> GridState {
    next_generation_with(grid, Strategy::for_grid(grid, threshold))
}

pub fn next_generation_with(grid: &GridState, strategy: Strategy) -> GridState {
    let cols = grid.cols();
    let mut cells = vec![false; grid.cell_count()];

    match strategy {
        Strategy::Sequential => cells
            .chunks_mut(cols)
            .enumerate()
            .for_each(|(row, out)| process_row(grid, row, out)),
        // Each worker owns one output row; no two workers touch the same cell.
        Strategy::Parallel => cells
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(row, out)| process_row(grid, row, out)),
    }

    GridState::from_parts(grid.rows(), cols, cells)
}

/// Writes generation N+1 of `row` into `out`.
fn process_row(grid: &GridState, row: usize, out: &mut [bool]) {
    for (col, cell) in out.iter_mut().enumerate() {
        let count = live_neighbors(grid, row, col);
        let current_alive = grid.get(row, col).unwrap_or(false);

        *cell = match (current_alive, count) {
            (true, 2) | (true, 3) => true, // Survival
            (false, 3) => true,            // Birth
            _ => false,                    // Death or stays dead
        };
    }
}

fn live_neighbors(grid: &GridState, row: usize, col: usize) -> u8 {
    let mut count = 0;
    for &(dr, dc) in &NEIGHBORS {
        let (Some(nr), Some(nc)) = (row.checked_add_signed(dr), col.checked_add_signed(dc)) else {
            continue;
        };
        if grid.get(nr, nc) == Some(true) {
            count += 1;
        }
    }
    count
}
