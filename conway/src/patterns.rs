// patterns.rs - Well-known seed patterns and a reproducible random fill

use crate::error::BoardResult;
use crate::grid::GridState;

/// Live cells as `(row, col)` offsets from the pattern's top-left corner.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

impl Pattern {
    /// Bounding box as `(height, width)`.
    pub fn extent(&self) -> (usize, usize) {
        self.cells
            .iter()
            .fold((0, 0), |(h, w), &(r, c)| (h.max(r + 1), w.max(c + 1)))
    }
}

#[rustfmt::skip]
pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top section
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            // Bottom section (mirrored)
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(1, 1), (1, 2), (0, 2), (2, 1), (2, 0)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (4, 0), (4, 1), (5, 0), (5, 1),
            (4, 10), (5, 10), (6, 10), (3, 11), (7, 11), (2, 12), (8, 12),
            (2, 13), (8, 13), (5, 14), (3, 15), (7, 15), (4, 16), (5, 16),
            (6, 16), (5, 17), (2, 20), (3, 20), (4, 20), (2, 21), (3, 21),
            (4, 21), (1, 22), (5, 22), (0, 24), (1, 24), (5, 24), (6, 24),
            (2, 34), (3, 34), (2, 35), (3, 35),
        ],
    },
];

/// Case-insensitive lookup; `-`, `_` and spaces are interchangeable.
pub fn find_pattern(name: &str) -> Option<&'static Pattern> {
    let wanted = normalize(name);
    PATTERNS.iter().find(|p| normalize(p.name) == wanted)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Centres `pattern` on a dead `rows` x `cols` grid. Cells that do not fit are
/// dropped.
pub fn apply_pattern(rows: usize, cols: usize, pattern: &Pattern) -> BoardResult<GridState> {
    let mut grid = GridState::dead(rows, cols)?;
    let (height, width) = pattern.extent();
    let top = rows.saturating_sub(height) / 2;
    let left = cols.saturating_sub(width) / 2;

    for &(row, col) in pattern.cells {
        grid.set(top + row, left + col, true);
    }
    Ok(grid)
}

/// Roughly a third of the cells alive, fully determined by `seed_value`.
pub fn apply_random_pattern(rows: usize, cols: usize, seed_value: u64) -> BoardResult<GridState> {
    let mut grid = GridState::dead(rows, cols)?;

    // Simple pseudo-random generator
    let digest = blake3::hash(&seed_value.to_le_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    let mut seed = u64::from_le_bytes(bytes);

    for row in 0..rows {
        for col in 0..cols {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            grid.set(row, col, (seed >> 16) % 3 == 0);
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_separators() {
        assert_eq!(find_pattern("r_pentomino").map(|p| p.name), Some("R-pentomino"));
        assert_eq!(find_pattern("GOSPER-GLIDER-GUN").map(|p| p.name), Some("Gosper Glider Gun"));
        assert!(find_pattern("spaceship").is_none());
    }

    #[test]
    fn blinker_is_centred() {
        let blinker = find_pattern("blinker").unwrap();
        let grid = apply_pattern(3, 3, blinker).unwrap();
        assert_eq!(
            grid.to_rows(),
            vec![
                vec![false, false, false],
                vec![true, true, true],
                vec![false, false, false],
            ]
        );
    }

    #[test]
    fn oversized_pattern_is_clipped() {
        let gun = find_pattern("gosper glider gun").unwrap();
        let grid = apply_pattern(5, 5, gun).unwrap();
        assert!(grid.live_cells() < gun.cells.len());
    }

    #[test]
    fn every_pattern_fits_its_extent() {
        for pattern in PATTERNS {
            let (height, width) = pattern.extent();
            let grid = apply_pattern(height, width, pattern).unwrap();
            assert_eq!(grid.live_cells(), pattern.cells.len(), "{}", pattern.name);
        }
    }

    #[test]
    fn random_fill_is_reproducible() {
        let a = apply_random_pattern(20, 30, 7).unwrap();
        let b = apply_random_pattern(20, 30, 7).unwrap();
        let c = apply_random_pattern(20, 30, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert!(a.live_cells() > 0 && a.live_cells() < a.cell_count());
    }
}
