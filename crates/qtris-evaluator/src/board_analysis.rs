use std::{cell::OnceCell, iter};

use qtris_engine::Board;

/// Lazily computed metrics of one settled board.
///
/// Each metric is computed on first access and memoized, so reward terms that
/// share a metric (or do not need it at all) pay for it at most once.
#[derive(Debug)]
pub struct BoardAnalysis {
    board: Board,
    column_heights: OnceCell<Vec<usize>>,
    column_occupied_cells: OnceCell<Vec<usize>>,
    max_height: OnceCell<usize>,
    num_holes: OnceCell<usize>,
    surface_bumpiness: OnceCell<usize>,
}

impl BoardAnalysis {
    #[must_use]
    pub fn new(board: Board) -> Self {
        Self {
            board,
            column_heights: OnceCell::new(),
            column_occupied_cells: OnceCell::new(),
            max_height: OnceCell::new(),
            num_holes: OnceCell::new(),
            surface_bumpiness: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn column_heights(&self) -> &[usize] {
        self.column_heights
            .get_or_init(|| self.board.column_heights())
    }

    #[must_use]
    pub fn column_occupied_cells(&self) -> &[usize] {
        self.column_occupied_cells.get_or_init(|| {
            (0..self.board.width())
                .map(|col| {
                    (0..self.board.height())
                        .filter(|&row| !self.board.cell(row, col).is_empty())
                        .count()
                })
                .collect()
        })
    }

    #[must_use]
    pub fn max_height(&self) -> usize {
        *self
            .max_height
            .get_or_init(|| self.column_heights().iter().copied().max().unwrap_or(0))
    }

    /// Empty cells below the top of their column.
    #[must_use]
    pub fn num_holes(&self) -> usize {
        *self.num_holes.get_or_init(|| {
            iter::zip(self.column_heights(), self.column_occupied_cells())
                .map(|(h, occ)| h - occ)
                .sum()
        })
    }

    #[must_use]
    pub fn surface_bumpiness(&self) -> usize {
        *self.surface_bumpiness.get_or_init(|| {
            self.column_heights()
                .windows(2)
                .map(|w| w[0].abs_diff(w[1]))
                .sum()
        })
    }
}
