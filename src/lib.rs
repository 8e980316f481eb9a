//! Board-state engine for a browser minesweeper.
//!
//! The crate owns the grid, the mine layout and the reveal/flag state, and
//! exposes a narrow mutation API plus a change-notification stream. Anything
//! visual (DOM, audio, animation) lives in the presentation layer, which
//! drives the engine through [`Board`] and redraws from [`BoardEvent`]s.
//!
//! Mines are placed lazily on the first reveal so that the first click can
//! never lose. See [`Board::reveal`] and [`RandomMinefieldGenerator`].

use std::ops::Index;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use coloring::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use generator::*;
pub use tile::*;
pub use types::*;

mod coloring;
mod engine;
mod error;
mod events;
mod generator;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validated construction. Rejects empty boards and boards where the
    /// mines would not leave a single safe cell.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        if mines >= mult(size.0, size.1) {
            return Err(GameError::TooManyMines);
        }
        Ok(Self::new_unchecked(size, mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.size.0 && coords.1 < self.size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}

/// Where the mines are, plus the per-cell adjacency counts.
///
/// Adjacency counts are computed once, when the layout is built, and never
/// change afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minefield {
    mine_mask: Array2<bool>,
    counts: Array2<u8>,
    mine_count: CellCount,
}

impl Minefield {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();

        let dim = mine_mask.dim();
        let size: Coord2 = (dim.0.try_into().unwrap(), dim.1.try_into().unwrap());
        let mut counts: Array2<u8> = Array2::default(size.to_nd_index());
        for x in 0..size.0 {
            for y in 0..size.1 {
                let adjacent = neighbors((x, y), size)
                    .filter(|&pos| mine_mask[pos.to_nd_index()])
                    .count();
                counts[(x, y).to_nd_index()] = adjacent.try_into().unwrap();
            }
        }

        Self {
            mine_mask,
            counts,
            mine_count,
        }
    }

    /// Builds a layout from explicit mine positions. An empty list is legal
    /// and yields a trivially winnable board.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            size: self.size(),
            mines: self.mine_count,
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mine_mask.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    /// Precomputed count of mines among the cell's grid neighbors.
    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.counts[coords.to_nd_index()]
    }
}

impl Index<Coord2> for Minefield {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

/// Outcome of a flag toggle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

/// Outcome of revealing a cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}
