//! The mineless "Enhanced" variant: every press either reveals a tile or
//! cycles its color. There are no mines and no win condition, only a
//! revealed-tiles counter; a game is reset by recreating the board.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{CellCount, Coord2, GameError, Result, ToNdIndex};

/// Number of color states a revealed tile cycles through.
pub const COLOR_STATES: u8 = 6;

/// One tile of the coloring board. `color` is 0 while hidden and 1..=6 once
/// revealed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorTile {
    pub revealed: bool,
    pub color: u8,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PressOutcome {
    /// Hidden tile was revealed with the first color.
    Revealed,
    /// Already-revealed tile advanced to the next color.
    Recolored,
}

/// Change notification produced by [`ColorBoard`] presses.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColorEvent {
    TileChanged { coords: Coord2, tile: ColorTile },
    RevealedCountChanged(CellCount),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorBoard {
    grid: Array2<ColorTile>,
    revealed_count: CellCount,
    #[serde(skip)]
    events: Vec<ColorEvent>,
}

impl ColorBoard {
    pub fn new(size: Coord2) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        Ok(Self {
            grid: Array2::default(size.to_nd_index()),
            revealed_count: 0,
            events: Vec::new(),
        })
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.grid.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn tile_at(&self, coords: Coord2) -> ColorTile {
        self.grid[coords.to_nd_index()]
    }

    pub fn drain_events(&mut self) -> Vec<ColorEvent> {
        std::mem::take(&mut self.events)
    }

    /// First press reveals the tile, every following press cycles its color
    /// through 1..=6 and wraps around.
    pub fn press(&mut self, coords: Coord2) -> Result<PressOutcome> {
        let size = self.size();
        if coords.0 >= size.0 || coords.1 >= size.1 {
            return Err(GameError::InvalidCoords);
        }

        let tile = &mut self.grid[coords.to_nd_index()];
        let outcome = if tile.revealed {
            tile.color = tile.color % COLOR_STATES + 1;
            PressOutcome::Recolored
        } else {
            tile.revealed = true;
            tile.color = 1;
            self.revealed_count += 1;
            PressOutcome::Revealed
        };

        let tile = *tile;
        self.events.push(ColorEvent::TileChanged { coords, tile });
        if outcome == PressOutcome::Revealed {
            self.events
                .push(ColorEvent::RevealedCountChanged(self.revealed_count));
        }
        Ok(outcome)
    }
}
