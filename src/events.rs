use serde::{Deserialize, Serialize};

use crate::{Coord2, GameState};

/// Everything a renderer needs to redraw a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub revealed: bool,
    pub flagged: bool,
    pub mine: bool,
    pub neighbor_mines: u8,
}

/// Change notification produced by [`Board`](crate::Board) mutations.
///
/// Events are buffered inside the board and drained by the presentation
/// layer after each interaction. Rejected operations produce no events.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BoardEvent {
    /// A single cell changed (revealed, flag toggled, or exposed at game end).
    CellChanged {
        coords: Coord2,
        cell: CellSnapshot,
    },
    /// The game state advanced. Fired once per transition.
    StateChanged(GameState),
    /// The flag count changed, so the mine-counter display is stale.
    MinesLeftChanged(isize),
}
