use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

/// Builds the mine layout for a fresh game. Invoked once, on the first
/// reveal, so the layout can be arranged around the clicked cell.
pub trait MinefieldGenerator {
    fn generate(self, config: GameConfig, first_reveal: Coord2) -> Minefield;
}

/// How much of the area around the first-revealed cell stays mine-free.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SafeZone {
    /// Only the clicked cell is guaranteed mine-free.
    ClickedOnly,
    /// The clicked cell and its up-to-8 neighbors are mine-free, so the
    /// first reveal always flood-fills.
    Neighborhood,
}

impl Default for SafeZone {
    fn default() -> Self {
        Self::Neighborhood
    }
}
