use serde::{Deserialize, Serialize};

/// Player-visible state of one grid cell.
///
/// `Exploded`, `Mine` and `WrongFlag` only appear once the game has ended:
/// the triggered mine, the remaining unflagged mines, and flags that turned
/// out to be wrong.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tile {
    Hidden,
    Open(u8),
    Flagged,
    Exploded,
    Mine,
    WrongFlag,
}

impl Tile {
    /// Whether the tile shows its contents to the player, including mines
    /// exposed at game end.
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Open(_) | Self::Exploded | Self::Mine)
    }

    /// Whether the tile is drawn with a flag, including flags called out as
    /// wrong at game end.
    pub const fn shows_flag(self) -> bool {
        matches!(self, Self::Flagged | Self::WrongFlag)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::Hidden
    }
}
