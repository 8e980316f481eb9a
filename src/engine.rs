use std::collections::{HashSet, VecDeque};

use chrono::prelude::*;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Ready -> Playing (first successful reveal)
/// - Ready -> Won | Lost (game decided by the very first reveal)
/// - Playing -> Won | Lost
///
/// `Won` and `Lost` are terminal; a finished board is replaced, never reset.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameState {
    /// Created, no move taken, mines not placed yet
    Ready,
    /// First move taken, game running
    Playing,
    /// Game ended and the player won
    Won,
    /// Game ended and the player lost
    Lost,
}

impl GameState {
    /// Indicates no move has been taken yet
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Indicates the game has ended and no moves are accepted anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Ready
    }
}

/// Represents one game from creation to win or loss.
///
/// The mine layout is not chosen at construction: it is generated by the
/// first [`reveal`](Board::reveal), with a safe zone around the clicked
/// cell, so the first move can never hit a mine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: GameConfig,
    minefield: Option<Minefield>,
    grid: Array2<Tile>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    state: GameState,
    safe_zone: SafeZone,
    seed: u64,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<BoardEvent>,
}

impl Board {
    /// New board with a randomly seeded layout and the default safe zone.
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_seed(config, rand::rng().random(), SafeZone::default())
    }

    /// New board with explicit generation seed and safe-zone policy. The
    /// same seed, policy and first reveal reproduce the same layout.
    pub fn with_seed(config: GameConfig, seed: u64, safe_zone: SafeZone) -> Result<Self> {
        let config = GameConfig::new(config.size, config.mines)?;
        if config.mines == 0 {
            return Err(GameError::NoMines);
        }

        Ok(Self {
            config,
            minefield: None,
            grid: Array2::default(config.size.to_nd_index()),
            revealed_count: 0,
            flagged_count: 0,
            state: Default::default(),
            safe_zone,
            seed,
            started_at: None,
            ended_at: None,
            events: Vec::new(),
        })
    }

    /// Board over a pre-built layout. Used for replays and tests; mines are
    /// already in place, so the first reveal is not protected.
    pub fn from_minefield(minefield: Minefield) -> Self {
        let config = minefield.game_config();
        Self {
            config,
            grid: Array2::default(config.size.to_nd_index()),
            minefield: Some(minefield),
            revealed_count: 0,
            flagged_count: 0,
            state: Default::default(),
            safe_zone: SafeZone::default(),
            seed: 0,
            started_at: None,
            ended_at: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    /// None until the first reveal has placed the mines.
    pub fn minefield(&self) -> Option<&Minefield> {
        self.minefield.as_ref()
    }

    pub fn tile_at(&self, coords: Coord2) -> Tile {
        self.grid[coords.to_nd_index()]
    }

    /// Everything the presentation layer needs to draw one cell.
    pub fn snapshot_at(&self, coords: Coord2) -> CellSnapshot {
        let tile = self.grid[coords.to_nd_index()];
        let (mine, neighbor_mines) = match &self.minefield {
            Some(field) => (field.contains_mine(coords), field.adjacent_mine_count(coords)),
            None => (false, 0),
        };
        CellSnapshot {
            revealed: tile.is_revealed(),
            flagged: tile.shows_flag(),
            mine,
            neighbor_mines,
        }
    }

    /// How many mines are not flagged yet. Negative when over-flagged;
    /// that is display semantics, not an error.
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flagged_count as isize)
    }

    /// Seconds since the first reveal, frozen at game end, 0 before the
    /// first move. Pure read; the 1s display tick lives outside the engine.
    pub fn elapsed_secs(&self) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.ended_at.unwrap_or_else(Utc::now) - started_at)
                .num_seconds()
                .max(0) as u32
        } else {
            0
        }
    }

    /// Takes the change notifications buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Flags or unflags a hidden cell. No-op on open cells and on finished
    /// games; flagging is allowed before the first reveal.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use MarkOutcome::*;
        use Tile::*;

        let coords = self.config.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(NoChange);
        }

        Ok(match self.grid[coords.to_nd_index()] {
            Hidden => {
                self.grid[coords.to_nd_index()] = Flagged;
                self.flagged_count += 1;
                self.emit_cell(coords);
                self.emit_mines_left();
                Changed
            }
            Flagged => {
                self.grid[coords.to_nd_index()] = Hidden;
                self.flagged_count -= 1;
                self.emit_cell(coords);
                self.emit_mines_left();
                Changed
            }
            _ => NoChange,
        })
    }

    /// Reveals a hidden cell. The first call places the mines. Flagged and
    /// already-open cells are left alone, as is a finished game.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.config.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(RevealOutcome::NoChange);
        }

        if !matches!(self.grid[coords.to_nd_index()], Tile::Hidden) {
            return Ok(RevealOutcome::NoChange);
        }

        if self.minefield.is_none() {
            let generator = RandomMinefieldGenerator::new(self.seed, self.safe_zone);
            self.minefield = Some(generator.generate(self.config, coords));
        }

        Ok(self.reveal_tile(coords))
    }

    fn mine_at(&self, coords: Coord2) -> bool {
        self.field().contains_mine(coords)
    }

    fn count_at(&self, coords: Coord2) -> u8 {
        self.field().adjacent_mine_count(coords)
    }

    fn field(&self) -> &Minefield {
        self.minefield
            .as_ref()
            .expect("mines are placed before any tile is revealed")
    }

    /// Opens a single hidden tile and flood-fills from it when its count is
    /// zero. The fill is an explicit worklist, not recursion, so deep zero
    /// regions cannot blow the stack.
    fn reveal_tile(&mut self, coords: Coord2) -> RevealOutcome {
        use RevealOutcome::*;

        if self.mine_at(coords) {
            self.grid[coords.to_nd_index()] = Tile::Exploded;
            self.emit_cell(coords);
            self.end_game(false);
            return HitMine;
        }

        let count = self.count_at(coords);
        self.grid[coords.to_nd_index()] = Tile::Open(count);
        self.revealed_count += 1;
        self.emit_cell(coords);
        log::debug!("opened tile at {:?}, mine count: {}", coords, count);

        if count == 0 {
            let mut visited = HashSet::from([coords]);
            let mut to_visit: VecDeque<_> = self
                .neighbors(coords)
                .filter(|&pos| matches!(self.grid[pos.to_nd_index()], Tile::Hidden))
                .collect();
            log::trace!(
                "starting flood-fill from {:?}, initial neighbors: {:?}",
                coords,
                to_visit
            );

            while let Some(visit_coords) = to_visit.pop_front() {
                if !visited.insert(visit_coords) {
                    continue;
                }

                // skip flagged or already opened tiles
                if !matches!(self.grid[visit_coords.to_nd_index()], Tile::Hidden) {
                    continue;
                }

                let visit_count = self.count_at(visit_coords);
                self.grid[visit_coords.to_nd_index()] = Tile::Open(visit_count);
                self.revealed_count += 1;
                self.emit_cell(visit_coords);
                log::trace!(
                    "flood opened tile at {:?}, mine count: {}",
                    visit_coords,
                    visit_count
                );

                // only zero tiles propagate the fill further
                if visit_count == 0 {
                    to_visit.extend(
                        self.neighbors(visit_coords)
                            .filter(|&pos| matches!(self.grid[pos.to_nd_index()], Tile::Hidden))
                            .filter(|pos| !visited.contains(pos)),
                    );
                }
            }
        }

        if self.revealed_count == self.field().safe_cell_count() {
            self.end_game(true);
            Won
        } else {
            self.mark_started();
            Revealed
        }
    }

    /// First successful reveal starts the clock.
    fn mark_started(&mut self) {
        if matches!(self.state, GameState::Ready) {
            let now = Utc::now();
            log::debug!("game started at {}", now);
            self.started_at.replace(now);
            self.state = GameState::Playing;
            self.events.push(BoardEvent::StateChanged(self.state));
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }

        let now = Utc::now();
        self.ended_at.replace(now);
        if self.started_at.is_none() {
            // decided by the very first move
            self.started_at.replace(now);
        }
        log::debug!("game ended at {}, won: {}", now, won);

        self.expose_mines(won);
        self.state = if won { GameState::Won } else { GameState::Lost };
        self.events.push(BoardEvent::StateChanged(self.state));
    }

    /// Fixes up the grid for the end screen: on a win the leftover mines get
    /// flagged for the player, on a loss every mine and wrong flag is shown.
    fn expose_mines(&mut self, won: bool) {
        use Tile::*;

        let flagged_before = self.flagged_count;
        let (x_end, y_end) = self.config.size;
        for x in 0..x_end {
            for y in 0..y_end {
                let coords = (x, y);
                let tile = self.grid[coords.to_nd_index()];
                match (self.mine_at(coords), tile) {
                    (true, Hidden) => {
                        if won {
                            self.grid[coords.to_nd_index()] = Flagged;
                            self.flagged_count += 1;
                        } else {
                            self.grid[coords.to_nd_index()] = Mine;
                        }
                        self.emit_cell(coords);
                    }
                    (false, Flagged) if !won => {
                        self.grid[coords.to_nd_index()] = WrongFlag;
                        self.emit_cell(coords);
                    }
                    _ => {}
                }
            }
        }

        if self.flagged_count != flagged_before {
            self.emit_mines_left();
        }
    }

    fn neighbors(&self, coords: Coord2) -> impl Iterator<Item = Coord2> {
        neighbors(coords, self.config.size)
    }

    fn emit_cell(&mut self, coords: Coord2) {
        let cell = self.snapshot_at(coords);
        self.events.push(BoardEvent::CellChanged { coords, cell });
    }

    fn emit_mines_left(&mut self) {
        self.events
            .push(BoardEvent::MinesLeftChanged(self.mines_left()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forced(size: Coord2, mines: &[Coord2]) -> Board {
        Board::from_minefield(Minefield::from_mine_coords(size, mines).unwrap())
    }

    #[test]
    fn new_board_starts_ready_with_no_mines_placed() {
        let board = Board::new(GameConfig::new_unchecked((9, 9), 10)).unwrap();

        assert_eq!(board.state(), GameState::Ready);
        assert!(board.minefield().is_none());
        assert_eq!(board.revealed_count(), 0);
        assert_eq!(board.mines_left(), 10);
        assert_eq!(board.elapsed_secs(), 0);
    }

    #[test]
    fn board_construction_validates_the_config() {
        assert_eq!(
            Board::new(GameConfig::new_unchecked((9, 9), 81)),
            Err(GameError::TooManyMines)
        );
        assert_eq!(
            Board::new(GameConfig::new_unchecked((9, 9), 0)),
            Err(GameError::NoMines)
        );
        assert_eq!(
            Board::new(GameConfig::new_unchecked((0, 9), 1)),
            Err(GameError::EmptyBoard)
        );
    }

    #[test]
    fn first_reveal_places_mines_outside_the_safe_zone() {
        for seed in 0..25 {
            let mut board =
                Board::with_seed(GameConfig::new_unchecked((9, 9), 30), seed, SafeZone::Neighborhood)
                    .unwrap();

            let outcome = board.reveal((4, 4)).unwrap();
            let field = board.minefield().expect("mines placed by first reveal");

            assert_eq!(field.mine_count(), 30);
            assert_ne!(outcome, RevealOutcome::HitMine, "seed {seed} lost on first move");
            assert!(!field.contains_mine((4, 4)));
            for pos in neighbors((4, 4), (9, 9)) {
                assert!(!field.contains_mine(pos));
            }
            assert_eq!(board.tile_at((4, 4)), Tile::Open(0));
        }
    }

    #[test]
    fn revealing_a_mine_loses_and_exposes_the_rest() {
        let mut board = forced((3, 3), &[(0, 0), (2, 2)]);
        board.toggle_flag((0, 0)).unwrap();
        board.toggle_flag((1, 1)).unwrap();

        let outcome = board.reveal((2, 2)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(board.state(), GameState::Lost);
        assert_eq!(board.tile_at((2, 2)), Tile::Exploded);
        // correctly flagged mine stays a flag, wrong flag is called out
        assert_eq!(board.tile_at((0, 0)), Tile::Flagged);
        assert_eq!(board.tile_at((1, 1)), Tile::WrongFlag);
    }

    #[test]
    fn flood_fill_stops_at_the_numbered_border() {
        // wall of mines down column 2 splits the board in two
        let wall = [(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)];
        let mut board = forced((5, 5), &wall);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(board.state(), GameState::Playing);
        for y in 0..5 {
            assert_eq!(board.tile_at((0, y)), Tile::Open(0));
            assert!(matches!(board.tile_at((1, y)), Tile::Open(n) if n > 0));
            assert_eq!(board.tile_at((3, y)), Tile::Hidden, "fill crossed the wall");
            assert_eq!(board.tile_at((4, y)), Tile::Hidden);
        }
        assert_eq!(board.revealed_count(), 10);

        // the disconnected zero region on the other side opens separately
        assert_eq!(board.reveal((4, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.revealed_count(), 20);
    }

    #[test]
    fn flood_fill_skips_flagged_tiles() {
        let mut board = forced((4, 4), &[(3, 3)]);
        board.toggle_flag((0, 3)).unwrap();

        board.reveal((0, 0)).unwrap();

        assert_eq!(board.tile_at((0, 3)), Tile::Flagged);
        assert_eq!(board.state(), GameState::Playing);
    }

    #[test]
    fn mineless_layout_wins_on_the_first_reveal() {
        let mut board = forced((4, 4), &[]);

        let outcome = board.reveal((1, 2)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(board.state(), GameState::Won);
        assert_eq!(board.revealed_count(), 16);
        for x in 0..4 {
            for y in 0..4 {
                assert_eq!(board.tile_at((x, y)), Tile::Open(0));
            }
        }
    }

    #[test]
    fn corner_mine_leaves_the_rest_as_one_zero_region() {
        let mut board = forced((3, 3), &[(2, 2)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(board.tile_at((0, 0)), Tile::Open(0));
        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(board.state(), GameState::Won);
        assert_eq!(board.revealed_count(), 8);
        assert_eq!(board.tile_at((1, 1)), Tile::Open(1));
        // leftover mine is flagged for the player on a win
        assert_eq!(board.tile_at((2, 2)), Tile::Flagged);
        assert_eq!(board.mines_left(), 0);
    }

    #[test]
    fn flag_roundtrip_restores_the_board() {
        let mut board = forced((3, 3), &[(2, 2)]);
        board.drain_events();
        let before = board.clone();

        assert_eq!(board.toggle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(board.mines_left(), 0);
        assert_eq!(board.toggle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        board.drain_events();

        assert_eq!(board, before);
    }

    #[test]
    fn flagged_tile_is_immune_to_reveal() {
        let mut board = forced((3, 3), &[(2, 2)]);
        board.toggle_flag((1, 1)).unwrap();
        board.drain_events();

        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.tile_at((1, 1)), Tile::Flagged);
        assert_eq!(board.revealed_count(), 0);
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn open_tile_cannot_be_flagged() {
        let mut board = forced((2, 2), &[(0, 0)]);
        board.reveal((1, 1)).unwrap();

        assert_eq!(board.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
    }

    #[test]
    fn finished_game_rejects_all_moves_without_events() {
        let mut board = forced((2, 2), &[(0, 0)]);
        board.reveal((0, 0)).unwrap();
        assert_eq!(board.state(), GameState::Lost);
        board.drain_events();
        let frozen = board.clone();

        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);

        assert_eq!(board, frozen);
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn out_of_range_coordinates_are_a_caller_error() {
        let mut board = forced((3, 3), &[(2, 2)]);

        assert_eq!(board.reveal((3, 0)), Err(GameError::InvalidCoords));
        assert_eq!(board.toggle_flag((0, 3)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn events_track_reveal_flag_and_state_changes() {
        let mut board = forced((3, 3), &[(2, 2)]);

        board.toggle_flag((0, 0)).unwrap();
        let events = board.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            BoardEvent::CellChanged { coords: (0, 0), cell } if cell.flagged && !cell.revealed
        ));
        assert_eq!(events[1], BoardEvent::MinesLeftChanged(0));

        board.toggle_flag((0, 0)).unwrap();
        board.drain_events();

        board.reveal((0, 0)).unwrap();
        let events = board.drain_events();
        // 8 safe cells opened, leftover mine auto-flagged, counter, win
        assert_eq!(
            events
                .iter()
                .filter(|ev| matches!(ev, BoardEvent::CellChanged { .. }))
                .count(),
            9
        );
        assert_eq!(events.last(), Some(&BoardEvent::StateChanged(GameState::Won)));
        assert!(events.contains(&BoardEvent::MinesLeftChanged(0)));
    }

    #[test]
    fn losing_reports_every_mine_position() {
        let mines = [(0, 0), (2, 0), (2, 2)];
        let mut board = forced((3, 3), &mines);
        board.drain_events();

        board.reveal((0, 0)).unwrap();
        let events = board.drain_events();

        for &coords in &mines {
            assert!(
                events.iter().any(|ev| matches!(
                    ev,
                    BoardEvent::CellChanged { coords: c, cell } if *c == coords && cell.mine
                )),
                "no event for mine at {coords:?}"
            );
        }
        assert_eq!(events.last(), Some(&BoardEvent::StateChanged(GameState::Lost)));
    }

    #[test]
    fn snapshot_reflects_tile_and_layout() {
        let mut board = forced((3, 3), &[(2, 2)]);
        board.reveal((0, 0)).unwrap();

        let open = board.snapshot_at((1, 1));
        assert!(open.revealed && !open.flagged && !open.mine);
        assert_eq!(open.neighbor_mines, 1);

        let mine = board.snapshot_at((2, 2));
        assert!(mine.mine);
    }

    #[test]
    fn over_flagging_drives_the_estimate_negative() {
        let mut board = forced((3, 3), &[(2, 2)]);
        board.toggle_flag((0, 0)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        assert_eq!(board.mines_left(), -1);
    }

    #[test]
    fn board_state_survives_a_serde_roundtrip() {
        let mut board = forced((3, 3), &[(2, 2)]);
        board.toggle_flag((2, 2)).unwrap();
        board.reveal((0, 1)).unwrap();
        board.drain_events();

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, board);
    }
}
