use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board has no cells")]
    EmptyBoard,
    #[error("Too many mines for the board size")]
    TooManyMines,
    #[error("A playable board needs at least one mine")]
    NoMines,
}

pub type Result<T> = std::result::Result<T, GameError>;
