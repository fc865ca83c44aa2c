use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{Move, Position};

/** Outcome of a position, scoped to the side to move. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}

/** Everything that can go wrong at the contract surface. Each failure is
 * reported synchronously and leaves the game untouched. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("position {0} is outside the board")]
    OffBoard(Position),
    #[error("no piece at {0}")]
    NoPiece(Position),
    #[error("the piece at {0} does not belong to the side to move")]
    WrongSide(Position),
    #[error("move {0} carries an invalid promotion")]
    InvalidPromotion(Move),
    #[error("move {0} is not legal in this position")]
    IllegalMove(Move),
}
