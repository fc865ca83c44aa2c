pub mod definitions;
pub mod engine;
pub mod game;
pub mod utils;

// module re-exports
pub use definitions::{GameStatus, MoveError};
pub use engine::{Board, Color, Move, Piece, PieceType, Position, PROMOTION_OPTIONS};
pub use game::{CastlingRights, Game, GameState};
