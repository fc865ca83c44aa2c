use anyhow::{bail, ensure, Context};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::definitions::{GameStatus, MoveError};
use crate::engine::{Board, Color, Move, Piece, PieceType, Position, PROMOTION_OPTIONS};

/** What a color may still castle into. Rights only disappear: a king move
 * forfeits both, a rook leaving (or being captured on) its home corner
 * forfeits that side. */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        kingside: true,
        queenside: true,
    };
    pub const NONE: CastlingRights = CastlingRights {
        kingside: false,
        queenside: false,
    };
}

/** Everything legality depends on besides the board itself: whose turn it is,
 * castling rights per color, and the square skipped by the immediately
 * preceding double pawn push, if any. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub side_to_move: Color,
    pub white_castling: CastlingRights,
    pub black_castling: CastlingRights,
    pub en_passant: Option<Position>,
}

impl GameState {
    pub fn castling(&self, color: Color) -> CastlingRights {
        match color {
            Color::White => self.white_castling,
            Color::Black => self.black_castling,
        }
    }

    fn castling_mut(&mut self, color: Color) -> &mut CastlingRights {
        match color {
            Color::White => &mut self.white_castling,
            Color::Black => &mut self.black_castling,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            side_to_move: Color::White,
            white_castling: CastlingRights::ALL,
            black_castling: CastlingRights::ALL,
            en_passant: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    state: GameState,
}

impl Game {
    /** A game from the standard starting position. */
    pub fn new() -> Game {
        Game::default()
    }

    /** A game from an arbitrary board and state, e.g. a composed position. */
    pub fn from_parts(board: Board, state: GameState) -> Game {
        Game { board, state }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /** Pseudo-legal moves of the piece at `origin`, for either color. Errors
     * distinguish "no piece there" from "piece that cannot move". */
    pub fn piece_moves(&self, origin: Position) -> Result<Vec<Move>, MoveError> {
        if !origin.is_on_board() {
            return Err(MoveError::OffBoard(origin));
        }
        let piece = self
            .board
            .piece_at(origin)
            .ok_or(MoveError::NoPiece(origin))?;
        Ok(piece.pseudo_legal_moves(&self.board, origin, &self.state))
    }

    /** Legal moves of the piece at `origin`: pseudo-legal moves that do not
     * leave the mover's own king attacked. Empty if the piece has none. */
    pub fn legal_moves(&self, origin: Position) -> Result<Vec<Move>, MoveError> {
        if !origin.is_on_board() {
            return Err(MoveError::OffBoard(origin));
        }
        let piece = self
            .board
            .piece_at(origin)
            .ok_or(MoveError::NoPiece(origin))?;
        if piece.color != self.state.side_to_move {
            return Err(MoveError::WrongSide(origin));
        }
        Ok(piece
            .pseudo_legal_moves(&self.board, origin, &self.state)
            .into_iter()
            .filter(|&candidate| self.keeps_king_safe(candidate))
            .collect())
    }

    /** Union of `legal_moves` over every piece of the side to move. */
    pub fn all_legal_moves(&self) -> Vec<Move> {
        self.board
            .iter_pieces()
            .filter(|(_, piece)| piece.color == self.state.side_to_move)
            .flat_map(|(origin, _)| self.legal_moves(origin).unwrap_or_default())
            .collect()
    }

    /** Simulate-then-check: the candidate is applied to a scratch copy of the
     * board, side effects included, and rejected if the mover's king ends up
     * attacked. The live board is never touched. */
    fn keeps_king_safe(&self, candidate: Move) -> bool {
        let mover = self.state.side_to_move;
        let mut scratch = self.board.clone();
        apply_to_board(&mut scratch, candidate, &self.state);
        match scratch.king_position(mover) {
            Some(king) => !scratch.is_attacked(king, mover.opposite()),
            // Composed positions without a king have nothing to expose.
            None => true,
        }
    }

    fn has_any_legal_move(&self) -> bool {
        self.board
            .iter_pieces()
            .filter(|(_, piece)| piece.color == self.state.side_to_move)
            .any(|(origin, piece)| {
                piece
                    .pseudo_legal_moves(&self.board, origin, &self.state)
                    .into_iter()
                    .any(|candidate| self.keeps_king_safe(candidate))
            })
    }

    /** Status for the side to move. */
    pub fn status(&self) -> GameStatus {
        let side = self.state.side_to_move;
        let in_check = self
            .board
            .king_position(side)
            .map(|king| self.board.is_attacked(king, side.opposite()))
            .unwrap_or(false);
        match (in_check, self.has_any_legal_move()) {
            (true, true) => GameStatus::Check,
            (true, false) => GameStatus::Checkmate,
            (false, false) => GameStatus::Stalemate,
            (false, true) => GameStatus::InProgress,
        }
    }

    /** Validates and executes a move for the side to move, returning the
     * opponent's resulting status. On any error the board and state are left
     * exactly as they were. */
    pub fn apply_move(&mut self, candidate: Move) -> Result<GameStatus, MoveError> {
        let legal = self.legal_moves(candidate.from)?;
        let piece = self
            .board
            .piece_at(candidate.from)
            .ok_or(MoveError::NoPiece(candidate.from))?;
        // Promotion shape is checked before membership so a caller can tell a
        // bad promotion payload apart from a plainly illegal move.
        let promoting =
            piece.kind == PieceType::Pawn && candidate.to.rank() == piece.color.promotion_rank();
        match candidate.promotion {
            Some(kind) if !promoting || !PROMOTION_OPTIONS.contains(&kind) => {
                return Err(MoveError::InvalidPromotion(candidate))
            }
            None if promoting => return Err(MoveError::InvalidPromotion(candidate)),
            _ => {}
        }
        if !legal.contains(&candidate) {
            return Err(MoveError::IllegalMove(candidate));
        }
        trace!("{} plays {candidate}", self.state.side_to_move);
        let double_push = piece.kind == PieceType::Pawn
            && (candidate.to.rank() - candidate.from.rank()).abs() == 2;
        apply_to_board(&mut self.board, candidate, &self.state);
        self.update_castling_rights(candidate, piece);
        self.state.en_passant = double_push.then(|| {
            Position::new(
                (candidate.from.rank() + candidate.to.rank()) / 2,
                candidate.from.file(),
            )
        });
        self.state.side_to_move = self.state.side_to_move.opposite();
        Ok(self.status())
    }

    fn update_castling_rights(&mut self, executed: Move, piece: Piece) {
        let home = piece.color.back_rank();
        match piece.kind {
            PieceType::King => *self.state.castling_mut(piece.color) = CastlingRights::NONE,
            PieceType::Rook if executed.from == Position::new(home, 8) => {
                self.state.castling_mut(piece.color).kingside = false;
            }
            PieceType::Rook if executed.from == Position::new(home, 1) => {
                self.state.castling_mut(piece.color).queenside = false;
            }
            _ => {}
        }
        let opponent = piece.color.opposite();
        let opponent_home = opponent.back_rank();
        if executed.to == Position::new(opponent_home, 8) {
            self.state.castling_mut(opponent).kingside = false;
        } else if executed.to == Position::new(opponent_home, 1) {
            self.state.castling_mut(opponent).queenside = false;
        }
    }

    /** Parses the four state fields of a FEN record; move counters, when
     * present, are accepted and ignored. */
    pub fn from_fen(fen: &str) -> anyhow::Result<Game> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().context("empty FEN string")?;
        let mut board = Board::new();
        let mut rank = 8i8;
        for row in placement.split('/') {
            ensure!(rank >= 1, "too many ranks in '{placement}'");
            let mut file = 1i8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as i8;
                } else {
                    ensure!(file <= 8, "rank {rank} overflows the board");
                    let piece = Piece::from_char(c)
                        .with_context(|| format!("bad piece character '{c}'"))?;
                    board.place(Position::new(rank, file), piece);
                    file += 1;
                }
            }
            ensure!(file == 9, "rank {rank} does not span 8 files");
            rank -= 1;
        }
        ensure!(rank == 0, "expected 8 ranks in '{placement}'");
        let side_to_move = match fields.next().unwrap_or("w") {
            "w" => Color::White,
            "b" => Color::Black,
            other => bail!("bad side to move '{other}'"),
        };
        let mut state = GameState {
            side_to_move,
            white_castling: CastlingRights::NONE,
            black_castling: CastlingRights::NONE,
            en_passant: None,
        };
        let castling = fields.next().unwrap_or("-");
        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => state.white_castling.kingside = true,
                    'Q' => state.white_castling.queenside = true,
                    'k' => state.black_castling.kingside = true,
                    'q' => state.black_castling.queenside = true,
                    other => bail!("bad castling flag '{other}'"),
                }
            }
        }
        let en_passant = fields.next().unwrap_or("-");
        if en_passant != "-" {
            state.en_passant = Some(
                Position::from_algebraic(en_passant)
                    .with_context(|| format!("bad en-passant square '{en_passant}'"))?,
            );
        }
        Ok(Game { board, state })
    }

    /** Renders the four state fields of a FEN record. */
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (1..=8).rev() {
            let mut empty = 0;
            for file in 1..=8 {
                match self.board.piece_at(Position::new(rank, file)) {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_char());
                    }
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 1 {
                fen.push('/');
            }
        }
        fen.push(' ');
        fen.push(match self.state.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        fen.push(' ');
        let rights: String = [
            (self.state.white_castling.kingside, 'K'),
            (self.state.white_castling.queenside, 'Q'),
            (self.state.black_castling.kingside, 'k'),
            (self.state.black_castling.queenside, 'q'),
        ]
        .into_iter()
        .filter_map(|(granted, flag)| granted.then_some(flag))
        .collect();
        if rights.is_empty() {
            fen.push('-');
        } else {
            fen.push_str(&rights);
        }
        fen.push(' ');
        match self.state.en_passant {
            Some(target) => fen.push_str(&target.to_string()),
            None => fen.push('-'),
        }
        fen
    }

    /** Counts the leaves of the legal-move tree to the given depth. Used to
     * validate the generator against published node counts. */
    pub fn perft(&self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        self.all_legal_moves()
            .into_iter()
            .map(|candidate| {
                let mut game = self.clone();
                match game.apply_move(candidate) {
                    Ok(_) => game.perft(depth - 1),
                    Err(_) => 0,
                }
            })
            .sum()
    }
}

/** Executes a generated move with its side effects: en-passant removes the
 * bypassed pawn, a two-file king move relocates the rook, a promotion
 * substitutes the piece. The caller guarantees the move came from
 * `pseudo_legal_moves` for this board and state. */
fn apply_to_board(board: &mut Board, executed: Move, state: &GameState) {
    let Some(mut piece) = board.remove(executed.from) else {
        return;
    };
    if piece.kind == PieceType::Pawn
        && state.en_passant == Some(executed.to)
        && executed.from.file() != executed.to.file()
    {
        // The bypassed pawn stands beside the destination, not on it.
        board.remove(Position::new(executed.from.rank(), executed.to.file()));
    }
    if piece.kind == PieceType::King && (executed.to.file() - executed.from.file()).abs() == 2 {
        let rank = executed.from.rank();
        let (rook_from, rook_to) = if executed.to.file() > executed.from.file() {
            (8, 6)
        } else {
            (1, 4)
        };
        if let Some(rook) = board.remove(Position::new(rank, rook_from)) {
            board.place(Position::new(rank, rook_to), rook);
        }
    }
    if let Some(kind) = executed.promotion {
        piece.kind = kind;
    }
    board.place(executed.to, piece);
}
