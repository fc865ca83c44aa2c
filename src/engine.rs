use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::game::GameState;
use crate::utils::{ray, BISHOP_DIR, KING_MOVES, KNIGHT_MOVES, QUEEN_DIR, ROOK_DIR};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        if self == Color::White {
            Color::Black
        } else {
            Color::White
        }
    }

    /** Rank step the color's pawns advance by. White moves toward increasing
     * ranks, black toward decreasing ones. */
    pub(crate) fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub(crate) fn back_rank(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => 8,
        }
    }

    pub(crate) fn promotion_rank(self) -> i8 {
        self.opposite().back_rank()
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(if self == &Self::White {
            "White"
        } else {
            "Black"
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

/** Piece types a pawn may promote to, in the order they are generated. */
pub const PROMOTION_OPTIONS: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

impl PieceType {
    pub fn letter(self) -> char {
        match self {
            PieceType::King => 'K',
            PieceType::Queen => 'Q',
            PieceType::Bishop => 'B',
            PieceType::Knight => 'N',
            PieceType::Rook => 'R',
            PieceType::Pawn => 'P',
        }
    }
}

/** An on-board square, 1-indexed: rank 1 is white's back rank, file 1 is the
 * a-file. Construction never fails; callers check `is_on_board` before
 * dereferencing the board. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    rank: i8,
    file: i8,
}

impl Position {
    pub fn new(rank: i8, file: i8) -> Position {
        Position { rank, file }
    }

    pub fn rank(self) -> i8 {
        self.rank
    }

    pub fn file(self) -> i8 {
        self.file
    }

    pub fn is_on_board(self) -> bool {
        (1..=8).contains(&self.rank) && (1..=8).contains(&self.file)
    }

    pub fn offset(self, (ranks, files): (i8, i8)) -> Position {
        Position {
            rank: self.rank + ranks,
            file: self.file + files,
        }
    }

    /** Parses algebraic notation like "e4". */
    pub fn from_algebraic(square: &str) -> Option<Position> {
        let mut chars = square.chars();
        let file = chars.next()? as i8 - 'a' as i8 + 1;
        let rank = chars.next()?.to_digit(10)? as i8;
        if chars.next().is_some() {
            return None;
        }
        let position = Position { rank, file };
        position.is_on_board().then_some(position)
    }

    pub(crate) fn index(self) -> usize {
        ((self.rank - 1) * 8 + self.file - 1) as usize
    }

    pub(crate) fn from_index(index: usize) -> Position {
        Position {
            rank: index as i8 / 8 + 1,
            file: index as i8 % 8 + 1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_on_board() {
            write!(f, "{}{}", (b'a' + self.file as u8 - 1) as char, self.rank)
        } else {
            write!(f, "({},{})", self.rank, self.file)
        }
    }
}

/** A (color, type) value. Two pieces of the same kind and color are
 * interchangeable; there is no per-piece identity. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
}

impl Piece {
    pub fn new(color: Color, kind: PieceType) -> Piece {
        Piece { color, kind }
    }

    /** Inverse of `to_char`: uppercase is white, lowercase is black. */
    pub fn from_char(c: char) -> Option<Piece> {
        let kind = match c.to_ascii_lowercase() {
            'k' => PieceType::King,
            'q' => PieceType::Queen,
            'b' => PieceType::Bishop,
            'n' => PieceType::Knight,
            'r' => PieceType::Rook,
            'p' => PieceType::Pawn,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { color, kind })
    }

    pub fn to_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    /** Every square this piece may move to under its movement pattern and the
     * board occupancy, without regard for the mover's own king. Castling is
     * included when `state` still grants the right. */
    pub fn pseudo_legal_moves(
        self,
        board: &Board,
        origin: Position,
        state: &GameState,
    ) -> Vec<Move> {
        match self.kind {
            PieceType::Queen => self.sliding_moves(board, origin, QUEEN_DIR),
            PieceType::Rook => self.sliding_moves(board, origin, ROOK_DIR),
            PieceType::Bishop => self.sliding_moves(board, origin, BISHOP_DIR),
            PieceType::Knight => self.hopping_moves(board, origin, KNIGHT_MOVES),
            PieceType::King => {
                let mut moves = self.hopping_moves(board, origin, KING_MOVES);
                self.castling_moves(board, origin, state, &mut moves);
                moves
            }
            PieceType::Pawn => self.pawn_moves(board, origin, state),
        }
    }

    fn sliding_moves(self, board: &Board, origin: Position, directions: &[(i8, i8)]) -> Vec<Move> {
        let mut moves = Vec::new();
        for &direction in directions {
            for position in ray(origin, direction) {
                match board.piece_at(position) {
                    None => moves.push(Move::new(origin, position)),
                    Some(blocker) => {
                        if blocker.color != self.color {
                            moves.push(Move::new(origin, position));
                        }
                        break;
                    }
                }
            }
        }
        moves
    }

    fn hopping_moves(self, board: &Board, origin: Position, offsets: &[(i8, i8)]) -> Vec<Move> {
        let mut moves = Vec::new();
        for &offset in offsets {
            let position = origin.offset(offset);
            if !position.is_on_board() {
                continue;
            }
            match board.piece_at(position) {
                Some(occupant) if occupant.color == self.color => {}
                _ => moves.push(Move::new(origin, position)),
            }
        }
        moves
    }

    fn pawn_moves(self, board: &Board, origin: Position, state: &GameState) -> Vec<Move> {
        let mut moves = Vec::new();
        let forward = self.color.forward();
        let start_rank = self.color.back_rank() + forward;
        // push
        let front = origin.offset((forward, 0));
        if front.is_on_board() && board.piece_at(front).is_none() {
            push_pawn_move(&mut moves, self.color, origin, front);
            // double push
            if origin.rank() == start_rank {
                let double = front.offset((forward, 0));
                if board.piece_at(double).is_none() {
                    moves.push(Move::new(origin, double));
                }
            }
        }
        // captures, en passant included
        for files in [-1, 1] {
            let diagonal = origin.offset((forward, files));
            if !diagonal.is_on_board() {
                continue;
            }
            let capturable = match board.piece_at(diagonal) {
                Some(occupant) => occupant.color != self.color,
                None => state.en_passant == Some(diagonal),
            };
            if capturable {
                push_pawn_move(&mut moves, self.color, origin, diagonal);
            }
        }
        moves
    }

    /** Castling as a two-file king move. Requires the right to be intact, the
     * rook on its home corner, the squares between empty, and the king's
     * start, transit and destination squares unattacked. The attack test
     * never recurses into castling, so there is no mutual dependency. */
    fn castling_moves(
        self,
        board: &Board,
        origin: Position,
        state: &GameState,
        moves: &mut Vec<Move>,
    ) {
        let rights = state.castling(self.color);
        if !rights.kingside && !rights.queenside {
            return;
        }
        let rank = self.color.back_rank();
        if origin != Position::new(rank, 5) {
            return;
        }
        let opponent = self.color.opposite();
        if board.is_attacked(origin, opponent) {
            return;
        }
        for (allowed, rook_file, transit) in [
            (rights.kingside, 8, [6, 7]),
            (rights.queenside, 1, [4, 3]),
        ] {
            if !allowed {
                continue;
            }
            let rook = Piece::new(self.color, PieceType::Rook);
            if board.piece_at(Position::new(rank, rook_file)) != Some(rook) {
                continue;
            }
            let (low, high) = if rook_file < 5 { (rook_file, 5) } else { (5, rook_file) };
            if (low + 1..high).any(|file| board.piece_at(Position::new(rank, file)).is_some()) {
                continue;
            }
            if transit
                .iter()
                .any(|&file| board.is_attacked(Position::new(rank, file), opponent))
            {
                continue;
            }
            moves.push(Move::new(origin, Position::new(rank, transit[1])));
        }
    }

    /** Squares this piece attacks: capture destinations regardless of what
     * stands on them. Pawns attack their two diagonals only, and castling
     * attacks nothing. */
    pub(crate) fn attack_squares(self, board: &Board, origin: Position) -> Vec<Position> {
        match self.kind {
            PieceType::Queen => slide_attacks(board, origin, QUEEN_DIR),
            PieceType::Rook => slide_attacks(board, origin, ROOK_DIR),
            PieceType::Bishop => slide_attacks(board, origin, BISHOP_DIR),
            PieceType::Knight => hop_attacks(origin, KNIGHT_MOVES),
            PieceType::King => hop_attacks(origin, KING_MOVES),
            PieceType::Pawn => {
                let forward = self.color.forward();
                [(forward, -1), (forward, 1)]
                    .into_iter()
                    .map(|offset| origin.offset(offset))
                    .filter(|position| position.is_on_board())
                    .collect()
            }
        }
    }
}

fn push_pawn_move(moves: &mut Vec<Move>, color: Color, from: Position, to: Position) {
    if to.rank() == color.promotion_rank() {
        // Never a bare move onto the far rank: one move per promotion option.
        for kind in PROMOTION_OPTIONS {
            moves.push(Move::promoting(from, to, kind));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

fn slide_attacks(board: &Board, origin: Position, directions: &[(i8, i8)]) -> Vec<Position> {
    let mut attacked = Vec::new();
    for &direction in directions {
        for position in ray(origin, direction) {
            attacked.push(position);
            if board.piece_at(position).is_some() {
                break;
            }
        }
    }
    attacked
}

fn hop_attacks(origin: Position, offsets: &[(i8, i8)]) -> Vec<Position> {
    offsets
        .iter()
        .map(|&offset| origin.offset(offset))
        .filter(|position| position.is_on_board())
        .collect()
}

impl Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/** An (origin, destination, promotion) record. Equality and hashing are by
 * value; whether the move captures is a fact of the board, recomputed by
 * `is_capture`, never stored. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Position, to: Position, kind: PieceType) -> Move {
        Move {
            from,
            to,
            promotion: Some(kind),
        }
    }

    /** Derived capture flag: an opposing piece on the destination, or an
     * en-passant capture onto the current target square. Descriptive payload
     * for consumers, never an input to equality. */
    pub fn is_capture(&self, board: &Board, state: &GameState) -> bool {
        if !self.from.is_on_board() || !self.to.is_on_board() {
            return false;
        }
        let Some(piece) = board.piece_at(self.from) else {
            return false;
        };
        if let Some(target) = board.piece_at(self.to) {
            return target.color != piece.color;
        }
        piece.kind == PieceType::Pawn
            && state.en_passant == Some(self.to)
            && self.from.file() != self.to.file()
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

/** A total mapping from every on-board square to a piece or nothing. `Clone`
 * is the deep copy used for legality simulation: the array holds plain
 * values, so a clone never aliases the original. */
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde_as(as = "[_; 64]")]
    squares: [Option<Piece>; 64],
}

impl Board {
    pub fn new() -> Board {
        Board {
            squares: [None; 64],
        }
    }

    /** Piece lookup. Off-board queries are a caller error; check
     * `is_on_board` first. */
    pub fn piece_at(&self, position: Position) -> Option<Piece> {
        debug_assert!(position.is_on_board(), "off-board lookup at {position}");
        self.squares[position.index()]
    }

    pub fn place(&mut self, position: Position, piece: Piece) {
        debug_assert!(position.is_on_board(), "off-board placement at {position}");
        self.squares[position.index()] = Some(piece);
    }

    pub fn remove(&mut self, position: Position) -> Option<Piece> {
        debug_assert!(position.is_on_board(), "off-board removal at {position}");
        self.squares[position.index()].take()
    }

    pub fn iter_pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, square)| square.map(|piece| (Position::from_index(index), piece)))
    }

    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.iter_pieces()
            .find(|(_, piece)| piece.color == color && piece.kind == PieceType::King)
            .map(|(position, _)| position)
    }

    /** Whether any piece of `by` attacks `target`, via the same generators
     * as pseudo-legal movement. */
    pub fn is_attacked(&self, target: Position, by: Color) -> bool {
        self.iter_pieces()
            .filter(|(_, piece)| piece.color == by)
            .any(|(position, piece)| piece.attack_squares(self, position).contains(&target))
    }
}

impl Default for Board {
    /** The standard starting position. */
    fn default() -> Self {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        let mut board = Board::new();
        for (index, &kind) in BACK_RANK.iter().enumerate() {
            let file = index as i8 + 1;
            board.place(Position::new(1, file), Piece::new(Color::White, kind));
            board.place(
                Position::new(2, file),
                Piece::new(Color::White, PieceType::Pawn),
            );
            board.place(
                Position::new(7, file),
                Piece::new(Color::Black, PieceType::Pawn),
            );
            board.place(Position::new(8, file), Piece::new(Color::Black, kind));
        }
        board
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (1..=8).rev() {
            for file in 1..=8 {
                match self.piece_at(Position::new(rank, file)) {
                    Some(piece) => write!(f, "{piece}")?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
