use crate::engine::Position;

/** Tables of directions for sliding pieces, as (rank, file) steps */
pub const BISHOP_DIR: &[(i8, i8)] = &[(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub const ROOK_DIR: &[(i8, i8)] = &[(1, 0), (-1, 0), (0, 1), (0, -1)];
pub const QUEEN_DIR: &[(i8, i8)] = &[
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
];

/** Fixed offsets for hopping pieces */
pub const KING_MOVES: &[(i8, i8)] = QUEEN_DIR;
pub const KNIGHT_MOVES: &[(i8, i8)] = &[
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/** Walks outward from a square one step at a time, stopping at the board
 * edge. The origin square itself is not yielded. */
pub struct RayIterator {
    position: Position,
    direction: (i8, i8),
}

impl Iterator for RayIterator {
    type Item = Position;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.position = self.position.offset(self.direction);
        if self.position.is_on_board() {
            Some(self.position)
        } else {
            None
        }
    }
}

pub fn ray(origin: Position, direction: (i8, i8)) -> RayIterator {
    RayIterator {
        position: origin,
        direction,
    }
}
