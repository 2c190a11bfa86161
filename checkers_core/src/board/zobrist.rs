use std::{
    fmt::Debug,
    ops::{BitXor, BitXorAssign},
    sync::OnceLock,
};

use rand::{RngCore, SeedableRng};
use zerocopy_derive::FromZeros;

use super::{Piece, Square};

/// A Zobrist-style incremental hash over piece placement only.
///
/// Side to move is deliberately excluded: [`crate::board::Board::hash`] must
/// agree for positions that differ only in whose turn it is, since the
/// traversal's loop detection keys on `(board hash, side to move)` as two
/// separate components rather than folding them together.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, FromZeros)]
pub struct ZobristHash(pub u64);

impl ZobristHash {
    pub fn piece(piece: Piece, square: Square) -> Self {
        let instance = ZobristTable::get_instance();
        Self(instance.pieces[piece.code() * 32 + square.index()])
    }

    pub fn toggle_piece(&mut self, piece: Piece, square: Square) {
        *self ^= Self::piece(piece, square)
    }
}

impl BitXor for ZobristHash {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for ZobristHash {
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl Debug for ZobristHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ZobristHash")
            .field(&format_args!("{:#016X}", self.0))
            .finish()
    }
}

struct ZobristTable {
    // 4 piece codes (white man/king, black man/king) x 32 squares.
    pieces: [u64; 4 * 32],
}

impl ZobristTable {
    fn new() -> Self {
        let mut rng = rand_chacha::ChaCha12Rng::from_seed([
            0x94, 0xaa, 0x13, 0x7c, 0xe3, 0x62, 0xaf, 0x0d, 0x3f, 0xb2, 0x3b, 0xba, 0x78, 0xe2,
            0x21, 0x18, 0xf0, 0xc3, 0xbd, 0xb3, 0x59, 0xac, 0x84, 0x13, 0x17, 0x58, 0x01, 0x54,
            0x54, 0x72, 0xd2, 0xc3,
        ]);

        let mut pieces = [0; 4 * 32];
        pieces.fill_with(|| rng.next_u64());

        Self { pieces }
    }

    pub fn get_instance() -> &'static Self {
        static INSTANCE: OnceLock<ZobristTable> = OnceLock::new();

        INSTANCE.get_or_init(Self::new)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn zobrist_piece_hash_is_deterministic() {
        let a = ZobristHash::piece(Piece::WHITE_MAN, Square::from_index(3).unwrap());
        let b = ZobristHash::piece(Piece::WHITE_MAN, Square::from_index(3).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn zobrist_distinct_pieces_and_squares_differ() {
        let a = ZobristHash::piece(Piece::WHITE_MAN, Square::from_index(3).unwrap());
        let b = ZobristHash::piece(Piece::man(Color::Black), Square::from_index(3).unwrap());
        let c = ZobristHash::piece(Piece::WHITE_MAN, Square::from_index(4).unwrap());
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zobrist_xor_is_order_independent() {
        let p1 = ZobristHash::piece(Piece::WHITE_MAN, Square::from_index(0).unwrap());
        let p2 = ZobristHash::piece(Piece::BLACK_KING, Square::from_index(17).unwrap());

        assert_eq!(p1 ^ p2, p2 ^ p1);
    }

    #[test]
    fn zobrist_toggle_piece_is_its_own_inverse() {
        let mut hash = ZobristHash::default();
        let piece = Piece::BLACK_MAN;
        let square = Square::from_index(9).unwrap();

        hash.toggle_piece(piece, square);
        assert_ne!(hash, ZobristHash::default());

        hash.toggle_piece(piece, square);
        assert_eq!(hash, ZobristHash::default());
    }
}
