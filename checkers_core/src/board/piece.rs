use std::fmt::Debug;

use num_derive::{FromPrimitive, ToPrimitive};

/// Identifies the side a piece belongs to.
///
/// Uses 0 for white and 1 for black, matching the side-index convention used
/// throughout `checkers_core` (array indexing, hash-table slot selection).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum Color {
    #[default]
    White = 0,
    Black = 1,
}

impl Color {
    pub const fn is_white(self) -> bool {
        matches!(self, Color::White)
    }

    pub const fn is_black(self) -> bool {
        !self.is_white()
    }

    /// Inverts the color, i.e. maps [`Color::White`] to [`Color::Black`] and
    /// vice versa.
    pub const fn flip(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Identifies the grade of a piece: a man (ordinary piece, "หมาก") or a king
/// ("ฮอส") that has been promoted at the far rank.
///
/// Deliberately not named `Rank`, which in this crate always refers to a
/// board row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum PieceKind {
    Man = 0,
    King = 1,
}

impl PieceKind {
    pub const fn is_man(self) -> bool {
        matches!(self, PieceKind::Man)
    }

    pub const fn is_king(self) -> bool {
        matches!(self, PieceKind::King)
    }
}

/// A piece: the combination of a [`Color`] and a [`PieceKind`].
///
/// Packed as a 2-bit code, `color.index() << 1 | kind as u8`, giving the four
/// values `WHITE_MAN = 0`, `WHITE_KING = 1`, `BLACK_MAN = 2`, `BLACK_KING =
/// 3`, which double as the index into the Zobrist piece table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Piece(u8);

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self((color as u8) << 1 | kind as u8)
    }

    pub const fn man(color: Color) -> Self {
        Self::new(color, PieceKind::Man)
    }

    pub const fn king(color: Color) -> Self {
        Self::new(color, PieceKind::King)
    }

    pub const fn color(self) -> Color {
        if self.0 & 0b10 != 0 {
            Color::Black
        } else {
            Color::White
        }
    }

    pub const fn kind(self) -> PieceKind {
        if self.0 & 0b01 != 0 {
            PieceKind::King
        } else {
            PieceKind::Man
        }
    }

    pub const fn is_man(self) -> bool {
        self.kind().is_man()
    }

    pub const fn is_king(self) -> bool {
        self.kind().is_king()
    }

    /// Returns the 2-bit code used to index the Zobrist piece table.
    pub const fn code(self) -> usize {
        self.0 as usize
    }

    pub const fn promoted(self) -> Self {
        Self::new(self.color(), PieceKind::King)
    }
}

/// Convenient constants for specifying specific pieces.
impl Piece {
    pub const WHITE_MAN: Piece = Piece::new(Color::White, PieceKind::Man);
    pub const WHITE_KING: Piece = Piece::new(Color::White, PieceKind::King);
    pub const BLACK_MAN: Piece = Piece::new(Color::Black, PieceKind::Man);
    pub const BLACK_KING: Piece = Piece::new(Color::Black, PieceKind::King);
}

impl Debug for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Piece")
            .field("color", &self.color())
            .field("kind", &self.kind())
            .finish()
    }
}
