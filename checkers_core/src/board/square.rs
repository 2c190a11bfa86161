use std::{
    fmt::{Debug, Display, Write},
    str::FromStr,
};

use thiserror::Error;

use crate::error::CoreError;

/// Identifies one of the 32 dark (playable) squares of an 8x8 Thai Checkers
/// board.
///
/// Internally represented as an integer from 0-31. Files are numbered 0-7
/// (A-H), ranks 0-7 (1-8). Only squares where `file + rank` is odd are dark;
/// each rank has exactly four of them, so the index is `rank * 4 + file / 2`
/// (integer division maps both `{1, 3, 5, 7}` and `{0, 2, 4, 6}` onto
/// `{0, 1, 2, 3}`, whichever subset is dark for that rank).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Construct a [`Square`] from file and rank, both 0-7.
    ///
    /// Returns [`None`] if either coordinate is out of range, or if the
    /// resulting square is not dark (light squares are never playable and
    /// have no valid index).
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file >= 8 || rank >= 8 || (file + rank) % 2 == 0 {
            None
        } else {
            Some(Self::new_unchecked(file, rank))
        }
    }

    /// Construct a [`Square`] from file and rank without validating that the
    /// square is dark or in range. Use only when both are known valid.
    pub const fn new_unchecked(file: u8, rank: u8) -> Self {
        Self(rank * 4 + file / 2)
    }

    /// Construct a [`Square`] from signed file/rank coordinates, surfacing
    /// out-of-range or light-square input as [`CoreError::InvalidCoordinates`]
    /// instead of silently collapsing to [`None`]. For callers at a crate
    /// boundary who need to report which coordinates were bad, rather than
    /// just that they were.
    pub fn from_coordinates(file: i32, rank: i32) -> Result<Self, CoreError> {
        let in_range = (0..8).contains(&file) && (0..8).contains(&rank);
        if in_range {
            if let Some(square) = Self::new(file as u8, rank as u8) {
                return Ok(square);
            }
        }
        Err(CoreError::InvalidCoordinates { file, rank })
    }

    /// Construct a [`Square`] from its index in `0..32`.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 32 {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Construct a [`Square`] from its index without range checking.
    pub const fn from_index_unchecked(index: usize) -> Self {
        Self((index % 32) as u8)
    }

    /// Returns the index of this square as a [`u8`].
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the index of this square as a [`usize`].
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the rank (0-7, 1-8) of this square.
    pub const fn rank(self) -> u8 {
        self.0 / 4
    }

    /// Returns the file (0-7, A-H) of this square.
    pub const fn file(self) -> u8 {
        let rank = self.rank();
        let pos = self.0 % 4;
        2 * pos + ((rank + 1) % 2)
    }

    /// Returns an iterator over every dark square, in index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..32).map(Square)
    }

    /// Offsets this square by `(d_file, d_rank)` diagonal steps, returning
    /// `None` if the result leaves the 8x8 board.
    ///
    /// Both deltas are expected to share the same magnitude (this is only
    /// ever used for diagonal probing, where `d_file == ±d_rank` scaled by a
    /// step count), which keeps the result dark whenever the start square
    /// was dark: `(file + d_file) + (rank + d_rank)` changes by
    /// `d_file + d_rank`, an even number for every diagonal step, so parity
    /// is preserved and no dark/light re-check is needed afterwards.
    pub fn diagonal_offset(self, d_file: i8, d_rank: i8) -> Option<Self> {
        let file = self.file() as i8 + d_file;
        let rank = self.rank() as i8 + d_rank;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Self::new_unchecked(file as u8, rank as u8))
        } else {
            None
        }
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char((self.file() + b'A') as char)?;
        f.write_char((self.rank() + b'1') as char)
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("invalid square coordinates")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let file = chars.next().ok_or(ParseSquareError)?;
        let rank = chars.next().ok_or(ParseSquareError)?;
        if chars.next().is_some() {
            return Err(ParseSquareError);
        }

        let file = (file.to_ascii_uppercase() as i32) - ('A' as i32);
        let rank = (rank as i32) - ('1' as i32);
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Square::new(file as u8, rank as u8).ok_or(ParseSquareError)
        } else {
            Err(ParseSquareError)
        }
    }
}

impl Square {
    /// Parses algebraic notation like `"D5"`. Equivalent to [`FromStr`].
    pub fn from_text(s: &str) -> Result<Self, ParseSquareError> {
        s.parse()
    }

    /// Renders this square as algebraic notation, e.g. `"D5"`.
    pub fn to_text(self) -> String {
        self.to_string()
    }
}

impl Debug for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
