//! Composes a [`Board`] with a side to move and repetition history.

use std::collections::HashSet;

use arrayvec::ArrayVec;

use crate::{
    board::{Board, Color, Square},
    move_gen::{self, LegalSet, MAX_MOVES},
};

/// A fully-specified move: the square moved from, the square landed on, and
/// the (possibly empty) ordered list of squares captured along the way.
///
/// Equality is componentwise; `captured` is order-sensitive as a list, but
/// in practice always holds the Explorer's canonical ascending-index
/// representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub captured: ArrayVec<Square, 12>,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }
}

/// The key identifying a within-game state for repetition detection: the
/// board's piece-placement hash together with whose turn it is.
pub type StateKey = (u64, Color);

/// `Board` + side to move + the set of state keys seen so far this game.
///
/// Mutated only through [`Game::apply_move`], which either advances the
/// state or marks the game loop-terminated.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    side_to_move: Color,
    seen_positions: HashSet<StateKey>,
    loop_terminated: bool,
}

impl Game {
    /// Starts a fresh game from the standard Thai Draughts setup, WHITE to
    /// move.
    pub fn new() -> Self {
        Self::from_board(Board::initial(), Color::White)
    }

    pub fn from_board(board: Board, side_to_move: Color) -> Self {
        let mut seen_positions = HashSet::new();
        seen_positions.insert((board.hash(), side_to_move));
        Self {
            board,
            side_to_move,
            seen_positions,
            loop_terminated: false,
        }
    }

    /// Rebuilds a `Game` from a checkpointed board, side to move, and the
    /// alternating `[hash_0, move_index_1, hash_1, ...]` history recorded for
    /// this branch by the traversal. `seen_positions` is repopulated from the
    /// hash entries (at even indices) paired with the side to move at that
    /// ply, which alternates starting from WHITE at ply 0, so the history
    /// alone is enough to reconstruct it without storing it separately.
    pub fn resume(board: Board, side_to_move: Color, loop_terminated: bool, history: &[u64]) -> Self {
        let mut seen_positions = HashSet::new();
        for (ply, hash) in history.iter().step_by(2).enumerate() {
            let side = if ply % 2 == 0 { Color::White } else { Color::Black };
            seen_positions.insert((*hash, side));
        }
        Self {
            board,
            side_to_move,
            seen_positions,
            loop_terminated,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn loop_terminated(&self) -> bool {
        self.loop_terminated
    }

    fn state_key(&self) -> StateKey {
        (self.board.hash(), self.side_to_move)
    }

    /// Collects every legal move for the side to move, filtered so that if
    /// any piece has a capture available, only captures are returned
    /// (board-level mandatory capture), then sorted deterministically by
    /// `(from.index, to.index, captured)`.
    ///
    /// Always empty once `loop_terminated` is set: a repeated position ends
    /// the game regardless of what moves the board would otherwise offer, so
    /// callers that only check `legal_moves().is_empty()` (as the Traversal's
    /// `step()` does) see the same terminal that `is_terminal()` reports.
    pub fn legal_moves(&self) -> ArrayVec<Move, MAX_MOVES> {
        if self.loop_terminated {
            return ArrayVec::new();
        }

        let mut regular_moves = ArrayVec::<Move, MAX_MOVES>::new();
        let mut capture_moves = ArrayVec::<Move, MAX_MOVES>::new();

        for square in self.board.occupied().squares() {
            if self.board.color_at(square) != self.side_to_move {
                continue;
            }

            // This board and square are always internally consistent, so the
            // only failure mode of `legal_moves` (square not occupied) can't
            // happen here.
            match move_gen::legal_moves(&self.board, square).expect("square is occupied") {
                LegalSet::Regular { targets } => {
                    for to in targets {
                        regular_moves.push(Move {
                            from: square,
                            to,
                            captured: ArrayVec::new(),
                        });
                    }
                }
                LegalSet::Captures { moves } => {
                    for m in moves {
                        capture_moves.push(Move {
                            from: square,
                            to: m.target,
                            captured: m.captured,
                        });
                    }
                }
            }
        }

        let mut moves = if capture_moves.is_empty() {
            regular_moves
        } else {
            capture_moves
        };

        moves.sort_by(|a, b| {
            a.from
                .index()
                .cmp(&b.from.index())
                .then_with(|| a.to.index().cmp(&b.to.index()))
                .then_with(|| a.captured.cmp(&b.captured))
        });

        moves
    }

    pub fn is_terminal(&self) -> bool {
        self.loop_terminated || self.legal_moves().is_empty()
    }

    /// Returns the winner of a terminal, non-loop game: the side to move has
    /// no legal response, so the other side wins. Returns `None` if the game
    /// is not terminal, or if it is terminal by loop (no winner).
    pub fn winner(&self) -> Option<Color> {
        if self.loop_terminated {
            None
        } else if self.legal_moves().is_empty() {
            Some(self.side_to_move.flip())
        } else {
            None
        }
    }

    /// Applies `m`, drawn from [`Self::legal_moves`] (not re-validated):
    /// moves the piece, removes every captured piece, promotes a MAN that
    /// lands on the far rank, flips the side to move, and checks the
    /// resulting state against the game's history for repetition.
    pub fn apply_move(&mut self, m: &Move) {
        self.board.move_piece(m.from, m.to);
        for captured in &m.captured {
            self.board.remove(*captured);
        }

        let far_rank = match self.side_to_move {
            Color::Black => 7,
            Color::White => 0,
        };
        if self.board.kind_at(m.to).is_man() && m.to.rank() == far_rank {
            self.board.promote(m.to);
        }

        self.side_to_move = self.side_to_move.flip();

        let key = self.state_key();
        if !self.seen_positions.insert(key) {
            self.loop_terminated = true;
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
