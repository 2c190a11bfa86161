//! The Explorer: legal move generation for a single piece on a [`Board`].

use std::collections::HashMap;

use arrayvec::ArrayVec;

use crate::{
    board::{Board, Color, Piece, Square, SquareSet},
    error::CoreError,
};

/// Maximum number of distinct outcomes the Explorer can produce for one
/// piece. Comfortably above the densest cross-pattern king capture scenario
/// exercised by the test suite (22 entries).
pub const MAX_MOVES: usize = 64;

/// The four diagonal step directions, as `(d_file, d_rank)`.
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// One capture outcome: the square the piece lands on, and the set of enemy
/// squares it removed to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMove {
    pub target: Square,
    pub captured: ArrayVec<Square, 12>,
}

/// The normalized result of generating moves for one piece: either a
/// (possibly empty) set of regular destinations, or a non-empty set of
/// capture sequences.
///
/// Never both: the mandatory-capture rule means a piece with any capture
/// available never also offers regular moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegalSet {
    Regular { targets: ArrayVec<Square, 4> },
    Captures { moves: ArrayVec<CaptureMove, MAX_MOVES> },
}

impl LegalSet {
    pub fn is_empty(&self) -> bool {
        match self {
            LegalSet::Regular { targets } => targets.is_empty(),
            LegalSet::Captures { moves } => moves.is_empty(),
        }
    }
}

/// Returns the forward diagonal directions for a MAN of the given color: the
/// two whose rank-delta moves toward the opponent's back rank.
fn man_forward_deltas(color: Color) -> [(i8, i8); 2] {
    match color {
        Color::Black => [(1, 1), (-1, 1)],
        Color::White => [(1, -1), (-1, -1)],
    }
}

/// Generates the legal moves for the piece on `from`.
///
/// Returns [`CoreError::NotOccupied`] if `from` is empty. Otherwise returns
/// [`LegalSet::Captures`] if the piece has any capture available in any
/// diagonal (possibly chained through multiple jumps), and
/// [`LegalSet::Regular`] otherwise.
pub fn legal_moves(board: &Board, from: Square) -> Result<LegalSet, CoreError> {
    let piece = board
        .piece_at(from)
        .ok_or(CoreError::NotOccupied { square: from })?;

    let mut dedup: HashMap<(u32, Square), SquareSet> = HashMap::new();
    collect_captures(board, from, piece, SquareSet::EMPTY, &mut dedup);

    if !dedup.is_empty() {
        let mut moves = ArrayVec::new();
        for ((_, target), captured_mask) in dedup {
            moves.push(CaptureMove {
                target,
                captured: captured_mask.squares().collect(),
            });
        }
        return Ok(LegalSet::Captures { moves });
    }

    let mut targets = ArrayVec::new();
    regular_moves(board, from, piece, &mut targets);
    Ok(LegalSet::Regular { targets })
}

/// Recursively explores capture sequences starting (or continuing) from
/// `from`, with `captured_so_far` the set of enemy squares already removed
/// earlier in the chain. Every maximal sequence is recorded into `dedup`,
/// keyed by `(captured set, final landing square)` so equivalent sequences
/// collapse to one representative.
fn collect_captures(
    board: &Board,
    from: Square,
    piece: Piece,
    captured_so_far: SquareSet,
    dedup: &mut HashMap<(u32, Square), SquareSet>,
) {
    let mut found_any = false;

    for &delta in &DIAGONALS {
        let probe = if piece.is_king() {
            king_probe(board, from, delta, piece.color())
        } else {
            man_probe(board, from, delta, piece.color())
        };

        let Some((over, land)) = probe else {
            continue;
        };

        found_any = true;

        let mut next_board = *board;
        next_board.remove(over);
        next_board.move_piece(from, land);

        collect_captures(&next_board, land, piece, captured_so_far.with(over), dedup);
    }

    if !found_any && captured_so_far.has_any() {
        dedup
            .entry((captured_so_far.0, from))
            .or_insert(captured_so_far);
    }
}

/// Probes a single diagonal for a MAN capture: exactly one square over, one
/// square beyond.
fn man_probe(board: &Board, from: Square, delta: (i8, i8), mover: Color) -> Option<(Square, Square)> {
    let over = from.diagonal_offset(delta.0, delta.1)?;
    if !board.is_occupied(over) || board.color_at(over) == mover {
        return None;
    }

    let land = over.diagonal_offset(delta.0, delta.1)?;
    if board.is_occupied(land) {
        return None;
    }

    Some((over, land))
}

/// Probes a single diagonal for a KING capture: slides over any number of
/// empty squares, then must find exactly one enemy piece followed by one
/// empty landing square.
fn king_probe(board: &Board, from: Square, delta: (i8, i8), mover: Color) -> Option<(Square, Square)> {
    for step in 1..8i8 {
        let square = from.diagonal_offset(delta.0 * step, delta.1 * step)?;

        if !board.is_occupied(square) {
            continue;
        }

        if board.color_at(square) == mover {
            return None;
        }

        let land = from.diagonal_offset(delta.0 * (step + 1), delta.1 * (step + 1))?;
        return if board.is_occupied(land) {
            None
        } else {
            Some((square, land))
        };
    }

    None
}

/// Enumerates non-capturing destinations for a piece with no capture
/// available.
fn regular_moves(board: &Board, from: Square, piece: Piece, out: &mut ArrayVec<Square, 4>) {
    if piece.is_king() {
        for &delta in &DIAGONALS {
            for step in 1..8i8 {
                let Some(square) = from.diagonal_offset(delta.0 * step, delta.1 * step) else {
                    break;
                };
                if board.is_occupied(square) {
                    break;
                }
                out.push(square);
            }
        }
    } else {
        for delta in man_forward_deltas(piece.color()) {
            if let Some(square) = from.diagonal_offset(delta.0, delta.1) {
                if !board.is_occupied(square) {
                    out.push(square);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{board::PieceKind, test_utils::assert_in_any_order};

    fn sq(text: &str) -> Square {
        Square::from_text(text).unwrap()
    }

    fn place(board: &mut Board, text: &str, color: Color, kind: PieceKind) {
        board.place(Piece::new(color, kind), sq(text));
    }

    #[test]
    fn not_occupied_errors() {
        let board = Board::EMPTY;
        assert_eq!(
            legal_moves(&board, sq("D5")),
            Err(CoreError::NotOccupied { square: sq("D5") })
        );
    }

    #[test]
    fn man_regular_moves_forward_only() {
        let mut board = Board::EMPTY;
        place(&mut board, "C4", Color::White, PieceKind::Man);

        let result = legal_moves(&board, sq("C4")).unwrap();
        match result {
            LegalSet::Regular { targets } => {
                assert_in_any_order(targets, vec![sq("B3"), sq("D3")]);
            }
            _ => panic!("expected Regular, got {result:?}"),
        }
    }

    #[test]
    fn scenario_s3_single_man_capture() {
        let mut board = Board::EMPTY;
        place(&mut board, "C4", Color::White, PieceKind::Man);
        place(&mut board, "B3", Color::Black, PieceKind::Man);

        let result = legal_moves(&board, sq("C4")).unwrap();
        match result {
            LegalSet::Captures { moves } => {
                assert_eq!(moves.len(), 1);
                assert_eq!(moves[0].target, sq("A2"));
                assert_eq!(moves[0].captured.as_slice(), &[sq("B3")]);
            }
            _ => panic!("expected Captures, got {result:?}"),
        }
    }

    #[test]
    fn scenario_s2_man_multi_direction_capture() {
        let mut board = Board::EMPTY;
        place(&mut board, "E8", Color::White, PieceKind::Man);
        for s in ["B5", "B3", "D3", "D5", "D7", "F3", "F5", "F7"] {
            place(&mut board, s, Color::Black, PieceKind::Man);
        }

        let result = legal_moves(&board, sq("E8")).unwrap();
        match result {
            LegalSet::Captures { moves } => {
                assert_eq!(moves.len(), 5);
                for m in &moves {
                    assert_eq!(m.captured.len(), 3);
                }
                let targets: Vec<_> = moves.iter().map(|m| m.target).collect();
                assert!(targets.contains(&sq("C2")));
                assert!(targets.contains(&sq("G2")));

                let chains: Vec<Vec<Square>> = moves
                    .iter()
                    .map(|m| {
                        let mut v: Vec<_> = m.captured.iter().copied().collect();
                        v.sort();
                        v
                    })
                    .collect();

                let mut expect = |squares: [&str; 3]| {
                    let mut v: Vec<_> = squares.iter().map(|s| sq(s)).collect();
                    v.sort();
                    assert!(chains.contains(&v), "missing chain {squares:?}");
                };
                expect(["D7", "B5", "B3"]);
                expect(["D7", "D5", "D3"]);
                expect(["F7", "F5", "F3"]);
            }
            _ => panic!("expected Captures, got {result:?}"),
        }
    }

    #[test]
    fn scenario_s1_king_cross_pattern_capture_count() {
        let mut board = Board::EMPTY;
        place(&mut board, "D5", Color::White, PieceKind::King);
        for s in ["C2", "C4", "C6", "E2", "E4", "E6", "G2", "G4", "G6"] {
            place(&mut board, s, Color::Black, PieceKind::Man);
        }

        let result = legal_moves(&board, sq("D5")).unwrap();
        match result {
            LegalSet::Captures { moves } => {
                assert_eq!(moves.len(), 22);

                let mut by_size = [0usize; 10];
                for m in &moves {
                    by_size[m.captured.len()] += 1;
                }
                assert_eq!(by_size[3], 2);
                assert_eq!(by_size[6], 6);
                assert_eq!(by_size[7], 10);
                assert_eq!(by_size[8], 2);
                assert_eq!(by_size[9], 2);

                let targets: Vec<_> = moves.iter().map(|m| m.target).collect();
                for expected in ["B7", "H1", "B3", "D1", "H5", "F7"] {
                    assert!(targets.contains(&sq(expected)), "missing target {expected}");
                }
            }
            _ => panic!("expected Captures, got {result:?}"),
        }
    }

    #[test]
    fn deduplication_key_is_injective() {
        let mut board = Board::EMPTY;
        place(&mut board, "D5", Color::White, PieceKind::King);
        for s in ["C2", "C4", "C6", "E2", "E4", "E6", "G2", "G4", "G6"] {
            place(&mut board, s, Color::Black, PieceKind::Man);
        }

        let result = legal_moves(&board, sq("D5")).unwrap();
        if let LegalSet::Captures { moves } = result {
            let mut keys: Vec<(Vec<Square>, Square)> = moves
                .iter()
                .map(|m| {
                    let mut captured: Vec<_> = m.captured.iter().copied().collect();
                    captured.sort();
                    (captured, m.target)
                })
                .collect();
            let len_before = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), len_before);
        } else {
            panic!("expected Captures");
        }
    }
}
