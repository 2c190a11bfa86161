//! Standalone conformance runner for the literal end-to-end scenarios: runs
//! each one against `checkers_core` and `checkers_traversal` directly (not
//! through `#[cfg(test)]`) and reports pass/fail the way a perft suite does.

use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use checkers_core::board::{Board, Color, Piece, Square};
use checkers_core::game::Move;
use checkers_core::move_gen::{self, LegalSet};
use checkers_core::Game;
use checkers_traversal::checkpoint;
use checkers_traversal::events::{Event, ResultEvent};
use checkers_traversal::{StepOutcome, Traversal};

fn sq(text: &str) -> Square {
    Square::from_text(text).unwrap()
}

fn s1_king_cross_pattern_capture_count() -> Result<(), String> {
    let mut pieces = vec![(sq("D5"), Piece::king(Color::White))];
    for s in ["C2", "C4", "C6", "E2", "E4", "E6", "G2", "G4", "G6"] {
        pieces.push((sq(s), Piece::man(Color::Black)));
    }
    let board = Board::from_pieces(pieces);

    let result = move_gen::legal_moves(&board, sq("D5")).map_err(|e| e.to_string())?;
    let LegalSet::Captures { moves } = result else {
        return Err("expected Captures".to_string());
    };

    if moves.len() != 22 {
        return Err(format!("expected 22 capture entries, got {}", moves.len()));
    }

    let mut by_size = [0usize; 10];
    for m in &moves {
        by_size[m.captured.len()] += 1;
    }
    for (size, expected_count) in [(3, 2), (6, 6), (7, 10), (8, 2), (9, 2)] {
        if by_size[size] != expected_count {
            return Err(format!(
                "size {size}: expected {expected_count} entries, got {}",
                by_size[size]
            ));
        }
    }

    let targets: Vec<Square> = moves.iter().map(|m| m.target).collect();
    for expected in ["B7", "H1", "B3", "D1", "H5", "F7"] {
        if !targets.contains(&sq(expected)) {
            return Err(format!("missing target {expected}"));
        }
    }

    Ok(())
}

fn s2_man_multi_direction_capture() -> Result<(), String> {
    let mut pieces = vec![(sq("E8"), Piece::man(Color::White))];
    for s in ["B5", "B3", "D3", "D5", "D7", "F3", "F5", "F7"] {
        pieces.push((sq(s), Piece::man(Color::Black)));
    }
    let board = Board::from_pieces(pieces);

    let result = move_gen::legal_moves(&board, sq("E8")).map_err(|e| e.to_string())?;
    let LegalSet::Captures { moves } = result else {
        return Err("expected Captures".to_string());
    };

    if moves.len() != 5 {
        return Err(format!("expected 5 capture entries, got {}", moves.len()));
    }
    for m in &moves {
        if m.captured.len() != 3 {
            return Err(format!("expected |captured|=3, got {}", m.captured.len()));
        }
    }

    let targets: Vec<Square> = moves.iter().map(|m| m.target).collect();
    for expected in ["C2", "G2"] {
        if !targets.contains(&sq(expected)) {
            return Err(format!("missing target {expected}"));
        }
    }

    let chains: Vec<Vec<Square>> = moves
        .iter()
        .map(|m| {
            let mut v: Vec<Square> = m.captured.iter().copied().collect();
            v.sort();
            v
        })
        .collect();

    for expected in [["D7", "B5", "B3"], ["D7", "D5", "D3"], ["F7", "F5", "F3"]] {
        let mut v: Vec<Square> = expected.iter().map(|s| sq(s)).collect();
        v.sort();
        if !chains.contains(&v) {
            return Err(format!("missing chain {expected:?}"));
        }
    }

    Ok(())
}

fn s3_single_man_capture_landing() -> Result<(), String> {
    let board = Board::from_pieces([
        (sq("C4"), Piece::man(Color::White)),
        (sq("B3"), Piece::man(Color::Black)),
    ]);

    let result = move_gen::legal_moves(&board, sq("C4")).map_err(|e| e.to_string())?;
    let LegalSet::Captures { moves } = result else {
        return Err("expected Captures".to_string());
    };

    if moves.len() != 1 {
        return Err(format!("expected 1 capture entry, got {}", moves.len()));
    }
    if moves[0].target != sq("A2") {
        return Err(format!("expected target A2, got {:?}", moves[0].target));
    }
    if moves[0].captured.as_slice() != [sq("B3")] {
        return Err(format!("expected captured=[B3], got {:?}", moves[0].captured));
    }

    Ok(())
}

fn s4_mandatory_capture_filtering() -> Result<(), String> {
    let board = Board::from_pieces([
        (sq("C4"), Piece::man(Color::White)),
        (sq("B3"), Piece::man(Color::Black)),
        (sq("F5"), Piece::man(Color::White)),
    ]);
    let game = Game::from_board(board, Color::White);
    let moves: Vec<Move> = game.legal_moves().into_iter().collect();

    if moves.len() != 1 {
        return Err(format!("expected exactly 1 legal move, got {}", moves.len()));
    }
    let m = &moves[0];
    if m.from != sq("C4") || m.to != sq("A2") || m.captured.as_slice() != [sq("B3")] {
        return Err(format!("unexpected move {m:?}"));
    }

    Ok(())
}

fn collect_results(traversal: &mut Traversal, steps: usize) -> Arc<Mutex<Vec<ResultEvent>>> {
    let results = Arc::new(Mutex::new(Vec::new()));
    let results_for_callback = Arc::clone(&results);
    traversal.set_callback(move |event| {
        if let Event::Result(result) = event {
            results_for_callback.lock().unwrap().push(result.clone());
        }
    });
    for _ in 0..steps {
        if traversal.step_one() == StepOutcome::Done {
            break;
        }
    }
    results
}

fn s5_repetition_termination() -> Result<(), String> {
    let board = Board::from_pieces([
        (sq("B1"), Piece::king(Color::White)),
        (sq("H8"), Piece::king(Color::Black)),
    ]);
    let game = Game::from_board(board, Color::White);

    let mut traversal = Traversal::new();
    traversal.start_root_only(game);
    let results = collect_results(&mut traversal, 64);
    let results = results.lock().unwrap();

    if !results.iter().any(|r| r.is_loop && r.winner.is_none()) {
        return Err("expected a loop-terminal ResultEvent with no winner".to_string());
    }

    Ok(())
}

fn s6_checkpoint_round_trip() -> Result<(), String> {
    let mut fresh = Traversal::new();
    fresh.start_root_only(Game::new());
    let fresh_results = collect_results(&mut fresh, 90);
    let fresh_results = Arc::try_unwrap(fresh_results).unwrap().into_inner().unwrap();

    let mut first_half = Traversal::new();
    first_half.start_root_only(Game::new());
    let first_results = collect_results(&mut first_half, 40);

    let checkpoint_path = std::env::temp_dir().join("checkers_testsuite_s6_checkpoint.bin");
    first_half
        .save_checkpoint(&checkpoint_path)
        .map_err(|e| format!("checkpoint save failed: {e}"))?;

    let state = checkpoint::load(&checkpoint_path).map_err(|e| format!("checkpoint load failed: {e}"))?;
    std::fs::remove_file(&checkpoint_path).ok();

    let mut resumed = Traversal::new();
    resumed.restore_from(state);
    let resumed_results = Arc::new(Mutex::new(
        Arc::try_unwrap(first_results).unwrap().into_inner().unwrap(),
    ));
    let resumed_results_for_callback = Arc::clone(&resumed_results);
    resumed.set_callback(move |event| {
        if let Event::Result(result) = event {
            resumed_results_for_callback.lock().unwrap().push(result.clone());
        }
    });
    for _ in 0..50 {
        if resumed.step_one() == StepOutcome::Done {
            break;
        }
    }
    let split_results = Arc::try_unwrap(resumed_results).unwrap().into_inner().unwrap();

    if split_results != fresh_results {
        return Err("checkpoint-resumed ResultEvents diverged from an uninterrupted run".to_string());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cases: Vec<(&'static str, fn() -> Result<(), String>)> = vec![
        ("S1: king cross-pattern capture count", s1_king_cross_pattern_capture_count),
        ("S2: man multi-direction capture", s2_man_multi_direction_capture),
        ("S3: single man capture, landing placement", s3_single_man_capture_landing),
        ("S4: mandatory-capture filtering", s4_mandatory_capture_filtering),
        ("S5: repetition termination", s5_repetition_termination),
        ("S6: checkpoint round-trip", s6_checkpoint_round_trip),
    ];

    let start = Instant::now();
    let mut failed_cases = Vec::new();

    for (name, run) in cases {
        print!("{name}: ");
        match run() {
            Ok(()) => println!("OK"),
            Err(message) => {
                println!("FAILED -- {message}");
                failed_cases.push(name);
            }
        }
    }

    let elapsed = start.elapsed();
    println!("Took {:?}.", elapsed);

    if failed_cases.is_empty() {
        println!("All scenarios passed.");
        ExitCode::SUCCESS
    } else {
        println!("Failing scenarios: {}", failed_cases.join(", "));
        ExitCode::FAILURE
    }
}
