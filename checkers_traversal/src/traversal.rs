//! The depth-first game-tree enumerator: an explicit stack of [`Frame`]s
//! driven by repeated calls to [`Traversal::step`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use checkers_core::Game;

use crate::checkpoint::{self, CheckpointState};
use crate::deadline::{EmitFn, Watchdog, DEFAULT_PROGRESS_INTERVAL};
use crate::error::TraversalError;
use crate::events::{Event, ResultEvent, SummaryEvent};
use crate::frame::Frame;
use crate::loop_cache::LoopCache;
use crate::diag;

pub use crate::deadline::DEFAULT_TRAVERSAL_DURATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Progressed,
    Done,
}

/// Depth-first enumerator over the legal move graph, with an explicit,
/// checkpointable stack. See `step` for the single state transition every
/// driving mode is built from.
pub struct Traversal {
    stack: Vec<Frame>,
    game_counter: Arc<AtomicU64>,
    loop_cache: LoopCache,
    callback: Arc<Mutex<Option<EmitFn>>>,
    stop_requested: Arc<AtomicBool>,
    start_time: Option<Instant>,
    wall_ms_so_far: i64,

    task_depth_limit: u32,
    loop_detection_aggressive: bool,
    memory_vs_speed_ratio: f64,
}

impl Traversal {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            game_counter: Arc::new(AtomicU64::new(0)),
            loop_cache: LoopCache::new(),
            callback: Arc::new(Mutex::new(None)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            start_time: None,
            wall_ms_so_far: 0,
            task_depth_limit: 4,
            loop_detection_aggressive: false,
            memory_vs_speed_ratio: 0.5,
        }
    }

    /// Registers the subscriber for `ResultEvent`/`ProgressEvent`/
    /// `SummaryEvent`. The mutex guarding the callback is held only to copy
    /// it out before invoking it, so a callback may call back into the
    /// Traversal (e.g. `request_stop`) without deadlocking.
    pub fn set_callback(&self, callback: impl Fn(&Event) + Send + Sync + 'static) {
        *self.callback.lock().unwrap() = Some(Arc::new(callback));
    }

    fn emit(&self, event: Event) {
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(&event);
        }
    }

    /// Sets the stop flag, observed at the top of the driving loop. The
    /// in-flight `step()` always completes first; there is no forceful
    /// interruption.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Relaxed)
    }

    pub fn game_count(&self) -> u64 {
        self.game_counter.load(Ordering::Relaxed)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn set_task_depth_limit(&mut self, value: u32) {
        self.task_depth_limit = value;
    }

    pub fn task_depth_limit(&self) -> u32 {
        self.task_depth_limit
    }

    pub fn set_loop_detection_aggressive(&mut self, value: bool) {
        self.loop_detection_aggressive = value;
    }

    pub fn loop_detection_aggressive(&self) -> bool {
        self.loop_detection_aggressive
    }

    pub fn set_memory_vs_speed_ratio(&mut self, value: f64) {
        self.memory_vs_speed_ratio = value.clamp(0.0, 1.0);
    }

    pub fn memory_vs_speed_ratio(&self) -> f64 {
        self.memory_vs_speed_ratio
    }

    /// Resets all state and pushes a single root frame, with no deadline and
    /// no watchdog. For tests and interactive drivers that step by hand.
    pub fn start_root_only(&mut self, root: Game) {
        self.stack = vec![Frame::root(root)];
        self.game_counter.store(0, Ordering::Relaxed);
        self.loop_cache = LoopCache::new();
        self.stop_requested.store(false, Ordering::Relaxed);
        self.start_time = Some(Instant::now());
        self.wall_ms_so_far = 0;
    }

    pub fn step_one(&mut self) -> StepOutcome {
        self.step()
    }

    /// One state transition on the top frame:
    ///
    /// - if the stack is empty, the traversal is `Done`;
    /// - if the top frame's board hash is already in the loop cache, pop it
    ///   without expanding (a known-uninteresting subtree);
    /// - if the frame's game `is_terminal()` (no legal moves, or a repeated
    ///   position), emit a `ResultEvent`, record it in the loop cache if it
    ///   is a loop terminal, and pop;
    /// - if every child has been expanded, pop;
    /// - otherwise materialize and push the next unexpanded child.
    fn step(&mut self) -> StepOutcome {
        let Some(top) = self.stack.last_mut() else {
            return StepOutcome::Done;
        };

        let board_hash = top.game.board().hash();
        if self.loop_cache.contains(board_hash) {
            self.stack.pop();
            return StepOutcome::Progressed;
        }

        if top.game.is_terminal() {
            let is_loop = top.game.loop_terminated();
            let winner = top.game.winner();
            let history = top.history.clone();

            let game_id = self.game_counter.fetch_add(1, Ordering::Relaxed) + 1;
            self.emit(Event::Result(ResultEvent {
                game_id,
                is_loop,
                winner,
                history,
            }));

            if is_loop {
                self.loop_cache.insert(board_hash);
            }

            self.stack.pop();
            return StepOutcome::Progressed;
        }

        let moves = top.game.legal_moves();

        if top.next_child >= moves.len() {
            self.stack.pop();
            return StepOutcome::Progressed;
        }

        let chosen = top.next_child;
        let mut child_game = top.game.clone();
        child_game.apply_move(&moves[chosen]);
        diag!(child_game.board(), "expanded child {chosen} at depth {}", self.stack.len());
        let child_frame = top.child(chosen, child_game);
        top.next_child += 1;

        self.stack.push(child_frame);
        StepOutcome::Progressed
    }

    fn run_while(&mut self, mut predicate: impl FnMut(&Self) -> bool) {
        while predicate(self) {
            if self.step() == StepOutcome::Done {
                break;
            }
        }
    }

    fn spawn_watchdog(&self, deadline: Option<Instant>) -> Watchdog {
        let callback_cell = Arc::clone(&self.callback);
        let emit: EmitFn = Arc::new(move |event: &Event| {
            let callback = callback_cell.lock().unwrap().clone();
            if let Some(callback) = callback {
                callback(event);
            }
        });

        Watchdog::spawn(
            deadline,
            Arc::clone(&self.stop_requested),
            DEFAULT_PROGRESS_INTERVAL,
            Arc::clone(&self.game_counter),
            emit,
        )
    }

    fn emit_summary(&self, session_games: u64, previous_games: u64) {
        let wall_seconds = self.start_time.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
        let total_games = previous_games + session_games;
        let throughput = if wall_seconds > 0.0 {
            session_games as f64 / wall_seconds
        } else {
            0.0
        };

        self.emit(Event::Summary(SummaryEvent {
            wall_seconds,
            games: session_games,
            previous_games,
            total_games,
            throughput,
            cpu_seconds: -1.0,
            cpu_util_percent: -1.0,
            rss_kb: -1,
            hwm_kb: -1,
        }));
    }

    /// Resets state and drives `step()` from `root` until `duration` has
    /// elapsed or the tree is exhausted. A watchdog thread enforces the
    /// deadline and emits periodic `ProgressEvent`s; a `SummaryEvent` is
    /// emitted exactly once before this call returns.
    pub fn traverse_for(&mut self, duration: Duration, root: Game) {
        self.start_root_only(root);

        let deadline = Instant::now() + duration;
        let watchdog = self.spawn_watchdog(Some(deadline));

        self.run_while(|t| !t.stop_requested());

        watchdog.join();
        self.emit_summary(self.game_count(), 0);
    }

    /// `traverse_for` with the library's default ten-second duration.
    pub fn traverse_default(&mut self, root: Game) {
        self.traverse_for(DEFAULT_TRAVERSAL_DURATION, root);
    }

    /// Replaces all state from a previously loaded checkpoint, without
    /// touching the callback or tuning knobs. Used by `resume_or_start` and
    /// by drivers that load a checkpoint through a different path than a
    /// file (e.g. received over a channel).
    pub fn restore_from(&mut self, state: CheckpointState) {
        self.stack = state.stack;
        self.game_counter = Arc::new(AtomicU64::new(state.game_count));
        self.loop_cache = LoopCache::new();
        self.loop_cache.load_shard_snapshots(state.loop_cache_shards);
        self.wall_ms_so_far = state.wall_ms_so_far;
        self.stop_requested.store(false, Ordering::Relaxed);
        self.start_time = Some(Instant::now());
    }

    /// Loads `checkpoint_path` and continues from it; any load failure is
    /// treated identically to "no checkpoint" and starts fresh from `root`.
    /// Runs to completion (an empty stack) or until `request_stop()` is
    /// called; there is no built-in deadline.
    pub fn resume_or_start(&mut self, checkpoint_path: &Path, root: Game) {
        let previous_games = match checkpoint::load(checkpoint_path) {
            Ok(state) => {
                let game_count = state.game_count;
                self.restore_from(state);
                game_count
            }
            Err(_) => {
                self.start_root_only(root);
                0
            }
        };

        let watchdog = self.spawn_watchdog(None);

        self.run_while(|t| !t.stop_requested());

        watchdog.join();

        let session_games = self.game_count() - previous_games;
        self.emit_summary(session_games, previous_games);
    }

    /// Serializes the current stack and loop cache to `path`, via a
    /// temp-file-then-rename so a crash never leaves a half-written file.
    pub fn save_checkpoint(&self, path: &Path) -> Result<(), TraversalError> {
        let elapsed_ms = self.start_time.map(|t| t.elapsed().as_millis() as i64).unwrap_or(0);

        let state = CheckpointState {
            game_count: self.game_count(),
            wall_ms_so_far: self.wall_ms_so_far + elapsed_ms,
            stack: self.stack.clone(),
            loop_cache_shards: self.loop_cache.shard_snapshots(),
        };
        checkpoint::save(path, &state)
    }
}

impl Default for Traversal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use checkers_core::board::{Board, Color, Piece};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;

    fn sq(text: &str) -> checkers_core::board::Square {
        checkers_core::board::Square::from_text(text).unwrap()
    }

    #[test]
    fn step_on_tiny_position_emits_terminal_results() {
        // A single WHITE MAN boxed in by its own color on the back rank has
        // no legal moves: the very first step is a terminal.
        let board = Board::from_pieces([(sq("A8"), Piece::man(Color::White))]);
        let game = Game::from_board(board, Color::White);

        let results: Arc<StdMutex<Vec<ResultEvent>>> = Arc::new(StdMutex::new(Vec::new()));
        let results_for_callback = Arc::clone(&results);

        let mut traversal = Traversal::new();
        traversal.set_callback(move |event| {
            if let Event::Result(result) = event {
                results_for_callback.lock().unwrap().push(result.clone());
            }
        });

        traversal.start_root_only(game);
        assert_eq!(traversal.step_one(), StepOutcome::Progressed);
        assert_eq!(traversal.step_one(), StepOutcome::Done);

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_loop);
        assert_eq!(results[0].winner, Some(Color::Black));
        assert_eq!(results[0].game_id, 1);
    }

    #[test]
    fn scenario_s5_repetition_terminates_with_loop() {
        let board = Board::from_pieces([
            (sq("B1"), Piece::king(Color::White)),
            (sq("H8"), Piece::king(Color::Black)),
        ]);
        let game = Game::from_board(board, Color::White);

        let results: Arc<StdMutex<Vec<ResultEvent>>> = Arc::new(StdMutex::new(Vec::new()));
        let results_for_callback = Arc::clone(&results);

        let mut traversal = Traversal::new();
        traversal.set_callback(move |event| {
            if let Event::Result(result) = event {
                results_for_callback.lock().unwrap().push(result.clone());
            }
        });
        traversal.start_root_only(game);

        // Drive far enough to reach the first terminal on the leftmost
        // (lexicographically smallest move-index) DFS path, which shuffles
        // the lone kings back and forth until the position repeats.
        for _ in 0..64 {
            if traversal.step_one() == StepOutcome::Done {
                break;
            }
        }

        let results = results.lock().unwrap();
        assert!(results.iter().any(|r| r.is_loop && r.winner.is_none()));
    }

    #[test]
    fn game_id_is_monotonic() {
        let game = Game::new();
        let mut traversal = Traversal::new();
        traversal.start_root_only(game);

        let ids: Arc<StdMutex<Vec<u64>>> = Arc::new(StdMutex::new(Vec::new()));
        let ids_for_callback = Arc::clone(&ids);
        traversal.set_callback(move |event| {
            if let Event::Result(result) = event {
                ids_for_callback.lock().unwrap().push(result.game_id);
            }
        });

        for _ in 0..500 {
            if traversal.step_one() == StepOutcome::Done {
                break;
            }
        }

        let ids = ids.lock().unwrap();
        for window in ids.windows(2) {
            assert_eq!(window[1], window[0] + 1);
        }
    }

    #[test]
    fn scenario_s6_checkpoint_round_trip_matches_uninterrupted_run() {
        let run_n_then_m = |n: usize, m: usize| -> Vec<ResultEvent> {
            let results: Arc<StdMutex<Vec<ResultEvent>>> = Arc::new(StdMutex::new(Vec::new()));
            let results_for_callback = Arc::clone(&results);

            let mut traversal = Traversal::new();
            traversal.set_callback(move |event| {
                if let Event::Result(result) = event {
                    results_for_callback.lock().unwrap().push(result.clone());
                }
            });
            traversal.start_root_only(Game::new());

            for _ in 0..n {
                traversal.step_one();
            }

            let dir = std::env::temp_dir();
            let path = dir.join(format!("checkers_traversal_test_{:p}.bin", &traversal as *const _));
            traversal.save_checkpoint(&path).unwrap();

            let loaded_state = checkpoint::load(&path).unwrap();
            std::fs::remove_file(&path).ok();

            let mut resumed = Traversal::new();
            let results_for_resumed = Arc::clone(&results);
            resumed.set_callback(move |event| {
                if let Event::Result(result) = event {
                    results_for_resumed.lock().unwrap().push(result.clone());
                }
            });
            resumed.restore_from(loaded_state);

            for _ in 0..m {
                resumed.step_one();
            }

            Arc::try_unwrap(results).unwrap().into_inner().unwrap()
        };

        let fresh_results = {
            let results: Arc<StdMutex<Vec<ResultEvent>>> = Arc::new(StdMutex::new(Vec::new()));
            let results_for_callback = Arc::clone(&results);
            let mut traversal = Traversal::new();
            traversal.set_callback(move |event| {
                if let Event::Result(result) = event {
                    results_for_callback.lock().unwrap().push(result.clone());
                }
            });
            traversal.start_root_only(Game::new());
            for _ in 0..90 {
                traversal.step_one();
            }
            Arc::try_unwrap(results).unwrap().into_inner().unwrap()
        };

        let split_results = run_n_then_m(40, 50);

        assert_eq!(split_results, fresh_results);
    }
}
