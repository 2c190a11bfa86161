//! Event payloads delivered to Traversal subscribers.
//!
//! Mirrors the shape of the teacher engine's `SearchResult`/`SearchStats`:
//! plain data structs handed to a callback, with no behavior of their own.

use checkers_core::board::Color;

/// Emitted once per terminal game, in DFS discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEvent {
    /// 1-based monotonic counter, matching `game_counter` at emission time.
    pub game_id: u64,
    pub is_loop: bool,
    /// Absent when `is_loop` is true.
    pub winner: Option<Color>,
    /// `[board_hash_0, move_index_1, board_hash_1, move_index_2, ...]`.
    pub history: Vec<u64>,
}

/// Emitted periodically by the watchdog while a driving call is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub games_so_far: u64,
}

/// Emitted exactly once, at the end of a driving call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryEvent {
    pub wall_seconds: f64,
    pub games: u64,
    pub previous_games: u64,
    pub total_games: u64,
    pub throughput: f64,
    /// -1.0 if unavailable on the host platform.
    pub cpu_seconds: f64,
    /// -1.0 if unavailable.
    pub cpu_util_percent: f64,
    /// -1 if unavailable.
    pub rss_kb: i64,
    /// -1 if unavailable.
    pub hwm_kb: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Result(ResultEvent),
    Progress(ProgressEvent),
    Summary(SummaryEvent),
}
