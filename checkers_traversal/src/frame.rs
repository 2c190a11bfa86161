//! One level of the Traversal's explicit DFS stack.

use checkers_core::Game;

/// A `Game` plus the index of the next child to expand, plus the path
/// (`[hash_0, move_index_1, hash_1, ...]`) that reached it from the root.
///
/// `history` is carried alongside `game` rather than inside it: `Game` only
/// needs its own `seen_positions` for within-game repetition, but a
/// `ResultEvent` needs the full path back to the root, and a checkpoint
/// needs enough to rebuild a resumed `Game` (see
/// [`checkers_core::Game::resume`]).
#[derive(Debug, Clone)]
pub struct Frame {
    pub game: Game,
    pub next_child: usize,
    pub history: Vec<u64>,
}

impl Frame {
    pub fn root(game: Game) -> Self {
        let history = vec![game.board().hash()];
        Self {
            game,
            next_child: 0,
            history,
        }
    }

    /// Builds the child frame reached by playing the `child_index`-th move
    /// of `self.game`'s legal move list.
    pub fn child(&self, child_index: usize, child_game: Game) -> Self {
        let mut history = self.history.clone();
        history.push(child_index as u64);
        history.push(child_game.board().hash());
        Self {
            game: child_game,
            next_child: 0,
            history,
        }
    }
}
