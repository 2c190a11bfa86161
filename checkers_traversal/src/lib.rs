//! Drives `checkers_core::Game` through an exhaustive, checkpointable
//! depth-first enumeration of the legal move graph.
//!
//! [`Traversal`] owns an explicit stack of [`Frame`]s and a cross-game
//! [`loop_cache::LoopCache`]; `checkpoint` serializes both to resume a large
//! search across sessions. No I/O happens implicitly: callers drive the
//! clock (`traverse_for`/`resume_or_start`) and pass a path when they want a
//! checkpoint written.

pub mod checkpoint;
pub mod deadline;
pub mod error;
pub mod events;
pub mod frame;
pub mod loop_cache;
pub mod traversal;

pub use error::TraversalError;
pub use events::Event;
pub use frame::Frame;
pub use traversal::{StepOutcome, Traversal};

/// No-op diagnostic trace hook, compiled away in every build. Call sites
/// read like `diag!(game.board(), "expanding {:?}", m)`; the board argument
/// exists so the macro's call sites document which state is being traced,
/// even though nothing currently consumes it.
macro_rules! diag {
    ($board:expr, $($t:tt)*) => {
        // eprintln!($($t)*)
        ()
    };
}
pub(crate) use diag;
