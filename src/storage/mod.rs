//! High score persistence
//!
//! The engine only sees the [`HighScoreStore`] trait; the binary picks a
//! file-backed store, tests and `--no-persist` use the in-memory one.

pub mod high_score;

pub use high_score::{FileHighScoreStore, HighScoreStore, MemoryHighScoreStore};
