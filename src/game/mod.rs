//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The engine owns every piece of mutable game state; front-ends feed it input
//! and draw from its [`Snapshot`].

pub mod config;
pub mod direction;
pub mod engine;
pub mod food;
pub mod state;

// Re-export commonly used types
pub use config::{GameConfig, MAX_TICK_RATE, MAX_TILE_COUNT};
pub use direction::Direction;
pub use engine::{GameEngine, TickInfo, TickResult};
pub use state::{CollisionType, GameState, Position, Snake, Snapshot};
