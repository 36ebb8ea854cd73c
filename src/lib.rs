//! Grid Snake - a terminal Snake game
//!
//! This library provides:
//! - Core game logic with a single-owner, timer-driven engine (game module)
//! - High score persistence (storage module)
//! - TUI rendering (render module)
//! - Keyboard and mouse-swipe input mapping (input module)
//! - The interactive play loop (modes module)

pub mod game;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod storage;
