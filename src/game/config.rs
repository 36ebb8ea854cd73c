use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::state::{grid_limit, Position};

/// Largest grid side the game accepts
pub const MAX_TILE_COUNT: usize = 1000;

/// Fastest speed the game accepts, in ticks per second (a 1ms timer period)
pub const MAX_TICK_RATE: f32 = 1000.0;

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Cells per side of the square grid
    pub tile_count: usize,
    /// Cell the snake is placed on by a reset
    pub start: Position,
    /// Direction queued when a game is started
    pub start_direction: Direction,

    // Speed, in ticks per second
    /// Speed at the start of every game
    pub initial_speed: f32,
    /// Added to the speed each time food is eaten
    pub speed_increment: f32,
    /// Speed ceiling
    pub max_speed: f32,

    /// Points awarded per food eaten
    pub food_score: u32,
    /// Random draws tried before food placement falls back to a grid scan
    pub food_placement_attempts: usize,
    /// Seed for a reproducible food sequence; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_count: 20,
            start: Position::new(10, 10),
            start_direction: Direction::Right,
            initial_speed: 7.0,
            speed_increment: 0.2,
            max_speed: 15.0,
            food_score: 10,
            food_placement_attempts: 100,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom grid size
    ///
    /// The start cell moves to the grid centre when the default one would
    /// fall outside a smaller grid.
    pub fn new(tile_count: usize) -> Self {
        let mut config = Self {
            tile_count,
            ..Default::default()
        };
        if !config.start.is_within(tile_count) {
            let centre = grid_limit(tile_count / 2);
            config.start = Position::new(centre, centre);
        }
        config
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10)
    }

    /// Create a large grid
    pub fn large() -> Self {
        Self::new(30)
    }

    /// Same configuration with a fixed RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tile_count > 0, "tile_count must be at least 1");
        ensure!(
            self.tile_count <= MAX_TILE_COUNT,
            "tile_count must be at most {}, got {}",
            MAX_TILE_COUNT,
            self.tile_count
        );
        ensure!(
            self.start.is_within(self.tile_count),
            "start cell ({}, {}) lies outside a {}x{} grid",
            self.start.x,
            self.start.y,
            self.tile_count,
            self.tile_count
        );
        ensure!(
            self.initial_speed.is_finite() && self.initial_speed > 0.0,
            "initial_speed must be positive and finite, got {}",
            self.initial_speed
        );
        ensure!(
            self.max_speed.is_finite() && self.max_speed <= MAX_TICK_RATE,
            "max_speed must be at most {} ticks per second, got {}",
            MAX_TICK_RATE,
            self.max_speed
        );
        ensure!(
            self.max_speed >= self.initial_speed,
            "max_speed ({}) cannot be below initial_speed ({})",
            self.max_speed,
            self.initial_speed
        );
        ensure!(
            self.speed_increment.is_finite() && self.speed_increment >= 0.0,
            "speed_increment must be non-negative and finite, got {}",
            self.speed_increment
        );
        ensure!(
            self.food_placement_attempts > 0,
            "food_placement_attempts must be at least 1"
        );
        Ok(())
    }
}
