use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }

    /// Check if the position lies inside a square grid of `tile_count` cells per side
    pub fn is_within(&self, tile_count: usize) -> bool {
        let limit = grid_limit(tile_count);
        (0..limit).contains(&self.x) && (0..limit).contains(&self.y)
    }
}

/// Grid side length as a coordinate bound, saturating at `i32::MAX`
pub fn grid_limit(tile_count: usize) -> i32 {
    i32::try_from(tile_count).unwrap_or(i32::MAX)
}

/// The snake in the game
///
/// The body may briefly hold one segment more than `target_length` while a
/// tick is in progress; the engine trims it back before the tick returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Length the body is trimmed back to after each move
    pub target_length: usize,
}

impl Snake {
    /// Create a single-segment snake at `head`
    pub fn new(head: Position) -> Self {
        Self {
            body: vec![head],
            target_length: 1,
        }
    }

    /// Build a snake from explicit segments, head first
    pub fn from_segments(body: Vec<Position>) -> Self {
        let target_length = body.len();
        Self {
            body,
            target_length,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    /// Check if any segment, head included, sits on `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Push a new head onto the front of the body
    pub fn push_head(&mut self, head: Position) {
        self.body.insert(0, head);
    }

    pub fn grow(&mut self) {
        self.target_length += 1;
    }

    /// Drop tail segments until the body is no longer than `target_length`
    pub fn trim(&mut self) {
        self.body.truncate(self.target_length);
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Lifecycle phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Reset and waiting for a start trigger
    #[default]
    Idle,
    Running,
    Paused,
    /// Ended by a collision; only a start trigger leaves this state
    Over,
}

/// Type of collision that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionType {
    /// Snake hit a wall
    Wall,
    /// Snake hit itself
    SelfCollision,
}

/// Read-only view of the engine handed to renderers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot<'a> {
    pub state: GameState,
    pub snake: &'a Snake,
    pub food: Option<Position>,
    pub tile_count: usize,
    pub score: u32,
    pub high_score: u32,
    pub speed: f32,
    pub steps: u32,
    pub last_collision: Option<CollisionType>,
}
