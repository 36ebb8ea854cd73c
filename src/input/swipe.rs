//! Mouse drags as swipe gestures
//!
//! A left-button press records where the drag began; the matching release
//! turns the drag into a direction along whichever axis moved further.
//! Terminal rows are roughly twice as tall as columns are wide, so vertical
//! distance is doubled before the axes are compared.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::game::Direction;

pub struct SwipeTracker {
    origin: Option<(u16, u16)>,
    min_distance: u16,
}

impl SwipeTracker {
    /// `min_distance` is measured in terminal columns along the dominant axis
    pub fn new(min_distance: u16) -> Self {
        Self {
            origin: None,
            min_distance,
        }
    }

    /// Feed a mouse event; yields a direction when a swipe completes
    pub fn handle_mouse_event(&mut self, event: MouseEvent) -> Option<Direction> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some((event.column, event.row));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let origin = self.origin.take()?;
                self.classify(origin, (event.column, event.row))
            }
            _ => None,
        }
    }

    fn classify(&self, from: (u16, u16), to: (u16, u16)) -> Option<Direction> {
        let dx = i32::from(to.0) - i32::from(from.0);
        let dy = (i32::from(to.1) - i32::from(from.1)) * 2;

        if dx.abs() == dy.abs() || dx.abs().max(dy.abs()) < i32::from(self.min_distance) {
            return None;
        }

        let direction = if dx.abs() > dy.abs() {
            if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        };
        Some(direction)
    }
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(4)
    }
}
