//! Food placement
//!
//! Uniform random draws over the grid, rejecting occupied cells, for a bounded
//! number of attempts. When every draw lands on the snake the grid is scanned
//! row by row and the first free cell is taken, so placement always terminates.

use rand::Rng;

use super::state::{grid_limit, Position, Snake};

/// Pick a free cell for the next piece of food
///
/// Returns `None` only when the snake covers the whole grid.
pub fn place_food<R: Rng>(
    rng: &mut R,
    snake: &Snake,
    tile_count: usize,
    max_attempts: usize,
) -> Option<Position> {
    let limit = grid_limit(tile_count);
    if limit == 0 {
        return None;
    }

    for _ in 0..max_attempts {
        let x = rng.gen_range(0..limit);
        let y = rng.gen_range(0..limit);
        let pos = Position::new(x, y);

        if !snake.occupies(pos) {
            return Some(pos);
        }
    }

    first_free_cell(snake, tile_count)
}

/// Row-major scan for the first cell the snake does not occupy
pub fn first_free_cell(snake: &Snake, tile_count: usize) -> Option<Position> {
    let limit = grid_limit(tile_count);
    (0..limit)
        .flat_map(|y| (0..limit).map(move |x| Position::new(x, y)))
        .find(|pos| !snake.occupies(*pos))
}
