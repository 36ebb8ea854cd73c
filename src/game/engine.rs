use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{
    config::{GameConfig, MAX_TICK_RATE},
    direction::Direction,
    food::place_food,
    state::{CollisionType, GameState, Position, Snake, Snapshot},
};
use crate::storage::{HighScoreStore, MemoryHighScoreStore};

/// Information about a tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickInfo {
    /// Whether the snake ate food this tick
    pub ate_food: bool,
    /// Whether this tick raised the high score
    pub new_high_score: bool,
    /// Type of collision if one occurred
    pub collision_type: Option<CollisionType>,
}

/// Result of a game tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickResult {
    /// False when the engine was not running and nothing happened
    pub advanced: bool,
    /// Whether the game ended on this tick
    pub terminated: bool,
    /// Additional information about the tick
    pub info: TickInfo,
}

impl TickResult {
    fn skipped() -> Self {
        Self::default()
    }

    fn crashed(collision_type: CollisionType, ate_food: bool, new_high_score: bool) -> Self {
        Self {
            advanced: true,
            terminated: true,
            info: TickInfo {
                ate_food,
                new_high_score,
                collision_type: Some(collision_type),
            },
        }
    }
}

/// The game engine: sole owner of all game state
///
/// Input calls ([`set_direction`](Self::set_direction),
/// [`toggle_pause`](Self::toggle_pause)) only touch buffered fields; the
/// simulation advances exclusively through [`tick`](Self::tick).
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
    store: Box<dyn HighScoreStore>,

    state: GameState,
    snake: Snake,
    food: Option<Position>,
    score: u32,
    high_score: u32,
    speed: f32,
    steps: u32,
    last_collision: Option<CollisionType>,

    /// Direction used by the most recent tick
    applied: Direction,
    /// Direction the next tick will use, if input asked for a change
    pending: Option<Direction>,
    /// Set once a change has been accepted; cleared by the next tick
    direction_changed: bool,
}

impl GameEngine {
    /// Create an engine whose high score only lives for this process
    pub fn new(config: GameConfig) -> Self {
        Self::with_store(config, Box::new(MemoryHighScoreStore::new()))
    }

    /// Create an engine that loads and saves its high score through `store`
    pub fn with_store(config: GameConfig, store: Box<dyn HighScoreStore>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let high_score = store.load().unwrap_or_else(|err| {
            warn!("Could not load high score, starting from 0: {err:#}");
            0
        });

        let mut engine = Self {
            snake: Snake::new(config.start),
            speed: config.initial_speed,
            config,
            rng,
            store,
            state: GameState::Idle,
            food: None,
            score: 0,
            high_score,
            steps: 0,
            last_collision: None,
            applied: Direction::None,
            pending: None,
            direction_changed: false,
        };
        engine.reset();
        engine
    }

    /// Reset the game to its idle starting position
    pub fn reset(&mut self) {
        self.snake = Snake::new(self.config.start);
        self.applied = Direction::None;
        self.pending = None;
        self.direction_changed = false;
        self.score = 0;
        self.steps = 0;
        self.speed = self.config.initial_speed;
        self.last_collision = None;
        self.state = GameState::Idle;
        self.food = self.spawn_food();
    }

    /// Start a fresh game; also serves as restart from any state
    pub fn start(&mut self) {
        self.reset();
        self.state = GameState::Running;
        // Queued without claiming the per-tick change, so the player can
        // still pick a different opening move.
        self.pending = Some(self.config.start_direction);
        debug!(
            "Game started at ({}, {}) heading {:?}",
            self.config.start.x, self.config.start.y, self.config.start_direction
        );
    }

    /// Buffer a direction change for the next tick
    ///
    /// Returns whether the request was accepted. Requests are dropped when
    /// the game is not running, when they would reverse the last applied
    /// direction, or when another change was already accepted since the last
    /// tick. Asking for the direction the next tick would use anyway is
    /// accepted without using up that tick's change.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.state != GameState::Running || !direction.is_moving() {
            return false;
        }

        if direction == self.next_direction() {
            return true;
        }

        if self.direction_changed || direction.is_opposite(self.applied) {
            return false;
        }

        self.pending = Some(direction);
        self.direction_changed = true;
        true
    }

    /// Toggle between running and paused; idle and finished games are unaffected
    pub fn toggle_pause(&mut self) -> GameState {
        self.state = match self.state {
            GameState::Running => GameState::Paused,
            GameState::Paused => GameState::Running,
            other => other,
        };
        self.state
    }

    /// Execute one step of the game
    pub fn tick(&mut self) -> TickResult {
        if self.state != GameState::Running {
            return TickResult::skipped();
        }

        if let Some(direction) = self.pending.take() {
            self.applied = direction;
        }
        self.direction_changed = false;

        let new_head = self.snake.head().moved_in_direction(self.applied);

        if !new_head.is_within(self.config.tile_count) {
            self.finish(CollisionType::Wall);
            return TickResult::crashed(CollisionType::Wall, false, false);
        }

        self.snake.push_head(new_head);
        self.steps += 1;

        let ate_food = self.food == Some(new_head);
        let mut new_high_score = false;
        if ate_food {
            new_high_score = self.eat();
        }

        self.snake.trim();

        if self.snake.collides_with_body(new_head) {
            self.finish(CollisionType::SelfCollision);
            return TickResult::crashed(CollisionType::SelfCollision, ate_food, new_high_score);
        }

        TickResult {
            advanced: true,
            terminated: false,
            info: TickInfo {
                ate_food,
                new_high_score,
                collision_type: None,
            },
        }
    }

    /// Grow, score, respawn food and speed up; returns whether the high score moved
    fn eat(&mut self) -> bool {
        self.snake.grow();
        self.score += self.config.food_score;
        self.food = self.spawn_food();
        self.speed = (self.speed + self.config.speed_increment).min(self.config.max_speed);
        debug!(
            "Food eaten: score {}, length {}, speed {:.1}",
            self.score, self.snake.target_length, self.speed
        );

        if self.score <= self.high_score {
            return false;
        }

        self.high_score = self.score;
        info!("New high score: {}", self.high_score);
        if let Err(err) = self.store.save(self.high_score) {
            warn!("Could not save high score {}: {err:#}", self.high_score);
        }
        true
    }

    fn finish(&mut self, collision: CollisionType) {
        self.state = GameState::Over;
        self.last_collision = Some(collision);
        info!(
            "Game over ({:?}) with score {} after {} steps",
            collision, self.score, self.steps
        );
    }

    fn spawn_food(&mut self) -> Option<Position> {
        let food = place_food(
            &mut self.rng,
            &self.snake,
            self.config.tile_count,
            self.config.food_placement_attempts,
        );
        if food.is_none() {
            debug!("Snake fills the grid, no room for food");
        }
        food
    }

    /// Direction the next tick will move in
    fn next_direction(&self) -> Direction {
        self.pending.unwrap_or(self.applied)
    }

    /// Timer period matching the current speed
    pub fn tick_interval(&self) -> Duration {
        // Clamped to 0.01..=MAX_TICK_RATE ticks per second; NaN takes the floor
        let rate = self.speed.max(0.01).min(MAX_TICK_RATE);
        Duration::from_secs_f64(1.0 / f64::from(rate))
    }

    /// Everything a renderer needs for one frame
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: self.state,
            snake: &self.snake,
            food: self.food,
            tile_count: self.config.tile_count,
            score: self.score,
            high_score: self.high_score,
            speed: self.speed,
            steps: self.steps,
            last_collision: self.last_collision,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Option<Position> {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Current speed in ticks per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Direction applied by the most recent tick
    pub fn direction(&self) -> Direction {
        self.applied
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};

    struct FailingStore;

    impl HighScoreStore for FailingStore {
        fn load(&self) -> Result<u32> {
            bail!("disk on fire")
        }

        fn save(&mut self, _high_score: u32) -> Result<()> {
            bail!("disk on fire")
        }
    }

    /// Engine mid-game with a hand-built snake
    fn running_engine(
        segments: Vec<Position>,
        applied: Direction,
        food: Option<Position>,
    ) -> GameEngine {
        let mut engine = GameEngine::new(GameConfig::small().with_seed(42));
        engine.start();
        engine.snake = Snake::from_segments(segments);
        engine.applied = applied;
        engine.pending = None;
        engine.food = food;
        engine
    }

    #[test]
    fn test_reset() {
        let engine = GameEngine::new(GameConfig::default().with_seed(1));

        assert_eq!(engine.state(), GameState::Idle);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.steps(), 0);
        assert_eq!(engine.snake().len(), 1);
        assert_eq!(engine.snake().head(), Position::new(10, 10));
        assert_eq!(engine.direction(), Direction::None);
        assert_eq!(engine.speed(), 7.0);

        let food = engine.food().unwrap();
        assert!(food.is_within(20));
        assert!(!engine.snake().occupies(food));
    }

    #[test]
    fn test_tick_is_noop_unless_running() {
        let mut engine = GameEngine::new(GameConfig::small().with_seed(1));
        let before = engine.snake().clone();

        let result = engine.tick();
        assert!(!result.advanced);
        assert_eq!(engine.snake(), &before);
        assert_eq!(engine.state(), GameState::Idle);
    }

    #[test]
    fn test_start_moves_right() {
        let mut engine = GameEngine::new(GameConfig::small().with_seed(1));
        engine.start();
        engine.food = None;
        assert_eq!(engine.state(), GameState::Running);

        let head = engine.snake().head();
        let result = engine.tick();

        assert!(result.advanced);
        assert!(!result.terminated);
        assert_eq!(engine.direction(), Direction::Right);
        assert_eq!(engine.snake().head(), head.moved_by(1, 0));
        assert_eq!(engine.steps(), 1);
    }

    #[test]
    fn test_opening_move_can_be_overridden() {
        let mut engine = GameEngine::new(GameConfig::small().with_seed(1));
        engine.start();
        engine.food = None;

        assert!(engine.set_direction(Direction::Up));
        engine.tick();

        assert_eq!(engine.direction(), Direction::Up);
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = running_engine(
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
            None,
        );

        assert!(!engine.set_direction(Direction::Left));
        engine.tick();

        assert_eq!(engine.direction(), Direction::Right);
        assert_eq!(engine.snake().head(), Position::new(6, 5));
    }

    #[test]
    fn test_one_direction_change_per_tick() {
        let mut engine = running_engine(
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
            None,
        );

        // Up then Left would fold the snake back onto itself within one tick.
        assert!(engine.set_direction(Direction::Up));
        assert!(!engine.set_direction(Direction::Left));
        engine.tick();
        assert_eq!(engine.snake().head(), Position::new(5, 4));

        // The next tick gets its own change.
        assert!(engine.set_direction(Direction::Left));
        engine.tick();
        assert_eq!(engine.snake().head(), Position::new(4, 4));
        assert_eq!(engine.state(), GameState::Running);
    }

    #[test]
    fn test_repeating_direction_keeps_change_available() {
        let mut engine = running_engine(vec![Position::new(5, 5)], Direction::Right, None);

        assert!(engine.set_direction(Direction::Right));
        assert!(engine.set_direction(Direction::Down));
        engine.tick();
        assert_eq!(engine.direction(), Direction::Down);
    }

    #[test]
    fn test_set_direction_ignored_unless_running() {
        let mut engine = GameEngine::new(GameConfig::small().with_seed(1));
        assert!(!engine.set_direction(Direction::Up));
        assert_eq!(engine.pending_direction(), None);

        engine.start();
        engine.toggle_pause();
        assert!(!engine.set_direction(Direction::Up));
        assert_eq!(engine.pending_direction(), Some(Direction::Right));

        assert!(!GameEngine::new(GameConfig::small()).set_direction(Direction::None));
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = running_engine(
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
            Some(Position::new(6, 5)),
        );

        let result = engine.tick();

        assert!(result.info.ate_food);
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.snake().target_length, 3);
        assert_eq!(engine.snake().len(), 3);
        assert!((engine.speed() - 7.2).abs() < 1e-5);

        let food = engine.food().unwrap();
        assert!(!engine.snake().occupies(food));
    }

    #[test]
    fn test_speed_is_capped() {
        let mut engine = running_engine(vec![Position::new(0, 0)], Direction::Right, None);
        engine.speed = 14.9;
        engine.food = Some(Position::new(1, 0));

        engine.tick();

        assert_eq!(engine.speed(), 15.0);
        assert_eq!(engine.tick_interval(), Duration::from_secs_f64(1.0 / 15.0));
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = running_engine(
            vec![Position::new(0, 5), Position::new(1, 5)],
            Direction::Left,
            None,
        );

        let result = engine.tick();

        assert!(result.terminated);
        assert_eq!(engine.state(), GameState::Over);
        assert_eq!(result.info.collision_type, Some(CollisionType::Wall));
        // The head never leaves the grid.
        assert_eq!(engine.snake().head(), Position::new(0, 5));
        assert_eq!(engine.snapshot().last_collision, Some(CollisionType::Wall));
    }

    #[test]
    fn test_self_collision() {
        // Length 5 heading Right: (5,5) (4,5) (3,5) (2,5) (1,5)
        let body = (1..=5).rev().map(|x| Position::new(x, 5)).collect();
        let mut engine = running_engine(body, Direction::Right, None);

        engine.set_direction(Direction::Down);
        assert!(!engine.tick().terminated);
        engine.set_direction(Direction::Left);
        assert!(!engine.tick().terminated);
        assert_eq!(engine.state(), GameState::Running);

        // Up from (4,6) lands on (4,5), still part of the body.
        engine.set_direction(Direction::Up);
        let result = engine.tick();

        assert!(result.terminated);
        assert_eq!(
            result.info.collision_type,
            Some(CollisionType::SelfCollision)
        );
        assert_eq!(engine.state(), GameState::Over);
    }

    #[test]
    fn test_following_the_tail_is_safe() {
        // A 2x2 loop: the head moves into the cell the tail is leaving.
        let mut engine = running_engine(
            vec![
                Position::new(1, 1),
                Position::new(1, 2),
                Position::new(2, 2),
                Position::new(2, 1),
            ],
            Direction::Up,
            None,
        );

        engine.set_direction(Direction::Right);
        let result = engine.tick();

        assert!(!result.terminated);
        assert_eq!(engine.snake().head(), Position::new(2, 1));
    }

    #[test]
    fn test_pause_toggle() {
        let mut engine = GameEngine::new(GameConfig::small().with_seed(3));
        assert_eq!(engine.toggle_pause(), GameState::Idle);

        engine.start();
        assert_eq!(engine.toggle_pause(), GameState::Paused);
        assert!(!engine.tick().advanced);
        assert_eq!(engine.toggle_pause(), GameState::Running);
        assert!(engine.tick().advanced);
    }

    #[test]
    fn test_over_is_terminal_until_start() {
        let mut engine = running_engine(vec![Position::new(9, 0)], Direction::Right, None);
        engine.tick();
        assert_eq!(engine.state(), GameState::Over);

        assert_eq!(engine.toggle_pause(), GameState::Over);
        assert!(!engine.tick().advanced);

        engine.start();
        assert_eq!(engine.state(), GameState::Running);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.snapshot().last_collision, None);
    }

    #[test]
    fn test_high_score_is_saved_and_survives_reset() {
        let store = MemoryHighScoreStore::with_value(10);
        let mut engine = GameEngine::with_store(
            GameConfig::small().with_seed(5),
            Box::new(store.clone()),
        );
        assert_eq!(engine.high_score(), 10);

        engine.start();
        engine.snake = Snake::new(Position::new(2, 2));
        engine.food = Some(Position::new(3, 2));
        assert!(!engine.tick().info.new_high_score);
        assert_eq!(store.save_count(), 0);

        engine.set_direction(Direction::Down);
        engine.food = Some(Position::new(3, 3));
        assert!(engine.tick().info.new_high_score);
        assert_eq!(engine.high_score(), 20);
        assert_eq!(store.value(), 20);

        engine.reset();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.high_score(), 20);
    }

    #[test]
    fn test_store_failures_do_not_stop_play() {
        let mut engine = GameEngine::with_store(
            GameConfig::small().with_seed(5),
            Box::new(FailingStore),
        );
        assert_eq!(engine.high_score(), 0);

        engine.start();
        engine.snake = Snake::new(Position::new(2, 2));
        engine.food = Some(Position::new(3, 2));

        let result = engine.tick();
        assert!(result.info.new_high_score);
        assert_eq!(engine.high_score(), 10);
        assert_eq!(engine.state(), GameState::Running);
    }

    #[test]
    fn test_full_grid_leaves_no_food() {
        let mut config = GameConfig::new(2);
        config.start = Position::new(0, 0);
        let mut engine = GameEngine::new(config.with_seed(11));
        engine.start();
        engine.snake = Snake::from_segments(vec![
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(1, 1),
        ]);
        engine.food = Some(Position::new(1, 0));

        let result = engine.tick();

        assert!(result.info.ate_food);
        assert_eq!(engine.food(), None);
        assert_eq!(engine.snake().len(), 4);
        assert_eq!(engine.state(), GameState::Running);
    }

    #[test]
    fn test_tick_interval_follows_speed() {
        let engine = GameEngine::new(GameConfig::default());
        assert_eq!(engine.tick_interval(), Duration::from_secs_f64(1.0 / 7.0));
    }

    #[test]
    fn test_tick_interval_never_reaches_zero() {
        let mut engine = GameEngine::new(GameConfig::default());

        for speed in [f32::INFINITY, 1e10, f32::NAN, 0.0] {
            engine.speed = speed;
            let period = engine.tick_interval();
            assert!(!period.is_zero(), "speed {speed} gave a zero period");
        }

        engine.speed = f32::INFINITY;
        assert_eq!(
            engine.tick_interval(),
            Duration::from_secs_f64(1.0 / f64::from(MAX_TICK_RATE))
        );
    }

    #[test]
    fn test_restart_restores_initial_speed() {
        let mut engine = running_engine(
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
            Some(Position::new(6, 5)),
        );
        engine.tick();
        assert!(engine.speed() > 7.0);

        engine.start();
        assert_eq!(engine.speed(), 7.0);
        assert_eq!(engine.tick_interval(), Duration::from_secs_f64(1.0 / 7.0));
    }
}
