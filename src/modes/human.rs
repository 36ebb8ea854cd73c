use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{debug, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, interval_at};

use crate::game::{Direction, GameConfig, GameEngine, GameState};
use crate::input::{InputHandler, KeyAction, SwipeTracker};
use crate::metrics::GameMetrics;
use crate::render::Renderer;
use crate::storage::HighScoreStore;

/// Interactive play in the terminal
///
/// Owns the engine and drives it from a timer whose period follows the
/// engine's speed. Keyboard and mouse input only buffer intent on the engine;
/// the board is redrawn after every tick, start and pause toggle.
pub struct HumanMode {
    engine: GameEngine,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    swipe_tracker: SwipeTracker,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig, store: Box<dyn HighScoreStore>) -> Self {
        Self {
            engine: GameEngine::with_store(config, store),
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            swipe_tracker: SwipeTracker::default(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        info!(
            "Session started on a {0}x{0} grid, best score {1}",
            self.engine.config().tile_count,
            self.engine.high_score()
        );

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        info!(
            "Session ended after {} games, best score {}",
            self.metrics.games_played,
            self.engine.high_score()
        );

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = new_tick_timer(self.engine.tick_interval());

        // The clock in the header only needs a refresh once a second
        let mut clock_timer = interval(Duration::from_secs(1));

        self.draw(terminal)?;

        loop {
            let mut redraw = false;

            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => redraw = self.handle_event(event),
                        Some(Err(err)) => return Err(err).context("Failed to read terminal event"),
                        None => self.should_quit = true,
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    redraw = self.update_game();
                }

                _ = clock_timer.tick() => {
                    redraw = self.engine.state() == GameState::Running;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }

            // Speed changes with food and resets with every new game
            let period = self.engine.tick_interval();
            if tick_timer.period() != period {
                debug!("Tick period now {:?}", period);
                tick_timer = new_tick_timer(period);
            }

            if redraw {
                self.draw(terminal)?;
            }
        }

        Ok(())
    }

    fn draw(&mut self, terminal: &mut Terminal<CrosstermBackend<Stderr>>) -> Result<()> {
        self.metrics.update();
        let snapshot = self.engine.snapshot();
        terminal
            .draw(|frame| {
                self.renderer.render(frame, &snapshot, &self.metrics);
            })
            .context("Failed to draw frame")?;
        Ok(())
    }

    /// Apply one terminal event; returns whether the screen needs a redraw
    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => {
                // Only process key press events, not release
                if key.kind != KeyEventKind::Press {
                    return false;
                }
                let action = self.input_handler.handle_key_event(key);
                self.apply(action)
            }
            Event::Mouse(mouse) => match self.swipe_tracker.handle_mouse_event(mouse) {
                Some(direction) => self.apply(KeyAction::Steer(direction)),
                None => false,
            },
            Event::Resize(_, _) => true,
            _ => false,
        }
    }

    fn apply(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::Steer(direction) => {
                self.steer(direction);
                false
            }
            KeyAction::TogglePause => {
                let before = self.engine.state();
                let after = self.engine.toggle_pause();
                if before != after {
                    debug!("{:?} -> {:?}", before, after);
                }
                before != after
            }
            KeyAction::Start => {
                self.start_game();
                true
            }
            KeyAction::Quit => {
                self.should_quit = true;
                false
            }
            KeyAction::None => false,
        }
    }

    fn steer(&mut self, direction: Direction) {
        if !self.engine.set_direction(direction) {
            debug!("Ignored turn to {:?}", direction);
        }
    }

    /// Advance the engine one tick; returns whether anything moved
    fn update_game(&mut self) -> bool {
        let result = self.engine.tick();

        // Track game over
        if result.terminated {
            self.metrics.on_game_over();
        }

        result.advanced
    }

    fn start_game(&mut self) {
        if self.engine.state() == GameState::Running || self.engine.state() == GameState::Paused {
            info!("Restarting with score {}", self.engine.score());
        }
        self.engine.start();
        self.metrics.on_game_start();
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

/// Interval that first fires one period from now
fn new_tick_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryHighScoreStore;
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };

    fn mode() -> HumanMode {
        HumanMode::new(
            GameConfig::default().with_seed(8),
            Box::new(MemoryHighScoreStore::new()),
        )
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_game_initialization() {
        let mode = mode();
        assert_eq!(mode.engine.state(), GameState::Idle);
        assert_eq!(mode.engine.score(), 0);
        assert!(!mode.should_quit);
    }

    #[test]
    fn test_start_and_steer() {
        let mut mode = mode();

        assert!(mode.handle_event(key(KeyCode::Enter)));
        assert_eq!(mode.engine.state(), GameState::Running);

        mode.handle_event(key(KeyCode::Down));
        assert!(mode.update_game());
        assert_eq!(mode.engine.direction(), Direction::Down);
    }

    #[test]
    fn test_pause_key() {
        let mut mode = mode();
        // Nothing to pause before a game starts
        assert!(!mode.handle_event(key(KeyCode::Char(' '))));

        mode.handle_event(key(KeyCode::Enter));
        assert!(mode.handle_event(key(KeyCode::Char(' '))));
        assert_eq!(mode.engine.state(), GameState::Paused);
        assert!(!mode.update_game());
    }

    #[test]
    fn test_swipe_steers() {
        let mut mode = mode();
        mode.handle_event(key(KeyCode::Enter));

        mode.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 40, 20));
        mode.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 41, 12));
        mode.update_game();

        assert_eq!(mode.engine.direction(), Direction::Up);
    }

    #[test]
    fn test_game_over_is_counted() {
        let mut mode = mode();
        mode.handle_event(key(KeyCode::Enter));
        mode.handle_event(key(KeyCode::Up));
        while mode.update_game() {}

        assert_eq!(mode.engine.state(), GameState::Over);
        assert_eq!(mode.metrics.games_played, 1);
    }

    #[test]
    fn test_restart_resets_score() {
        let mut mode = mode();
        mode.handle_event(key(KeyCode::Enter));
        mode.update_game();
        mode.handle_event(key(KeyCode::Char('r')));

        assert_eq!(mode.engine.state(), GameState::Running);
        assert_eq!(mode.engine.score(), 0);
        assert_eq!(mode.engine.steps(), 0);
    }

    #[test]
    fn test_quit_key() {
        let mut mode = mode();
        mode.handle_event(key(KeyCode::Char('q')));
        assert!(mode.should_quit);
    }
}
