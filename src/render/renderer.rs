use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::game::state::grid_limit;
use crate::game::{CollisionType, GameState, Position, Snapshot};
use crate::metrics::GameMetrics;

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Head,
    Body,
    Food,
    Empty,
}

impl Cell {
    pub fn at(snapshot: &Snapshot<'_>, pos: Position) -> Self {
        if pos == snapshot.snake.head() {
            Cell::Head
        } else if snapshot.snake.occupies(pos) {
            Cell::Body
        } else if snapshot.food == Some(pos) {
            Cell::Food
        } else {
            Cell::Empty
        }
    }

    fn span(self) -> Span<'static> {
        match self {
            Cell::Head => Span::styled(
                "■ ",
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::Body => Span::styled("□ ", Style::default().fg(Color::Green)),
            Cell::Food => Span::styled(
                "● ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Cell::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
        }
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, snapshot: &Snapshot<'_>, metrics: &GameMetrics) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(snapshot, metrics);
        frame.render_widget(stats, chunks[0]);

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        let grid_area = grid_rect(game_area, snapshot.tile_count);
        frame.render_widget(self.render_grid(snapshot), grid_area);

        let banner = match snapshot.state {
            GameState::Running => None,
            GameState::Idle => Some((self.idle_banner(snapshot), Color::Green)),
            GameState::Paused => Some((self.paused_banner(), Color::Yellow)),
            GameState::Over => Some((self.game_over_banner(snapshot), Color::Red)),
        };
        if let Some((lines, colour)) = banner {
            let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX);
            let area = centred_rect(grid_area, BANNER_WIDTH, height, game_area);
            frame.render_widget(Clear, area);
            frame.render_widget(self.render_banner(lines, colour), area);
        }

        let controls = self.render_controls(chunks[2]);
        frame.render_widget(controls, chunks[2]);
    }

    fn render_grid(&self, snapshot: &Snapshot<'_>) -> Paragraph<'_> {
        let size = grid_limit(snapshot.tile_count);
        let lines: Vec<Line> = (0..size)
            .map(|y| {
                (0..size)
                    .map(|x| Cell::at(snapshot, Position::new(x, y)).span())
                    .collect::<Vec<_>>()
                    .into()
            })
            .collect();

        let (title, border) = if snapshot.state == GameState::Paused {
            (" Snake - PAUSED ", Color::Yellow)
        } else {
            (" Snake ", Color::White)
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(border))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, snapshot: &Snapshot<'_>, metrics: &GameMetrics) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let text = vec![Line::from(vec![
            Span::styled("Score: ", label),
            Span::styled(snapshot.score.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(snapshot.high_score.to_string(), value),
            Span::raw("    "),
            Span::styled("Speed: ", label),
            Span::styled(format!("{:.1}", snapshot.speed), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(metrics.format_time(), value),
            Span::raw("    "),
            Span::styled("Games: ", label),
            Span::styled(metrics.games_played.to_string(), value),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    /// Boxed message drawn over the grid
    fn render_banner(&self, lines: Vec<Line<'static>>, colour: Color) -> Paragraph<'static> {
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(colour)),
        )
    }

    fn idle_banner(&self, snapshot: &Snapshot<'_>) -> Vec<Line<'static>> {
        vec![
            Line::from(vec![Span::styled(
                "SNAKE",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Best score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    snapshot.high_score.to_string(),
                    Style::default().fg(Color::White),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Enter",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to start", Style::default().fg(Color::Gray)),
            ]),
        ]
    }

    fn paused_banner(&self) -> Vec<Line<'static>> {
        vec![
            Line::from(vec![Span::styled(
                "PAUSED",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Space",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to resume", Style::default().fg(Color::Gray)),
            ]),
        ]
    }

    fn game_over_banner(&self, snapshot: &Snapshot<'_>) -> Vec<Line<'static>> {
        let cause = match snapshot.last_collision {
            Some(CollisionType::Wall) => "Hit the wall",
            Some(CollisionType::SelfCollision) => "Bit your own tail",
            None => "",
        };

        vec![
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(Span::styled(cause, Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    snapshot.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("    "),
                Span::styled("Best: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    snapshot.high_score.to_string(),
                    Style::default().fg(Color::White),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ]
    }

    fn render_controls(&self, _area: Rect) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" / "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" / drag to move | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("Enter", Style::default().fg(Color::Green)),
            Span::raw(" start | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

/// Outer width of the Idle, Paused and Over banners
const BANNER_WIDTH: u16 = 36;

/// Bordered grid of `tile_count` two-column cells, centred in `area`
fn grid_rect(area: Rect, tile_count: usize) -> Rect {
    let side = |cells: usize| u16::try_from(cells.saturating_add(2)).unwrap_or(u16::MAX);
    centred_rect(area, side(tile_count.saturating_mul(2)), side(tile_count), area)
}

/// Rect of at most `width` x `height` centred on `anchor` and kept inside `bounds`
fn centred_rect(anchor: Rect, width: u16, height: u16, bounds: Rect) -> Rect {
    let width = width.min(bounds.width);
    let height = height.min(bounds.height);
    let cx = anchor.x + anchor.width / 2;
    let cy = anchor.y + anchor.height / 2;
    let x = cx
        .saturating_sub(width / 2)
        .clamp(bounds.x, bounds.right() - width);
    let y = cy
        .saturating_sub(height / 2)
        .clamp(bounds.y, bounds.bottom() - height);
    Rect::new(x, y, width, height)
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
