pub mod charting;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::time::Instant;

use crate::{game::Game, stimulus::Bounds, stimulus::GameColor};

const HORIZONTAL_MARGIN: u16 = 2;
const HEADER_LINES: u16 = 2;
const FOOTER_LINES: u16 = 2;

/// Everything a frame needs: the game and the instant the frame was taken at
pub struct GameView<'a> {
    pub game: &'a Game,
    pub now: Instant,
}

impl<'a> GameView<'a> {
    pub fn new(game: &'a Game, now: Instant) -> Self {
        Self { game, now }
    }
}

impl Widget for &GameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.game.phase()).render(self, area, buf);
    }
}

/// Split the frame into header, play field and footer
pub(crate) fn play_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(HEADER_LINES),
            Constraint::Min(1),
            Constraint::Length(FOOTER_LINES),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Region slots are drawn in, in terminal cells, border included. The frame
/// loop hands this to the game so placement and pointer hits agree with what
/// is drawn.
pub fn play_area(area: Rect) -> Bounds {
    let [_, field, _] = play_layout(area);
    Bounds::new(field.x, field.y, field.width, field.height)
}

pub(crate) fn to_rect(b: Bounds) -> Rect {
    Rect::new(b.x, b.y, b.width, b.height)
}

pub(crate) fn fill(color: GameColor) -> Color {
    match color {
        GameColor::Red => Color::Red,
        GameColor::Blue => Color::Blue,
        GameColor::Yellow => Color::Yellow,
        GameColor::Green => Color::Green,
    }
}

/// Label ink that stays readable on top of `fill`
pub(crate) fn ink(color: GameColor) -> Color {
    match color {
        GameColor::Yellow | GameColor::Green => Color::Black,
        GameColor::Red | GameColor::Blue => Color::White,
    }
}

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style {
    bold().add_modifier(Modifier::DIM)
}

pub(crate) fn hint() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}
