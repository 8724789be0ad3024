use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget, Wrap},
};
use time_humanize::HumanTime;

use crate::{
    game::SettingsItem,
    session::{Feedback, Flash, Phase},
    ui::{bold, charting, dim, fill, hint, ink, play_layout, to_rect, GameView},
};

pub const RANKINGS_SHOWN: usize = 10;

/// A UI Screen boundary: draws one phase of the game
pub trait Screen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer);
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: Phase) -> Box<dyn Screen> {
    match phase {
        Phase::NameEntry => Box::new(NameEntryScreen),
        Phase::Instructions | Phase::Countdown => Box::new(InstructionsScreen),
        Phase::Playing => Box::new(PlayScreen),
        Phase::Results => Box::new(ResultsScreen),
        Phase::Rankings | Phase::Exit => Box::new(RankingsScreen),
        Phase::Settings => Box::new(SettingsScreen),
    }
}

/// Render `lines` centered both ways inside `area`
fn centered(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(area.height);
    let top = (area.height - height) / 2;
    let target = Rect::new(area.x, area.y + top, area.width, height);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(target, buf);
}

pub struct NameEntryScreen;

impl Screen for NameEntryScreen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer) {
        let name = &view.game.session().player_name;
        centered(
            vec![
                Line::styled("BRAIN AGE", bold().fg(Color::Magenta)),
                Line::default(),
                Line::styled("ENTER YOUR NAME", bold()),
                Line::from(vec![
                    Span::styled(name.clone(), bold().fg(Color::Cyan)),
                    Span::styled("_", dim()),
                ]),
                Line::default(),
                Line::styled("(enter) confirm", hint()),
            ],
            area,
            buf,
        );
    }
}

pub struct InstructionsScreen;

impl Screen for InstructionsScreen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer) {
        let session = view.game.session();
        let mut lines = vec![
            Line::styled(format!("HI {}!", session.player_name), bold().fg(Color::Cyan)),
            Line::default(),
            Line::raw("A colored block flashes up with a color name written on it."),
            Line::raw("If the word matches the block's color, hit that color's key fast:"),
            Line::from(vec![
                Span::styled("(r) RED  ", bold().fg(Color::Red)),
                Span::styled("(b) BLUE  ", bold().fg(Color::Blue)),
                Span::styled("(y) YELLOW  ", bold().fg(Color::Yellow)),
                Span::styled("(g) GREEN", bold().fg(Color::Green)),
            ]),
            Line::raw("or click the block. If the word names another color, hold still."),
            Line::raw("Fast answers score more, wrong answers cost a point."),
            Line::default(),
        ];
        if session.phase == Phase::Countdown {
            let text = match session.countdown_current {
                n if n > 0 => n.to_string(),
                _ => "GO!".to_string(),
            };
            lines.push(Line::styled(text, bold().fg(Color::Yellow)));
        } else {
            lines.push(Line::styled("press any key to start", hint()));
        }
        centered(lines, area, buf);
    }
}

pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer) {
        let game = view.game;
        let session = game.session();
        let [header, field, footer] = play_layout(area);

        let header_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(header);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(header_rows[0]);

        Paragraph::new(Span::styled(format!("SCORE {}", session.score()), bold()))
            .render(columns[0], buf);
        Paragraph::new(Span::styled(
            format!("PROGRESS {}/{}", session.slot_index, game.sequencer().len()),
            dim(),
        ))
        .alignment(Alignment::Center)
        .render(columns[1], buf);
        Paragraph::new(Span::styled(session.player_name.clone(), bold().fg(Color::Cyan)))
            .alignment(Alignment::Right)
            .render(columns[2], buf);

        // the bubble names the doubled award, not the streak length
        if session.combo.and_then(|c| c.visible_at(view.now)).is_some() {
            Paragraph::new(Span::styled("COMBO! +2", bold().fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(header_rows[1], buf);
        }

        Block::bordered().border_style(dim()).render(field, buf);

        if let Some(slot) = session.live_slot() {
            let rect = to_rect(slot.bounds).intersection(field);
            if !rect.is_empty() {
                Paragraph::new(vec![
                    Line::default(),
                    Line::styled(slot.label(), bold().fg(ink(slot.target_color))),
                ])
                .alignment(Alignment::Center)
                .style(Style::default().bg(fill(slot.target_color)))
                .render(rect, buf);
            }
        }

        let mut spans = Vec::new();
        if let Some(feedback) = session.feedback.and_then(|f| f.visible_at(view.now)) {
            spans.push(match feedback {
                Feedback::Gain { points, perfect: true } => {
                    Span::styled(format!("+{points} PERFECT!"), bold().fg(Color::Yellow))
                }
                Feedback::Gain { points, .. } => {
                    Span::styled(format!("+{points}"), bold().fg(Color::Green))
                }
                Feedback::Penalty { points } => {
                    Span::styled(format!("{points}"), bold().fg(Color::Red))
                }
            });
            spans.push(Span::raw("   "));
        }
        if let Some(flash) = session.flash.and_then(|f| f.visible_at(view.now)) {
            spans.push(match flash {
                Flash::Latency(secs) => Span::styled(format!("{secs:.3}s"), dim()),
                Flash::Miss => Span::styled("MISS!", bold().fg(Color::Red)),
            });
        }

        Paragraph::new(vec![
            Line::from(spans),
            Line::styled("(r)ed (b)lue (y)ellow (g)reen when word and color agree", hint()),
        ])
        .alignment(Alignment::Center)
        .render(footer, buf);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer) {
        let game = view.game;
        let session = game.session();
        let age = game.brain_age();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(2)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(2), // score
                Constraint::Length(2), // brain age
                Constraint::Length(3), // message
                Constraint::Length(2), // reaction times
                Constraint::Min(1),    // chart
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Line::styled(
            format!(
                "{}   SCORE {}   MAX COMBO {}",
                session.player_name,
                session.score(),
                session.max_combo()
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Line::styled(
            format!("BRAIN AGE {}", age.age),
            bold().fg(Color::Magenta),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(age.message)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let summary = match game.latency_summary() {
            Some(s) => Line::styled(
                format!(
                    "AVG {:.3}s   FASTEST {:.3}s   SLOWEST {:.3}s   ({} responses, {:.3} sd)",
                    s.average, s.fastest, s.slowest, s.count, s.spread
                ),
                bold(),
            ),
            None => Line::styled("NO VALID CLICKS RECORDED", bold().fg(Color::Red)),
        };
        Paragraph::new(summary)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let points = charting::latency_points(session.latencies());
        if !points.is_empty() {
            let (responses, slowest) = charting::compute_chart_params(&points);
            let datasets = vec![Dataset::default()
                .marker(Marker::Braille)
                .style(Style::default().fg(Color::Magenta))
                .graph_type(GraphType::Line)
                .data(&points)];
            Chart::new(datasets)
                .x_axis(
                    Axis::default()
                        .title("response")
                        .bounds([1.0, responses])
                        .labels(vec![
                            Span::styled("1", bold()),
                            Span::styled(charting::format_label(responses), bold()),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .title("seconds")
                        .bounds([0.0, slowest])
                        .labels(vec![
                            Span::styled("0", bold()),
                            Span::styled(charting::format_label(slowest), bold()),
                        ]),
                )
                .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled("press any key to see the rankings", hint()))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}

/// "3 minutes ago" style stamp for a ranking row
pub fn played_ago(at: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - at).num_seconds().max(0);
    HumanTime::from_seconds(-secs).to_string()
}

pub struct RankingsScreen;

impl Screen for RankingsScreen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer) {
        let game = view.game;
        let player = &game.session().player_name;
        let now = Local::now();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(2)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        let title = match game.ledger().rank_of(player) {
            Some(rank) => format!("RANKINGS   you are #{rank}"),
            None => "RANKINGS".to_string(),
        };
        Paragraph::new(Span::styled(title, bold().fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let rows = game
            .ledger()
            .top(RANKINGS_SHOWN)
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if entry.name == *player {
                    bold().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(format!("#{}", i + 1)),
                    Cell::from(entry.name.clone()),
                    Cell::from(entry.score.to_string()),
                    Cell::from(
                        entry
                            .avg_latency
                            .map_or_else(|| "-".to_string(), |v| format!("{v:.3}")),
                    ),
                    Cell::from(
                        entry
                            .played_at
                            .map_or_else(String::new, |at| played_ago(at, now)),
                    ),
                ])
                .style(style)
            })
            .collect::<Vec<Row>>();

        Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Min(10),
                Constraint::Length(7),
                Constraint::Length(8),
                Constraint::Length(18),
            ],
        )
        .header(Row::new(vec!["RANK", "NAME", "SCORE", "AVG RT", "PLAYED"]).style(dim()))
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            "(esc) quit / (s) settings / any other key: next player",
            hint(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }
}

pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, view: &GameView, area: Rect, buf: &mut Buffer) {
        let game = view.game;
        let settings = game.settings();

        let mut lines = vec![Line::styled("SETTINGS", bold().fg(Color::Magenta)), Line::default()];
        for item in SettingsItem::ALL {
            let value = match item {
                SettingsItem::Bgm => (if settings.bgm_enabled { "ON" } else { "OFF" }).to_string(),
                SettingsItem::BgmVolume => format!("{:.2}", settings.bgm_volume),
                SettingsItem::SfxVolume => format!("{:.2}", settings.sfx_volume),
                SettingsItem::Back => String::new(),
            };
            let selected = item == game.settings_cursor();
            let marker = if selected { "> " } else { "  " };
            let style = if selected { bold().fg(Color::Yellow) } else { Style::default() };
            lines.push(Line::styled(format!("{marker}{item}  {value}"), style));
        }
        lines.push(Line::default());
        lines.push(Line::styled(
            "(up/down) move  (left/right) volume  (enter) toggle  (esc) back",
            hint(),
        ));
        centered(lines, area, buf);
    }
}
