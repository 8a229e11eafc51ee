//! Layout and drawing: playfield, ghost, next preview, stats, pause and game-over overlays.

use crate::app::{ScorePopup, Screen};
use crate::game::{COLS, Cell, GameState, ROWS};
use crate::piece::Shape;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

/// Each grid cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const BOARD_WIDTH: u16 = COLS as u16 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = ROWS as u16 + 2;
const SIDEBAR_WIDTH: u16 = 24;

const BLOCK: &str = "██";
const GHOST: &str = "░░";

/// Everything a frame needs, borrowed from the app.
pub struct View<'a> {
    pub state: &'a GameState,
    pub theme: &'a Theme,
    pub screen: Screen,
    pub ghost: bool,
    pub popups: &'a [ScorePopup],
}

pub fn draw(frame: &mut Frame, view: &View) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(view.theme.bg))
        .render(area, frame.buffer_mut());

    let (board_area, sidebar_area) = game_layout(area);
    draw_playfield(frame, view, board_area);
    draw_sidebar(frame, view, sidebar_area);

    match view.screen {
        Screen::Playing => {}
        Screen::Paused => draw_pause_overlay(frame, view.theme, area),
        Screen::GameOver => draw_game_over(frame, view, area),
    }
}

/// Board and sidebar, centred as one unit.
fn game_layout(area: Rect) -> (Rect, Rect) {
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_WIDTH + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (inner[0], inner[1])
}

fn border_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

/// Paint one grid cell; anything outside `board` is skipped.
fn put_cell(buf: &mut Buffer, board: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
        return;
    };
    let rx = board.x + x * CELL_WIDTH;
    let ry = board.y + y;
    if rx + CELL_WIDTH <= board.right() && ry < board.bottom() {
        buf.set_string(rx, ry, symbol, style);
    }
}

fn draw_playfield(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let block = border_block(theme).title(Span::styled(
        " Blockfall ",
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
    ));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let empty = Style::default().bg(theme.bg);
    for (y, row) in state.playfield().rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let (symbol, style) = match *cell {
                Cell::Block(color) => (BLOCK, empty.fg(theme.piece_color(color))),
                Cell::Empty => ("  ", empty),
            };
            put_cell(buf, board, x as i32, y as i32, symbol, style);
        }
    }

    let piece = state.active_piece();
    if view.ghost {
        if let Some((gx, gy)) = state.ghost_position() {
            let ghost = empty.fg(theme.inactive_fg);
            for (col, row) in piece.shape.cells() {
                let (x, y) = (gx + col as i32, gy + row as i32);
                let free = usize::try_from(x)
                    .ok()
                    .zip(usize::try_from(y).ok())
                    .and_then(|(x, y)| state.playfield().get(x, y))
                    .is_some_and(|c| !c.is_filled());
                if free {
                    put_cell(buf, board, x, y, GHOST, ghost);
                }
            }
        }
    }

    let active = empty.fg(theme.piece_color(piece.color));
    for (x, y) in piece.cells() {
        put_cell(buf, board, x, y, BLOCK, active);
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Next
            Constraint::Length(1),
            Constraint::Length(6), // Stats
            Constraint::Length(1),
            Constraint::Min(0), // Keys
        ])
        .split(area);

    // Next
    let next_block = border_block(theme).title(Span::styled(" Next ", title_style));
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let next = state.next_piece();
    draw_preview(
        frame.buffer_mut(),
        next_inner,
        &next.shape(),
        Style::default().fg(theme.piece_color(next.color)).bg(theme.bg),
    );

    // Stats
    let stats_block = border_block(theme);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let mut lines = vec![
        stat("Score: ", state.score().to_string()),
        stat("Level: ", state.level().to_string()),
        stat("Lines: ", state.lines_cleared().to_string()),
    ];
    if let Some(popup) = view.popups.last() {
        let label = if popup.lines > 1 {
            format!("+{} ({} lines)", popup.amount, popup.lines)
        } else {
            format!("+{}", popup.amount)
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )));
    }
    Paragraph::new(Text::from(lines)).render(stats_inner, frame.buffer_mut());

    // Keys
    let keys_block = border_block(theme);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let hints = [
        "←/→ h/l  move",
        "↑ k      rotate",
        "↓ j      soft drop",
        "Space    hard drop",
        "P Esc    pause",
        "Q        quit",
    ];
    let lines: Vec<Line> = hints
        .iter()
        .map(|h| Line::from(Span::styled(*h, hint_style)))
        .collect();
    Paragraph::new(Text::from(lines)).render(keys_inner, frame.buffer_mut());
}

/// Shape centred in `area` at full cell size.
fn draw_preview(buf: &mut Buffer, area: Rect, shape: &Shape, style: Style) {
    let w = shape.width() as u16 * CELL_WIDTH;
    let h = shape.height() as u16;
    let origin = Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    for (col, row) in shape.cells() {
        put_cell(buf, origin, col as i32, row as i32, BLOCK, style);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 30, 6);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "P Resume  R Restart  Q Quit",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(border_block(theme))
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let fg = Style::default().fg(theme.main_fg);
    let popup = centered(area, 30, 10);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default()
                .fg(theme.main_fg)
                .bg(theme.piece_color(6))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Score: {}", state.score()), fg)),
        Line::from(Span::styled(format!("Lines: {}", state.lines_cleared()), fg)),
        Line::from(Span::styled(format!("Level: {}", state.level()), fg)),
        Line::from(""),
        Line::from(Span::styled("R Restart    Q Quit", fg)),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(border_block(theme))
        .render(popup, frame.buffer_mut());
}
