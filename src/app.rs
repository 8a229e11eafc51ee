//! App: terminal init, main loop, tick and key handling.

use crate::{DEFAULT_FRAME_RATE, DisplayOptions};
use crate::game::{Cell, GameEvent, GameState, SessionConfig};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Lifetime of a "+N" popup.
const POPUP_LIFETIME_MS: u32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    GameOver,
}

/// Score popup shown after a line clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePopup {
    pub amount: u32,
    pub lines: u32,
    pub age_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: SessionConfig,
    display: DisplayOptions,
    seed: Option<u64>,
    theme: Theme,
    state: GameState,
    screen: Screen,
    popups: Vec<ScorePopup>,
    /// Sessions started so far; offsets a fixed seed so restarts get a fresh sequence.
    games_started: u64,
    last_frame: Instant,
}

fn new_session(config: SessionConfig, seed: Option<u64>, games_started: u64) -> GameState {
    match seed {
        Some(seed) => GameState::with_seed(config, seed.wrapping_add(games_started), Instant::now()),
        None => GameState::new(config),
    }
}

impl App {
    pub fn new(
        config: SessionConfig,
        display: DisplayOptions,
        seed: Option<u64>,
        theme: Theme,
    ) -> Self {
        Self {
            config,
            display,
            seed,
            theme,
            state: new_session(config, seed, 0),
            screen: Screen::Playing,
            popups: Vec::new(),
            games_started: 0,
            last_frame: Instant::now(),
        }
    }

    fn restart(&mut self) {
        self.games_started += 1;
        self.state = new_session(self.config, self.seed, self.games_started);
        self.screen = Screen::Playing;
        self.popups.clear();
        info!(
            game = self.games_started,
            level = self.state.config().level,
            fall_ms = self.state.fall_interval().as_millis() as u64,
            "restarted"
        );
    }

    fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.display.frame_rate)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / DEFAULT_FRAME_RATE))
    }

    fn handle_action(&mut self, action: Action, now: Instant) -> Flow {
        match (self.screen, action) {
            (_, Action::Quit) => return Flow::Quit,
            (Screen::Playing, Action::Pause) => {
                self.screen = Screen::Paused;
                debug!("paused");
            }
            (Screen::Playing, _) => {
                if let Some(command) = action.command() {
                    self.state.apply(command);
                    self.drain_events();
                }
            }
            (Screen::Paused, Action::Pause) => {
                // Paused time must not count towards the next gravity step.
                self.state.reset_fall_timer(now);
                self.screen = Screen::Playing;
                debug!("resumed");
            }
            (Screen::Paused | Screen::GameOver, Action::Restart) => self.restart(),
            _ => {}
        }
        Flow::Continue
    }

    fn drain_events(&mut self) {
        for event in self.state.take_events() {
            match event {
                GameEvent::LinesCleared {
                    rows,
                    points,
                    anchor,
                } => {
                    for row in &rows {
                        debug!(y = row.y, cells = ?row.cells.map(Cell::code), "row cleared");
                    }
                    if self.state.playfield().is_empty() {
                        info!(?anchor, "playfield cleared");
                    }
                    self.popups.push(ScorePopup {
                        amount: points,
                        lines: rows.len() as u32,
                        age_ms: 0,
                    });
                }
                GameEvent::HardDropped {
                    anchor,
                    shape,
                    distance,
                } => debug!(?anchor, width = shape.width(), distance, "hard drop"),
            }
        }
        if self.screen == Screen::Playing && self.state.is_game_over() {
            self.screen = Screen::GameOver;
        }
    }

    /// Per-frame step: gravity while playing, popup ageing always.
    fn update(&mut self, now: Instant, delta: Duration) {
        if self.screen == Screen::Playing {
            self.state.tick(now);
            self.drain_events();
        }
        let delta_ms = u32::try_from(delta.as_millis()).unwrap_or(u32::MAX);
        self.tick_popups(delta_ms);
    }

    fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            p.age_ms = p.age_ms.saturating_add(delta_ms);
            p.age_ms < POPUP_LIFETIME_MS
        });
    }

    fn view(&self) -> View<'_> {
        View {
            state: &self.state,
            theme: &self.theme,
            screen: self.screen,
            ghost: self.display.ghost,
            popups: &self.popups,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;

        // Release/repeat reporting where the terminal supports it.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        info!(
            score = self.state.score(),
            lines = self.state.lines_cleared(),
            "exiting"
        );
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_frame = Instant::now();
        self.state.reset_fall_timer(self.last_frame);
        loop {
            let frame_start = Instant::now();
            terminal.draw(|f| ui::draw(f, &self.view()))?;

            let timeout = self.frame_interval().saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let action = key_to_action(key);
                        let accepted = match key.kind {
                            KeyEventKind::Press => true,
                            KeyEventKind::Repeat => action.repeats(),
                            KeyEventKind::Release => false,
                        };
                        if accepted && self.handle_action(action, Instant::now()) == Flow::Quit {
                            return Ok(());
                        }
                    }
                }
            }

            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            self.update(now, delta);
        }
    }
}
