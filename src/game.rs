//! Game state: playfield, active and next piece, collision, locking, line clears, gravity.

use crate::piece::{Shape, TetrominoKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Playfield width in cells.
pub const COLS: usize = 10;
/// Playfield height in cells.
pub const ROWS: usize = 20;
/// Number of piece colours; a piece's colour index is in `0..COLOR_COUNT`.
pub const COLOR_COUNT: u8 = 7;

/// Gravity at level 1; each further level removes `FALL_STEP_MS`, never below `MIN_FALL_MS`.
const BASE_FALL_MS: u64 = 1000;
const FALL_STEP_MS: u64 = 100;
const MIN_FALL_MS: u64 = 50;

const POINTS_PER_LINE: u32 = 10;

/// Options fixed for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Starting level (>= 1). Only affects fall speed.
    pub level: u32,
    /// Draw from I, O, T, L, J only.
    pub exclude_s_and_z: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level: 1,
            exclude_s_and_z: false,
        }
    }
}

impl SessionConfig {
    /// Time between gravity steps: `max(50, 1000 - (level - 1) * 100)` ms.
    pub fn fall_interval(&self) -> Duration {
        let steps = u64::from(self.level.max(1) - 1);
        let ms = BASE_FALL_MS
            .saturating_sub(steps.saturating_mul(FALL_STEP_MS))
            .max(MIN_FALL_MS);
        Duration::from_millis(ms)
    }
}

/// Points for clearing `lines` rows with one lock: 10 per line, times the line count.
pub fn line_clear_points(lines: u32) -> u32 {
    POINTS_PER_LINE * lines * lines
}

/// Single cell: either empty or a locked block of a given colour index (0..7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(u8),
}

impl Cell {
    /// 0 for empty, colour index + 1 for a block.
    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Block(c) => c + 1,
        }
    }

    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Block(_))
    }
}

/// A row removed by a lock, captured before it was dropped from the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearedRow {
    /// Row index (0 = top) at the moment of the clear.
    pub y: usize,
    pub cells: [Cell; COLS],
}

/// Playfield: ROWS x COLS grid. y=0 is top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playfield {
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<[Cell; COLS]>,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Playfield {
    pub fn new() -> Self {
        Self {
            rows: (0..ROWS).map(|_| [Cell::Empty; COLS]).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    /// Rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLS]> {
        self.rows.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(|c| !c.is_filled())
    }

    /// True if `shape` anchored at (x, y) would leave the field sideways, reach past the
    /// bottom, or overlap a block. Cells above the top edge never collide.
    pub fn collides(&self, x: i32, y: i32, shape: &Shape) -> bool {
        shape.cells().any(|(col, row)| {
            let cx = x + col as i32;
            let cy = y + row as i32;
            if cx < 0 || cx >= COLS as i32 || cy >= ROWS as i32 {
                return true;
            }
            cy >= 0
                && self
                    .get(cx as usize, cy as usize)
                    .is_some_and(Cell::is_filled)
        })
    }

    /// Remove every full row, inserting an empty row at the top for each.
    pub fn clear_full_rows(&mut self) -> Vec<ClearedRow> {
        let mut cleared = Vec::new();
        for y in 0..ROWS {
            if self.rows[y].iter().all(|c| c.is_filled()) {
                if let Some(cells) = self.rows.remove(y) {
                    cleared.push(ClearedRow { y, cells });
                }
                self.rows.push_front([Cell::Empty; COLS]);
            }
        }
        cleared
    }
}

/// Queued piece: kind and colour, not yet on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPiece {
    pub kind: TetrominoKind,
    pub color: u8,
}

impl NextPiece {
    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }
}

/// Falling piece: current matrix, top-left anchor and colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
    pub color: u8,
}

impl Piece {
    /// Horizontally centred on the top row.
    pub fn spawn(next: NextPiece) -> Self {
        let shape = next.shape();
        let x = (COLS / 2) as i32 - (shape.width() / 2) as i32;
        Self {
            kind: next.kind,
            shape,
            x,
            y: 0,
            color: next.color,
        }
    }

    /// Absolute (x, y) of each block.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .cells()
            .map(|(col, row)| (self.x + col as i32, self.y + row as i32))
    }
}

/// Uniform piece picker. The session config is passed in on every draw.
#[derive(Debug, Clone)]
pub struct Randomizer {
    rng: StdRng,
}

impl Randomizer {
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform kind from the allowed pool, uniform colour independent of kind.
    pub fn next_piece(&mut self, config: &SessionConfig) -> NextPiece {
        let pool: &[TetrominoKind] = if config.exclude_s_and_z {
            &TetrominoKind::WITHOUT_S_Z
        } else {
            &TetrominoKind::ALL
        };
        let kind = pool[self.rng.random_range(0..pool.len())];
        let color = self.rng.random_range(0..COLOR_COUNT);
        NextPiece { kind, color }
    }
}

/// Player commands the host forwards to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
}

/// Notifications for the presentation layer. Never read back by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    LinesCleared {
        rows: Vec<ClearedRow>,
        points: u32,
        /// Anchor of the piece that completed the rows.
        anchor: (i32, i32),
    },
    HardDropped {
        /// Landing anchor (the ghost position at the time of the drop).
        anchor: (i32, i32),
        shape: Shape,
        distance: u32,
    },
}

/// One session: playfield, current piece, next piece, score, level.
#[derive(Debug)]
pub struct GameState {
    config: SessionConfig,
    playfield: Playfield,
    active: Piece,
    next: NextPiece,
    randomizer: Randomizer,
    score: u32,
    lines_cleared: u32,
    game_over: bool,
    /// Last gravity step (or session start).
    last_fall: Instant,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_randomizer(config, Randomizer::from_os_rng(), Instant::now())
    }

    /// Reproducible session: same seed, same piece sequence.
    pub fn with_seed(config: SessionConfig, seed: u64, now: Instant) -> Self {
        Self::with_randomizer(config, Randomizer::seeded(seed), now)
    }

    fn with_randomizer(config: SessionConfig, mut randomizer: Randomizer, now: Instant) -> Self {
        let config = SessionConfig {
            level: config.level.max(1),
            ..config
        };
        let first = randomizer.next_piece(&config);
        let next = randomizer.next_piece(&config);
        info!(
            level = config.level,
            exclude_s_and_z = config.exclude_s_and_z,
            "session started"
        );
        Self {
            config,
            playfield: Playfield::new(),
            active: Piece::spawn(first),
            next,
            randomizer,
            score: 0,
            lines_cleared: 0,
            game_over: false,
            last_fall: now,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// The falling piece. After game over this is the piece that failed to spawn.
    pub fn active_piece(&self) -> &Piece {
        &self.active
    }

    pub fn next_piece(&self) -> &NextPiece {
        &self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.config.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn fall_interval(&self) -> Duration {
        self.config.fall_interval()
    }

    /// Lowest collision-free anchor for the active piece. `None` once the game is over.
    pub fn ghost_position(&self) -> Option<(i32, i32)> {
        (!self.game_over).then(|| (self.active.x, self.landing_row()))
    }

    /// Drain pending presentation events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::Rotate => self.rotate(),
            Command::SoftDrop => self.soft_drop(),
            Command::HardDrop => self.hard_drop(),
        }
    }

    pub fn move_left(&mut self) {
        self.shift(-1);
    }

    pub fn move_right(&mut self) {
        self.shift(1);
    }

    /// Shift by one column if the target is free. Anything other than ±1 is ignored.
    fn shift(&mut self, dx: i32) {
        if self.game_over || dx.abs() != 1 {
            return;
        }
        let x = self.active.x + dx;
        if !self.playfield.collides(x, self.active.y, &self.active.shape) {
            self.active.x = x;
        }
    }

    /// Quarter turn in place. Rejected (no kick) if the rotated matrix collides.
    pub fn rotate(&mut self) {
        if self.game_over {
            return;
        }
        let rotated = self.active.shape.rotated();
        if !self.playfield.collides(self.active.x, self.active.y, &rotated) {
            self.active.shape = rotated;
        }
    }

    pub fn soft_drop(&mut self) {
        if self.game_over {
            return;
        }
        self.step_down();
    }

    pub fn hard_drop(&mut self) {
        if self.game_over {
            return;
        }
        let landing = self.landing_row();
        let distance = (landing - self.active.y).max(0) as u32;
        self.active.y = landing;
        self.events.push(GameEvent::HardDropped {
            anchor: (self.active.x, landing),
            shape: self.active.shape.clone(),
            distance,
        });
        self.lock_piece();
    }

    /// Gravity: one row down once more than the fall interval has passed since the last step.
    /// Timestamps at or before the last step are ignored.
    pub fn tick(&mut self, now: Instant) {
        if self.game_over {
            return;
        }
        let Some(elapsed) = now.checked_duration_since(self.last_fall) else {
            return;
        };
        if elapsed > self.config.fall_interval() {
            trace!(y = self.active.y, "gravity step");
            self.step_down();
            self.last_fall = now;
        }
    }

    /// Restart the gravity clock, e.g. after the host was paused.
    pub fn reset_fall_timer(&mut self, now: Instant) {
        self.last_fall = now;
    }

    fn step_down(&mut self) {
        let (x, y) = (self.active.x, self.active.y + 1);
        if self.playfield.collides(x, y, &self.active.shape) {
            self.lock_piece();
        } else {
            self.active.y = y;
        }
    }

    fn landing_row(&self) -> i32 {
        let mut y = self.active.y;
        while !self.playfield.collides(self.active.x, y + 1, &self.active.shape) {
            y += 1;
        }
        y
    }

    fn lock_piece(&mut self) {
        let color = self.active.color;
        for (x, y) in self.active.cells() {
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) {
                self.playfield.set(x, y, Cell::Block(color));
            }
        }
        debug!(
            kind = ?self.active.kind,
            x = self.active.x,
            y = self.active.y,
            "piece locked"
        );

        let cleared = self.playfield.clear_full_rows();
        let lines = cleared.len() as u32;
        if lines > 0 {
            let points = line_clear_points(lines);
            self.score = self.score.saturating_add(points);
            self.lines_cleared += lines;
            info!(lines, points, score = self.score, "rows cleared");
            self.events.push(GameEvent::LinesCleared {
                rows: cleared,
                points,
                anchor: (self.active.x, self.active.y),
            });
        }
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        let incoming = std::mem::replace(
            &mut self.next,
            self.randomizer.next_piece(&self.config),
        );
        self.active = Piece::spawn(incoming);
        if self
            .playfield
            .collides(self.active.x, self.active.y, &self.active.shape)
        {
            self.game_over = true;
            info!(score = self.score, lines = self.lines_cleared, "game over");
        } else {
            debug!(kind = ?self.active.kind, next = ?self.next.kind, "piece spawned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameState {
        GameState::with_seed(SessionConfig::default(), 7, Instant::now())
    }

    fn place(state: &mut GameState, kind: TetrominoKind, x: i32, y: i32) {
        state.active = Piece {
            kind,
            shape: kind.shape(),
            x,
            y,
            color: 3,
        };
    }

    /// Fill rows `ys` completely except the given columns.
    fn fill_rows_except(state: &mut GameState, ys: std::ops::Range<usize>, holes: &[usize]) {
        for y in ys {
            for x in (0..COLS).filter(|x| !holes.contains(x)) {
                state.playfield.set(x, y, Cell::Block(1));
            }
        }
    }

    fn has_full_row(field: &Playfield) -> bool {
        field.rows().any(|row| row.iter().all(|c| c.is_filled()))
    }

    #[test]
    fn fall_interval_follows_level() {
        let at = |level| {
            SessionConfig {
                level,
                exclude_s_and_z: false,
            }
            .fall_interval()
        };
        assert_eq!(at(1), Duration::from_millis(1000));
        assert_eq!(at(2), Duration::from_millis(900));
        assert_eq!(at(10), Duration::from_millis(100));
        assert_eq!(at(11), Duration::from_millis(50));
        assert_eq!(at(40), Duration::from_millis(50));
    }

    #[test]
    fn level_zero_is_clamped_to_one() {
        let config = SessionConfig {
            level: 0,
            exclude_s_and_z: false,
        };
        let state = GameState::with_seed(config, 1, Instant::now());
        assert_eq!(state.level(), 1);
        assert_eq!(state.fall_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn collides_with_walls_floor_and_blocks() {
        let mut field = Playfield::new();
        let o = TetrominoKind::O.shape();
        assert!(!field.collides(0, 0, &o));
        assert!(field.collides(-1, 0, &o));
        assert!(field.collides(COLS as i32 - 1, 0, &o));
        assert!(!field.collides(COLS as i32 - 2, ROWS as i32 - 2, &o));
        assert!(field.collides(0, ROWS as i32 - 1, &o));

        field.set(5, 10, Cell::Block(0));
        assert!(field.collides(4, 9, &o));
        assert!(!field.collides(6, 9, &o));
    }

    #[test]
    fn cells_above_top_never_collide() {
        let mut field = Playfield::new();
        for x in 0..COLS {
            field.set(x, 0, Cell::Block(2));
        }
        let i = TetrominoKind::I.shape().rotated();
        for x in 0..COLS as i32 {
            assert!(!field.collides(x, -4, &i), "column {x}");
            assert!(field.collides(x, -3, &i), "column {x}");
        }
        // Still rejected sideways while above the field.
        assert!(field.collides(-1, -4, &i));
        assert!(field.collides(COLS as i32, -4, &i));
    }

    #[test]
    fn spawn_is_centred() {
        let at = |kind| Piece::spawn(NextPiece { kind, color: 0 }).x;
        assert_eq!(at(TetrominoKind::I), 3);
        assert_eq!(at(TetrominoKind::O), 4);
        assert_eq!(at(TetrominoKind::T), 4);
        assert_eq!(at(TetrominoKind::L), 4);
    }

    #[test]
    fn move_left_at_wall_is_noop() {
        let mut state = session();
        place(&mut state, TetrominoKind::T, 0, 5);
        state.move_left();
        assert_eq!((state.active.x, state.active.y), (0, 5));
        state.move_right();
        assert_eq!(state.active.x, 1);
    }

    #[test]
    fn move_is_blocked_by_stack() {
        let mut state = session();
        place(&mut state, TetrominoKind::O, 4, 10);
        state.playfield.set(3, 11, Cell::Block(0));
        state.move_left();
        assert_eq!(state.active.x, 4);
    }

    #[test]
    fn malformed_shift_is_ignored() {
        let mut state = session();
        place(&mut state, TetrominoKind::O, 4, 3);
        state.shift(0);
        state.shift(3);
        assert_eq!(state.active.x, 4);
    }

    #[test]
    fn rotation_near_wall_is_rejected_without_kick() {
        let mut state = session();
        let vertical = TetrominoKind::I.shape().rotated();
        state.active = Piece {
            kind: TetrominoKind::I,
            shape: vertical.clone(),
            x: COLS as i32 - 1,
            y: 4,
            color: 0,
        };
        state.rotate();
        assert_eq!(state.active.shape, vertical);
        assert_eq!(state.active.x, COLS as i32 - 1);

        state.active.x = 2;
        state.rotate();
        assert_eq!(state.active.shape, TetrominoKind::I.shape());
    }

    #[test]
    fn soft_drop_moves_then_locks() {
        let mut state = session();
        place(&mut state, TetrominoKind::O, 0, ROWS as i32 - 3);
        state.soft_drop();
        assert_eq!(state.active.y, ROWS as i32 - 2);
        state.soft_drop();
        assert_eq!(state.playfield.get(0, ROWS - 1), Some(Cell::Block(3)));
        assert_eq!(state.playfield.get(1, ROWS - 2), Some(Cell::Block(3)));
        assert_eq!(state.active.y, 0);
    }

    #[test]
    fn hard_drop_i_lands_on_bottom_row() {
        let mut state = session();
        place(&mut state, TetrominoKind::I, 3, 0);
        let queued = *state.next_piece();
        state.hard_drop();

        for x in 3..7 {
            assert_eq!(state.playfield.get(x, ROWS - 1), Some(Cell::Block(3)));
        }
        assert_eq!(state.playfield.get(2, ROWS - 1), Some(Cell::Empty));
        assert_eq!(state.active.kind, queued.kind);
        assert_eq!(state.active.color, queued.color);
        assert_eq!(state.active.y, 0);
        assert!(!state.is_game_over());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn ghost_matches_hard_drop_landing() {
        let mut state = session();
        place(&mut state, TetrominoKind::T, 2, 0);
        state.playfield.set(3, 12, Cell::Block(0));
        assert_eq!(state.ghost_position(), Some((2, 10)));
        // Query only.
        assert_eq!((state.active.x, state.active.y), (2, 0));

        state.hard_drop();
        let events = state.take_events();
        assert_eq!(
            events.first(),
            Some(&GameEvent::HardDropped {
                anchor: (2, 10),
                shape: TetrominoKind::T.shape(),
                distance: 10,
            })
        );
        assert_eq!(state.playfield.get(3, 11), Some(Cell::Block(3)));
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn two_rows_completed_by_o_score_forty_and_empty_the_field() {
        let mut state = session();
        fill_rows_except(&mut state, ROWS - 2..ROWS, &[4, 5]);
        place(&mut state, TetrominoKind::O, 4, 0);
        state.hard_drop();

        assert_eq!(state.score(), 40);
        assert_eq!(state.lines_cleared(), 2);
        assert!(state.playfield().is_empty());
        let cleared: Vec<_> = state
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::LinesCleared { rows, points, .. } => Some((rows, points)),
                GameEvent::HardDropped { .. } => None,
            })
            .collect();
        assert_eq!(cleared.len(), 1);
        let (rows, points) = &cleared[0];
        assert_eq!(*points, 40);
        assert_eq!(
            rows.iter().map(|r| r.y).collect::<Vec<_>>(),
            vec![ROWS - 2, ROWS - 1]
        );
        assert_eq!(rows[0].cells[4], Cell::Block(3));
        assert_eq!(rows[0].cells[0], Cell::Block(1));
    }

    #[test]
    fn score_is_ten_times_lines_squared() {
        for n in 0..=4usize {
            let mut state = session();
            fill_rows_except(&mut state, ROWS - n..ROWS, &[0]);
            state.active = Piece {
                kind: TetrominoKind::I,
                shape: TetrominoKind::I.shape().rotated(),
                x: 0,
                y: 0,
                color: 0,
            };
            state.hard_drop();
            let n = n as u32;
            assert_eq!(state.score(), 10 * n * n, "{n} lines");
            assert_eq!(state.lines_cleared(), n);
            assert!(!has_full_row(state.playfield()));
        }
        assert_eq!(line_clear_points(3), 90);
        assert_eq!(line_clear_points(4), 160);
    }

    #[test]
    fn rows_above_a_clear_shift_down() {
        let mut state = session();
        fill_rows_except(&mut state, ROWS - 1..ROWS, &[0]);
        state.playfield.set(7, ROWS - 2, Cell::Block(5));
        state.active = Piece {
            kind: TetrominoKind::I,
            shape: TetrominoKind::I.shape().rotated(),
            x: 0,
            y: 0,
            color: 2,
        };
        state.hard_drop();
        assert_eq!(state.score(), 10);
        assert_eq!(state.playfield.get(7, ROWS - 1), Some(Cell::Block(5)));
        // Remaining three blocks of the I sit on top of the shifted stack.
        for y in ROWS - 3..ROWS {
            assert_eq!(state.playfield.get(0, y), Some(Cell::Block(2)), "row {y}");
        }
        assert_eq!(state.playfield.get(0, ROWS - 4), Some(Cell::Empty));
    }

    #[test]
    fn blocked_spawn_ends_the_game_and_freezes_state() {
        let mut state = session();
        for x in 0..COLS {
            state.playfield.set(x, 0, Cell::Block(4));
            state.playfield.set(x, 1, Cell::Block(4));
        }
        state.playfield.set(0, 0, Cell::Empty);
        state.spawn_next();
        assert!(state.is_game_over());
        assert_eq!(state.ghost_position(), None);

        let field = state.playfield.clone();
        let piece = state.active.clone();
        let now = Instant::now();
        for command in [
            Command::MoveLeft,
            Command::MoveRight,
            Command::Rotate,
            Command::SoftDrop,
            Command::HardDrop,
        ] {
            state.apply(command);
        }
        state.tick(now + Duration::from_secs(60));
        assert_eq!(state.playfield, field);
        assert_eq!(state.active, piece);
        assert_eq!(state.score(), 0);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn tick_waits_for_fall_interval() {
        let start = Instant::now();
        let mut state = GameState::with_seed(SessionConfig::default(), 3, start);
        let y0 = state.active.y;

        state.tick(start + Duration::from_millis(1000));
        assert_eq!(state.active.y, y0);

        state.tick(start + Duration::from_millis(1001));
        assert_eq!(state.active.y, y0 + 1);

        // Timer restarted at the step.
        state.tick(start + Duration::from_millis(1500));
        assert_eq!(state.active.y, y0 + 1);
        state.tick(start + Duration::from_millis(2002));
        assert_eq!(state.active.y, y0 + 2);
    }

    #[test]
    fn tick_with_stale_timestamp_is_noop() {
        let start = Instant::now();
        let mut state = GameState::with_seed(SessionConfig::default(), 3, start);
        state.reset_fall_timer(start + Duration::from_secs(5));
        state.tick(start + Duration::from_secs(2));
        state.tick(start + Duration::from_secs(5));
        assert_eq!(state.active.y, 0);
    }

    #[test]
    fn faster_level_steps_sooner() {
        let start = Instant::now();
        let config = SessionConfig {
            level: 10,
            exclude_s_and_z: false,
        };
        let mut state = GameState::with_seed(config, 3, start);
        state.tick(start + Duration::from_millis(101));
        assert_eq!(state.active.y, 1);
    }

    #[test]
    fn gravity_locks_at_floor() {
        let start = Instant::now();
        let mut state = GameState::with_seed(SessionConfig::default(), 5, start);
        place(&mut state, TetrominoKind::O, 0, ROWS as i32 - 2);
        state.tick(start + Duration::from_millis(1001));
        assert_eq!(state.playfield.get(0, ROWS - 1), Some(Cell::Block(3)));
        assert_eq!(state.active.y, 0);
    }

    #[test]
    fn randomizer_respects_s_z_exclusion() {
        let config = SessionConfig {
            level: 1,
            exclude_s_and_z: true,
        };
        let mut rng = Randomizer::seeded(11);
        for _ in 0..2000 {
            let p = rng.next_piece(&config);
            assert!(!matches!(p.kind, TetrominoKind::S | TetrominoKind::Z));
            assert!(p.color < COLOR_COUNT);
        }
    }

    #[test]
    fn randomizer_covers_all_kinds_and_colours() {
        let config = SessionConfig::default();
        let mut rng = Randomizer::seeded(11);
        let draws: Vec<_> = (0..2000).map(|_| rng.next_piece(&config)).collect();
        for kind in TetrominoKind::ALL {
            assert!(draws.iter().any(|p| p.kind == kind), "{kind:?}");
        }
        for color in 0..COLOR_COUNT {
            assert!(draws.iter().any(|p| p.color == color), "colour {color}");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let now = Instant::now();
        let mut a = GameState::with_seed(SessionConfig::default(), 99, now);
        let mut b = GameState::with_seed(SessionConfig::default(), 99, now);
        for _ in 0..20 {
            assert_eq!(a.next_piece(), b.next_piece());
            a.hard_drop();
            b.hard_drop();
        }
    }

    #[test]
    fn random_play_never_leaves_a_full_row() {
        let mut state = GameState::with_seed(SessionConfig::default(), 2024, Instant::now());
        let script = [
            Command::MoveLeft,
            Command::Rotate,
            Command::MoveLeft,
            Command::MoveRight,
            Command::SoftDrop,
            Command::Rotate,
            Command::MoveRight,
            Command::MoveRight,
        ];
        let mut score = 0;
        for i in 0..2000 {
            if state.is_game_over() {
                break;
            }
            let command = if i % 5 == 4 {
                Command::HardDrop
            } else {
                script[i % script.len()]
            };
            state.apply(command);
            assert!(!has_full_row(state.playfield()));
            assert!(state.score() >= score);
            score = state.score();
        }
    }

    #[test]
    fn cell_codes_are_one_based() {
        assert_eq!(Cell::Empty.code(), 0);
        assert_eq!(Cell::Block(0).code(), 1);
        assert_eq!(Cell::Block(6).code(), 7);
    }
}
