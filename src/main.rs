//! Blockfall: classic falling-block puzzle game in the terminal.

mod app;
mod game;
mod input;
mod logging;
mod piece;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use game::SessionConfig;
use tracing::warn;

pub const DEFAULT_FRAME_RATE: f64 = 60.0;
/// Accepted `--frame-rate` values; anything else (NaN included) falls back to the default.
const FRAME_RATE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=1000.0;

/// Host-side options that never reach the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayOptions {
    pub ghost: bool,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), &args.log_level)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!(error = %e, "theme not loaded, using built-in colours");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });
    let mut app = App::new(args.session_config(), args.display_options(), args.seed, theme);
    app.run()?;
    Ok(())
}

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Classic falling-block puzzle in the terminal. Complete rows to clear them; the stack reaching the top ends the game.",
    long_about = "Blockfall is a terminal falling-block puzzle.\n\n\
        Pieces fall at a speed set by the level. Fill a row edge to edge to clear it; \
        clearing several rows with one piece scores 10 x lines x lines.\n\n\
        CONTROLS:\n  Left/Right or h/l   Move        Up or k/i   Rotate\n  Down or j           Soft drop   Space/Enter Hard drop\n  P / Esc             Pause       R           Restart (paused / game over)\n  Q                   Quit"
)]
pub struct Args {
    /// Starting level 1-10. Sets the fall speed for the whole game.
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub level: u32,

    /// Leave S and Z out of the piece randomizer.
    #[arg(long = "no-s-z")]
    pub no_s_z: bool,

    /// Hide the drop preview outline.
    #[arg(long)]
    pub no_ghost: bool,

    /// Seed for the piece randomizer (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value"). Uses the built-in scheme if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second (1-1000).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (nothing is logged otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log filter used with --log-file when RUST_LOG is unset.
    #[arg(long, default_value = "info", value_name = "FILTER")]
    pub log_level: String,
}

impl Args {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            level: self.level,
            exclude_s_and_z: self.no_s_z,
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            ghost: !self.no_ghost,
            frame_rate: if FRAME_RATE_RANGE.contains(&self.frame_rate) {
                self.frame_rate
            } else {
                DEFAULT_FRAME_RATE
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
