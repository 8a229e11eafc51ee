//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::COLOR_COUNT;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const PIECE_COLORS: usize = COLOR_COUNT as usize;

/// Theme keys for the piece colours, by colour index.
const PIECE_KEYS: [&str; PIECE_COLORS] = [
    "piece1", "piece2", "piece3", "piece4", "piece5", "piece6", "piece7",
];

/// Piece palette and UI colours loaded from a theme file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Piece colours by colour index: cyan, yellow, pink, orange, blue, green, red.
    pub pieces: [Color; PIECE_COLORS],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary elements: ghost outline, key hints.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::indigo_default()
    }
}

impl Theme {
    /// Built-in indigo scheme.
    pub fn indigo_default() -> Self {
        Self {
            pieces: [
                Color::from_u32(0x00BC_D4), // cyan
                Color::from_u32(0xFFEB_3B), // yellow
                Color::from_u32(0xE91E_63), // pink
                Color::from_u32(0xFF98_00), // orange
                Color::from_u32(0x2196_F3), // blue
                Color::from_u32(0x4CAF_50), // green
                Color::from_u32(0xF443_36), // red
            ],
            bg: Color::from_u32(0x1A23_7E),
            div_line: Color::from_u32(0x303F_9F),
            main_fg: Color::from_u32(0xFFFF_FF),
            title: Color::from_u32(0xFFEB_3B),
            inactive_fg: Color::from_u32(0x5C6B_C0),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the built-in scheme if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map)?;
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::indigo_default();
        t.apply_palette(palette);
        t
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = [
                    Color::from_u32(0x00FF_FF),
                    Color::from_u32(0xFFFF_00),
                    Color::from_u32(0xFF00_FF),
                    Color::from_u32(0xFF88_00),
                    Color::from_u32(0x0088_FF),
                    Color::from_u32(0x00FF_00),
                    Color::from_u32(0xFF00_00),
                ];
            }
            crate::Palette::Colorblind => {
                // Tol's vibrant set: separable without relying on red/green.
                self.pieces = [
                    Color::from_u32(0x33BB_EE),
                    Color::from_u32(0xBBBB_00),
                    Color::from_u32(0xEE33_77),
                    Color::from_u32(0xEE77_33),
                    Color::from_u32(0x0077_BB),
                    Color::from_u32(0x0099_88),
                    Color::from_u32(0xCC33_11),
                ];
            }
        }
    }

    /// Keys missing from the file keep their built-in value; present but malformed keys fail.
    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let get = |key: &str, fallback: Color| -> Result<Color, ThemeError> {
            map.get(key).map_or(Ok(fallback), |v| parse_hex(v))
        };
        let base = Self::indigo_default();
        let mut pieces = base.pieces;
        for (slot, key) in pieces.iter_mut().zip(PIECE_KEYS) {
            *slot = get(key, *slot)?;
        }
        Ok(Self {
            pieces,
            bg: get("main_bg", base.bg)?,
            div_line: get("div_line", base.div_line)?,
            main_fg: get("main_fg", base.main_fg)?,
            title: get("title", base.title)?,
            inactive_fg: get("inactive_fg", base.inactive_fg)?,
        })
    }

    /// Colour for a piece colour index (0..7).
    #[inline]
    pub fn piece_color(&self, index: u8) -> Color {
        self.pieces[usize::from(index) % PIECE_COLORS]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Palette;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#00BCD4").unwrap();
        assert!(matches!(c, Color::Rgb(0x00, 0xBC, 0xD4)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GG0000"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#1A237E""##);
        assert_eq!(map.get("main_bg"), Some(&"#1A237E".to_string()));
    }

    #[test]
    fn test_from_map_overrides_and_falls_back() {
        let map = parse_theme_file(
            "# comment\ntheme[piece3]=\"#010203\"\ntheme[title]='#FFF'\n",
        );
        let theme = Theme::from_map(&map).unwrap();
        let base = Theme::indigo_default();
        assert_eq!(theme.piece_color(2), Color::Rgb(1, 2, 3));
        assert_eq!(theme.piece_color(0), base.piece_color(0));
        assert_eq!(theme.title, Color::Rgb(255, 255, 255));
        assert_eq!(theme.bg, base.bg);
    }

    #[test]
    fn test_from_map_rejects_bad_value() {
        let map = parse_theme_file("theme[piece1]=\"nope\"");
        assert!(Theme::from_map(&map).is_err());
    }

    #[test]
    fn test_missing_file_uses_default() {
        let theme = Theme::load(Some(Path::new("/nonexistent/blockfall.theme")), Palette::Normal);
        assert_eq!(theme.unwrap(), Theme::default());
    }

    #[test]
    fn test_palette_replaces_pieces_only() {
        let theme = Theme::default_for_palette(Palette::Colorblind);
        let base = Theme::indigo_default();
        assert_ne!(theme.pieces, base.pieces);
        assert_eq!(theme.bg, base.bg);
    }

    #[test]
    fn test_piece_color_wraps() {
        let theme = Theme::default();
        assert_eq!(theme.piece_color(7), theme.piece_color(0));
    }
}
