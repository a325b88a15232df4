//! Colours: btop-style `theme[key]="value"` files and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours used by the playfield and sidebar.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece and settled-material colours, indexed by shape colour (0..=5):
    /// green, yellow, red, blue, magenta, cyan.
    pub tint: [Color; 6],
    /// Playfield background.
    pub bg: Color,
    /// Border walls and panel frames.
    pub wall: Color,
    /// Text.
    pub main_fg: Color,
    /// Titles and the score.
    pub title: Color,
    /// Pending piece under the emitter, help text.
    pub inactive_fg: Color,
    /// Attractor while it is being dragged.
    pub grab: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// One Dark values used when a key is missing.
const ONEDARK: [(&str, u8, u8, u8); 12] = [
    ("mem_box", 0x98, 0xC3, 0x79),
    ("title", 0xE5, 0xC0, 0x7B),
    ("cpu_end", 0xE0, 0x6C, 0x75),
    ("cpu_box", 0x61, 0xAF, 0xEF),
    ("net_box", 0xC6, 0x78, 0xDD),
    ("hi_fg", 0x56, 0xB6, 0xC2),
    ("meter_bg", 0x31, 0x35, 0x3F),
    ("div_line", 0x3F, 0x44, 0x4F),
    ("main_fg", 0xAB, 0xB2, 0xBF),
    ("title", 0xE5, 0xC0, 0x7B),
    ("inactive_fg", 0x5C, 0x63, 0x70),
    ("selected_fg", 0xFF, 0xFF, 0xFF),
];

const HIGH_CONTRAST: [u32; 6] = [0x00FF00, 0xFFFF00, 0xFF0000, 0x0088FF, 0xFF00FF, 0x00FFFF];
const COLORBLIND: [u32; 6] = [0x0077BB, 0xEE7733, 0x009988, 0xCC3311, 0xEE3377, 0xBBBB00];

fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl Theme {
    /// Load a theme file and apply `palette` on top. A missing or absent
    /// path gives the One Dark defaults.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let map = match path {
            Some(p) if p.exists() => parse_theme_file(&std::fs::read_to_string(p)?),
            _ => HashMap::new(),
        };
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        let table = match palette {
            Palette::Normal => return,
            Palette::HighContrast => HIGH_CONTRAST,
            Palette::Colorblind => COLORBLIND,
        };
        for (slot, hex) in self.tint.iter_mut().zip(table) {
            *slot = rgb(hex);
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let pick = |slot: usize, alt: &[&str]| {
            let (key, r, g, b) = ONEDARK[slot];
            std::iter::once(key)
                .chain(alt.iter().copied())
                .find_map(|k| map.get(k).and_then(|v| parse_hex(v).ok()))
                .unwrap_or(Color::Rgb(r, g, b))
        };
        Self {
            tint: [
                pick(0, &["cpu_start"]),
                pick(1, &["cpu_mid"]),
                pick(2, &["temp_end"]),
                pick(3, &[]),
                pick(4, &[]),
                pick(5, &["proc_misc"]),
            ],
            bg: pick(6, &[]),
            wall: pick(7, &[]),
            main_fg: pick(8, &[]),
            title: pick(9, &[]),
            inactive_fg: pick(10, &[]),
            grab: pick(11, &["hi_fg"]),
        }
    }

    #[inline]
    pub fn tint(&self, index: u8) -> Color {
        self.tint[(index as usize) % self.tint.len()]
    }
}

/// Parse btop-style theme text into key -> value.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let digits = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(digits.to_string());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v * scale)
            .map_err(|_| bad())
    };
    match digits.len() {
        6 => Ok(Color::Rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        3 => Ok(Color::Rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GG0000").is_err());
        assert!(parse_hex("#ÿÿ").is_err());
    }

    #[test]
    fn test_theme_file_overrides_defaults() {
        let map = parse_theme_file(
            "# comment\ntheme[meter_bg]=\"#000000\"\ntheme[cpu_start]='#010203'\ntheme[empty]=\"\"\n",
        );
        assert_eq!(map.get("meter_bg").map(String::as_str), Some("#000000"));
        assert!(!map.contains_key("empty"));
        let theme = Theme::from_map(&map);
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.tint(0), Color::Rgb(1, 2, 3));
        assert_eq!(theme.wall, Color::Rgb(0x3F, 0x44, 0x4F));
    }

    #[test]
    fn test_palette_replaces_tints_only() {
        let mut theme = Theme::default();
        let bg = theme.bg;
        theme.apply_palette(Palette::HighContrast);
        assert_eq!(theme.tint(2), Color::Rgb(0xFF, 0, 0));
        assert_eq!(theme.tint(8), theme.tint(2));
        assert_eq!(theme.bg, bg);
    }
}
