//! Indirectris: a falling-piece puzzle in the terminal where you never touch
//! the pieces, only the gravity wells that bend their paths.

mod app;
mod atlas;
mod attractor;
mod emitter;
mod field;
mod grid;
mod input;
mod matcher;
mod piece;
mod score;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use session::SessionConfig;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });
    let atlas = atlas::Atlas::load(args.shapes.as_deref()).context("loading shapes")?;
    let config = args.session_config();
    log::info!("starting with {:?}", args);
    App::new(config, atlas, theme, args.frame_rate)?.run()
}

/// Log to `path`; the terminal belongs to the UI. Level from `RUST_LOG`, default info.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Steer falling pieces with gravity wells; complete rows of seven and 3×3 squares.
#[derive(Debug, Parser)]
#[command(
    name = "indirectris",
    version,
    about = "Falling-piece puzzle in the terminal: drag gravity wells to steer the pieces.",
    long_about = "Indirectris is a terminal puzzle where pieces are launched from a \
        patrolling emitter towards the centre of the board and fly under the pull of \
        draggable attractors.\n\n\
        A piece that touches settled material sticks to it; a piece that touches a wall is \
        lost. Seven settled cells in a row or column, or a 3×3 block, are cleared for \
        points.\n\n\
        CONTROLS:\n  Mouse drag  Move an attractor   P  Pause   R  Restart   Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Playfield width in cells, wall border included.
    #[arg(long, default_value = "60", value_name = "COLS")]
    pub width: usize,

    /// Playfield height in cells, wall border included.
    #[arg(long, default_value = "45", value_name = "ROWS")]
    pub height: usize,

    /// Mass of each attractor.
    #[arg(long, default_value = "150.0", value_name = "MASS")]
    pub mass: f64,

    /// Seconds a launched piece would take to reach the centre with no attractors.
    #[arg(long, default_value = "6.0", value_name = "SECS")]
    pub time_to_target: f64,

    /// Emitter patrol speed in cells per second.
    #[arg(long, default_value = "8.0", value_name = "CELLS")]
    pub patrol_speed: f64,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Seed for the piece sequence. Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Shapes file adding to or replacing the built-in shapes.
    #[arg(long, value_name = "FILE")]
    pub shapes: Option<PathBuf>,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            width: self.width,
            height: self.height,
            mass: self.mass,
            attractors: SessionConfig::default_attractors(self.width, self.height),
            time_to_target: self.time_to_target,
            patrol_speed: self.patrol_speed,
            seed: self.seed.unwrap_or_else(clock_seed),
            ..SessionConfig::default()
        }
    }
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(0x1234_5678)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build_a_session_config() {
        let args = Args::parse_from(["indirectris", "--seed", "7"]);
        let config = args.session_config();
        assert_eq!((config.width, config.height), (60, 45));
        assert_eq!(config.seed, 7);
        assert_eq!(config.mass, 150.0);
        assert_eq!(config.attractors, SessionConfig::default().attractors);
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn test_palette_aliases() {
        let args = Args::parse_from(["indirectris", "--palette", "colourblind"]);
        assert_eq!(args.palette, Palette::Colorblind);
        let args = Args::parse_from(["indirectris", "--palette", "high-contrast"]);
        assert_eq!(args.palette, Palette::HighContrast);
    }
}
