//! CLI + config-file handling: `clap` parses command line flags, an
//! optional `config.toml` (read via `toml` + `serde` from a `dirs`-resolved
//! config directory) supplies persistent defaults, and CLI flags always
//! win over the file.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug, Clone)]
#[command(name = "c64", about = "A cycle-accurate Commodore 64 emulator")]
pub struct Cli {
    /// Path to a ROM ZIP or directory containing the BASIC/KERNAL/CHARGEN/1541 ROMs.
    #[arg(long)]
    pub roms: Option<String>,

    /// Path to a .crt cartridge image to attach at startup.
    #[arg(long)]
    pub cartridge: Option<String>,

    /// Use NTSC timing instead of the default PAL.
    #[arg(long)]
    pub ntsc: bool,

    /// Display palette: color, bw, green, amber, or sepia.
    #[arg(long)]
    pub palette: Option<String>,

    /// Window scale factor.
    #[arg(long)]
    pub scale: Option<u32>,

    /// Skip CRC32 validation of the loaded ROMs.
    #[arg(long)]
    pub skip_checksums: bool,

    /// Show the frames-per-second overlay.
    #[arg(long)]
    pub fps: bool,

    /// Increase log verbosity (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Persistent defaults read from `config.toml`, overridden by any CLI flag
/// the user actually passed.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct FileConfig {
    pub roms: Option<String>,
    pub palette: Option<String>,
    pub scale: Option<u32>,
    pub ntsc: Option<bool>,
}

/// Fully resolved settings: CLI flags layered over `config.toml`.
pub struct Settings {
    pub roms: String,
    pub cartridge: Option<String>,
    pub ntsc: bool,
    pub palette: Palette,
    pub scale: u32,
    pub skip_checksums: bool,
    pub fps: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    Color,
    BlackAndWhite,
    Green,
    Amber,
    Sepia,
}

impl Palette {
    fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "bw" | "black_and_white" | "blackandwhite" => Self::BlackAndWhite,
            "green" => Self::Green,
            "amber" => Self::Amber,
            "sepia" => Self::Sepia,
            _ => Self::Color,
        }
    }

    /// Monochrome tint for `Vic::set_monochrome`, or `None` for full color.
    pub fn tint(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Color => None,
            Self::BlackAndWhite => Some((255, 255, 255)),
            Self::Green => Some((80, 220, 80)),
            Self::Amber => Some((255, 176, 0)),
            Self::Sepia => Some((210, 180, 140)),
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("c64-emu").join("config.toml"))
}

fn load_file_config() -> FileConfig {
    let Some(path) = config_file_path() else {
        return FileConfig::default();
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return FileConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring malformed config file {}: {e}", path.display());
            FileConfig::default()
        }
    }
}

impl Settings {
    /// Resolve final settings from CLI args layered over `config.toml`.
    /// Exits the process with a usage message if no ROM path is available
    /// from either source.
    pub fn resolve(cli: Cli) -> Self {
        let file = load_file_config();

        let roms = cli.roms.or(file.roms).unwrap_or_else(|| {
            eprintln!(
                "no ROM path given: pass --roms <dir-or-zip> or set `roms` in config.toml"
            );
            std::process::exit(1);
        });

        let palette_name = cli.palette.or(file.palette).unwrap_or_default();
        let scale = cli.scale.or(file.scale).unwrap_or(3);
        let ntsc = cli.ntsc || file.ntsc.unwrap_or(false);

        Self {
            roms,
            cartridge: cli.cartridge,
            ntsc,
            palette: Palette::parse(&palette_name),
            scale,
            skip_checksums: cli.skip_checksums,
            fps: cli.fps,
        }
    }
}
