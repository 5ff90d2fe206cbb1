use clap::Parser;

use c64_core::c64::TvStandard;
use c64_core::core::machine::Machine;

mod config;
mod emulator;
mod input;
mod overlay;
mod rom_path;
mod video;

use config::{Cli, Settings};

fn main() {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.clone());

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let rom_set = rom_path::load_rom_set(&settings.roms).unwrap_or_else(|e| {
        eprintln!("failed to load ROMs from {}: {e}", settings.roms);
        std::process::exit(1);
    });

    let standard = if settings.ntsc {
        TvStandard::Ntsc
    } else {
        TvStandard::Pal
    };

    let build = if settings.skip_checksums {
        c64_machine::build_skip_checksums
    } else {
        c64_machine::build
    };

    let mut c64 = build(&rom_set, standard).unwrap_or_else(|e| {
        eprintln!("failed to build C64: {e}");
        std::process::exit(1);
    });

    if let Some(tint) = settings.palette.tint() {
        c64.vic.set_monochrome(Some(tint));
    }

    if let Some(crt_path) = &settings.cartridge {
        match std::fs::read(crt_path) {
            Ok(bytes) => {
                if let Err(e) = c64.attach_cartridge_from_crt(&bytes) {
                    log::error!("failed to attach cartridge {crt_path}: {e}");
                }
            }
            Err(e) => log::error!("failed to read cartridge file {crt_path}: {e}"),
        }
    }

    c64.reset();
    for message in c64.take_messages() {
        log::debug!("startup message: {message:?}");
    }

    let key_map = input::default_key_map(c64.input_map());
    emulator::run(&mut c64, &key_map, settings.scale, settings.fps);
}
