use std::{
    path::PathBuf,
    process,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use chip8_vm::{
    config::{Quirks, Settings, DEFAULT_INSTRUCTIONS_PER_SECOND, DEFAULT_SCALE},
    timer::TIMER_HZ,
    Emulator, KeyState, Pacer, Rom,
};
use clap::Parser;
use frontend::Frontend;

mod frontend;

/// Exit status when the program faults inside the VM.
const EXIT_VM_FAULT: i32 = 2;

/// Longest stretch of real time made up in one frame after a stall.
const MAX_LAG: Duration = Duration::from_millis(250);

const MAX_INSTRUCTIONS_PER_SECOND: i64 = 1_000_000;

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 virtual machine", long_about = None)]
struct Args {
    /// Path to the program to run
    rom: PathBuf,

    /// Instructions per second, 1 to 1000000
    #[arg(
        long,
        default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND,
        value_parser = clap::value_parser!(u32).range(1..=MAX_INSTRUCTIONS_PER_SECOND)
    )]
    ips: u32,

    /// Seed for the RND instruction (defaults to the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Window scale: 1, 2, 4, 8, 16 or 32
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: usize,

    /// FX65 loads V0..VX exclusive of VX
    #[arg(long)]
    exclusive_load: bool,
}

impl Args {
    fn into_settings(self) -> Settings {
        let seed = self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });
        Settings {
            instructions_per_second: self.ips,
            scale: self.scale,
            quirks: Quirks {
                load_store_exclusive: self.exclusive_load,
            },
            ..Settings::new(self.rom, seed)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let settings = Args::parse().into_settings();

    // the program is validated before any VM state exists
    let rom = Rom::from_file(&settings.rom_path)
        .with_context(|| format!("could not load {}", settings.rom_path.display()))?;

    let mut emu = Emulator::new(settings.seed).with_quirks(settings.quirks);
    emu.load(&rom);

    let mut frontend = Frontend::new(settings.scale)?;
    let mut keys = KeyState::new();

    let now = Instant::now();
    let mut cpu = Pacer::new(settings.instructions_per_second, now).with_max_lag(MAX_LAG);
    let mut timers = Pacer::new(TIMER_HZ, now).with_max_lag(MAX_LAG);

    log::info!(
        "running {} at {} instructions/s",
        settings.rom_path.display(),
        settings.instructions_per_second
    );
    while frontend.is_running() {
        frontend.poll_keys(&mut keys);

        let now = Instant::now();
        if let Err(err) = emu.run(cpu.due(now), &mut keys) {
            log::error!("{err}");
            eprintln!("{}", emu.dump());
            process::exit(EXIT_VM_FAULT);
        }
        for _ in 0..timers.due(now) {
            emu.tick();
        }

        frontend.present(emu.framebuffer())?;
    }
    log::info!("window closed, stopping");

    Ok(())
}
