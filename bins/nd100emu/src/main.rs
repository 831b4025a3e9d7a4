//! CLI entry point: flat key/value configuration, thread startup, the
//! Ctrl-Y snapshot trigger and the console/panel TCP listeners (spec §6's
//! "external collaborators" layer around the CORE in `nd100-core`).

mod config;
mod net;
mod workers;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nd100_core::machine::{Machine, RunState};
use nd100_core::primitives::reg_idx;
use nd100_image::{bp, bpun};
use tracing::{error, info, warn};

use config::{BootType, Config};

/// Ctrl-Y (ASCII EM): triggers a `cpustate.bin` snapshot save, matching the
/// original's operator-panel convention.
const SNAPSHOT_TRIGGER: u8 = 0x19;
/// Ctrl-Q (ASCII DC1): cooperative shutdown.
const QUIT_TRIGGER: u8 = 0x11;

#[derive(Parser, Debug)]
#[command(name = "nd100emu", about = "ND100 minicomputer emulator")]
struct Cli {
    /// Flat key/value configuration file (spec §6).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Boot image to load (BP dump, BPUN punch tape, or a floppy image),
    /// overriding the config file's `boot`/paths when given.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Directory holding (or to receive) `cpustate.bin`. Defaults to the
    /// current directory.
    #[arg(long, default_value = ".")]
    state_dir: PathBuf,

    /// Don't start the console/panel TCP listeners.
    #[arg(long)]
    headless: bool,
}

fn init_logging(debug: bool) {
    use tracing_subscriber::EnvFilter;
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_boot_image(machine: &mut Machine, cfg: &Config, image: Option<&PathBuf>) -> Result<()> {
    let Some(path) = image else {
        warn!("no boot image given, starting with blank memory");
        return Ok(());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading boot image {}", path.display()))?;

    match cfg.boot {
        BootType::Bp => {
            let words = bp::parse(&bytes)?;
            bp::apply(&words, &mut machine.mem);
        }
        BootType::Bpun => {
            let img = bpun::parse(&bytes)?;
            if !img.checksum_valid() {
                warn!(header = %img.header, "BPUN checksum mismatch, loading anyway");
            }
            img.apply(&mut machine.mem);
        }
        BootType::Floppy => {
            // The first sector of track 0 carries the bootstrap loader; a
            // real boot walks the floppy controller's autoload path, but the
            // binary glue layer can just poke it straight into memory.
            let sector = nd100_image::floppy_image::sector_read(path, 0, 0, 0)?;
            for (i, word) in sector.iter().enumerate() {
                machine.mem.write_word(i as u16, *word, nd100_core::memory::ByteSelect::Whole);
            }
        }
    }
    Ok(())
}

fn run_cpu_loop(machine: &Arc<Mutex<Machine>>, run: &Arc<AtomicBool>) {
    while run.load(Ordering::Relaxed) {
        let stopped = {
            let mut m = machine.lock().unwrap();
            if let Err(e) = m.step() {
                error!(?e, "instruction raised an exception outside the normal internal-interrupt path");
            }
            m.run_state == RunState::Stopped
        };
        if stopped {
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Watches the host's own stdin (distinct from the guest TCP console) for
/// the operator hotkeys: Ctrl-Y snapshots, Ctrl-Q quits.
fn spawn_hotkey_watcher(
    machine: Arc<Mutex<Machine>>,
    run: Arc<AtomicBool>,
    state_dir: PathBuf,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("hotkeys".into())
        .spawn(move || {
            use std::io::Read;
            let mut stdin = std::io::stdin();
            let mut byte = [0u8; 1];
            while run.load(Ordering::Relaxed) {
                match stdin.read(&mut byte) {
                    Ok(0) => break,
                    Ok(_) => match byte[0] {
                        SNAPSHOT_TRIGGER => {
                            let m = machine.lock().unwrap();
                            match nd100_image::snapshot::save(&state_dir, &m) {
                                Ok(()) => info!("snapshot saved"),
                                Err(e) => error!(?e, "snapshot save failed"),
                            }
                        }
                        QUIT_TRIGGER => {
                            run.store(false, Ordering::Relaxed);
                            break;
                        }
                        _ => {}
                    },
                    Err(_) => break,
                }
            }
        })
        .expect("spawn hotkey watcher")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    init_logging(cfg.debug);

    let mut machine = Machine::new();
    machine.master_clear();

    if nd100_image::snapshot::is_loadable(&cli.state_dir) {
        info!(dir = %cli.state_dir.display(), "loading snapshot");
        nd100_image::snapshot::load(&cli.state_dir, &mut machine)?;
    } else {
        let image = cli.image.clone().or_else(|| cfg.floppy_image.clone());
        load_boot_image(&mut machine, &cfg, image.as_ref())?;
        machine.regs.write(0, reg_idx::P, cfg.start);
    }
    machine.run_state = RunState::Running;

    let machine = Arc::new(Mutex::new(machine));
    let run = Arc::new(AtomicBool::new(true));

    let mut handles = vec![
        workers::spawn_rtc(Arc::clone(&machine), Arc::clone(&run)),
        workers::spawn_floppy(Arc::clone(&machine), Arc::clone(&run), cfg.floppy_image.clone()),
        workers::spawn_hdd(
            Arc::clone(&machine),
            Arc::clone(&run),
            Some(nd100_image::hdd_image::image_path(&cli.state_dir)),
        ),
        spawn_hotkey_watcher(Arc::clone(&machine), Arc::clone(&run), cli.state_dir.clone()),
    ];

    if !cli.headless {
        handles.push(net::spawn_console_listener(Arc::clone(&machine), Arc::clone(&run)));
        if cfg.panel {
            handles.push(net::spawn_panel_listener(Arc::clone(&machine), Arc::clone(&run)));
        }
    }

    run_cpu_loop(&machine, &run);

    run.store(false, Ordering::Relaxed);
    for handle in handles {
        let _ = handle.join();
    }

    let m = machine.lock().unwrap();
    if let Err(e) = nd100_image::snapshot::save(&cli.state_dir, &m) {
        error!(?e, "final snapshot save failed");
    }

    Ok(())
}
