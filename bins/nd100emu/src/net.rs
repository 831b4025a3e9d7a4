//! TCP listeners for the guest console and the operator panel (spec §6):
//! console on port 5101 with the usual three-option telnet negotiation sent
//! on connect, panel on port 5100 as a plain register feed. Neither is part
//! of the CORE; both just pump bytes through the same device registers a
//! local terminal would use.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nd100_core::machine::Machine;
use tracing::{info, warn};

pub const CONSOLE_PORT: u16 = 5101;
pub const PANEL_PORT: u16 = 5100;

/// `IAC WILL ECHO`, `IAC WILL SUPPRESS-GO-AHEAD`, `IAC DO LINEMODE` — put the
/// remote end into raw character-at-a-time mode.
const TELNET_NEGOTIATION: [u8; 9] = [0xff, 0xfb, 0x01, 0xff, 0xfb, 0x03, 0xff, 0xfd, 0x0f];

pub fn spawn_console_listener(machine: Arc<Mutex<Machine>>, run: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("console-tcp".into())
        .spawn(move || accept_loop(CONSOLE_PORT, machine, run, handle_console_connection))
        .expect("spawn console listener")
}

pub fn spawn_panel_listener(machine: Arc<Mutex<Machine>>, run: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("panel-tcp".into())
        .spawn(move || accept_loop(PANEL_PORT, machine, run, handle_panel_connection))
        .expect("spawn panel listener")
}

fn accept_loop(
    port: u16,
    machine: Arc<Mutex<Machine>>,
    run: Arc<AtomicBool>,
    handler: fn(TcpStream, Arc<Mutex<Machine>>, Arc<AtomicBool>),
) {
    let listener = match TcpListener::bind(("0.0.0.0", port)) {
        Ok(l) => l,
        Err(e) => {
            warn!(port, %e, "failed to bind listener");
            return;
        }
    };
    listener
        .set_nonblocking(true)
        .expect("set listener non-blocking");
    info!(port, "listening");

    while run.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!(%peer, port, "accepted connection");
                let machine = Arc::clone(&machine);
                let run = Arc::clone(&run);
                std::thread::spawn(move || handler(stream, machine, run));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                warn!(%e, "accept failed");
                std::thread::sleep(Duration::from_millis(200));
            }
        }
    }
}

fn handle_console_connection(mut stream: TcpStream, machine: Arc<Mutex<Machine>>, run: Arc<AtomicBool>) {
    let _ = stream.write_all(&TELNET_NEGOTIATION);
    stream
        .set_read_timeout(Some(Duration::from_millis(20)))
        .expect("set read timeout");

    let mut reader = stream.try_clone().expect("clone console stream");
    let mut buf = [0u8; 256];

    while run.load(Ordering::Relaxed) {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let mut m = machine.lock().unwrap();
                for &byte in &buf[..n] {
                    m.io.console.host_push_input(byte, &mut m.intr);
                }
            }
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {}
            Err(_) => break,
        }

        let mut out = Vec::new();
        {
            let mut m = machine.lock().unwrap();
            while let Some(byte) = m.io.console.host_pop_output() {
                out.push(byte);
            }
        }
        if !out.is_empty() && stream.write_all(&out).is_err() {
            break;
        }
    }
}

/// Feeds the panel status register (`PANS`) to the remote end twice a
/// second; a minimal stand-in for the original's front-panel display link.
fn handle_panel_connection(mut stream: TcpStream, machine: Arc<Mutex<Machine>>, run: Arc<AtomicBool>) {
    while run.load(Ordering::Relaxed) {
        let pans = machine.lock().unwrap().ctl.pans;
        if stream.write_all(&pans.to_be_bytes()).is_err() {
            break;
        }
        std::thread::sleep(Duration::from_millis(500));
    }
}
