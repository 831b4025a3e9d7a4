//! Host-facing error type for image I/O (spec §7 "host errors ... logged;
//! if during startup, transition to SHUTDOWN"). These never cross into
//! `nd100-core` — only `bins/nd100emu` decides what a load failure means
//! for process lifecycle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("BPUN header is missing its terminating '!'")]
    BadBpunHeader,
    #[error("BPUN checksum mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    BpunChecksum { expected: u16, computed: u16 },
    #[error("BP image must be exactly {expected} words, got {actual}")]
    BadBpLength { expected: usize, actual: usize },
    #[error("malformed cpustate.bin line: {0:?}")]
    BadSnapshotLine(String),
}
