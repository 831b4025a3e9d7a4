//! Image loading and CPU-state persistence for the ND100 emulator.
//!
//! Kept separate from `nd100-core` so the CORE has no file-I/O dependency
//! (spec §1 lists image-file parsing and snapshot persistence as external
//! collaborators, specified only at their interfaces): `bpun`/`bp` load a
//! program image into a `MemoryStore`, `floppy_image`/`hdd_image` do raw
//! sector I/O against disk image files, and `snapshot` reads/writes the
//! `cpustate.bin` format.

pub mod bp;
pub mod bpun;
pub mod error;
pub mod floppy_image;
pub mod hdd_image;
pub mod snapshot;

pub use error::ImageError;
