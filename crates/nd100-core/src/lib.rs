//! ND100 CPU, paging and interrupt core.
//!
//! This crate is the three tightly coupled subsystems described as THE
//! CORE: the instruction execution engine (`decode`, `ea`, `exec`), the
//! memory and paging subsystem (`memory`, `page`), and the priority-level
//! and interrupt subsystem (`interrupt`, `reg`), plus the `io` device
//! models and the `machine` that wires them together. It has no file I/O
//! of its own; image loading and snapshotting live in `nd100-image`.

pub mod decode;
pub mod ea;
pub mod error;
pub mod exec;
pub mod float;
pub mod interrupt;
pub mod io;
pub mod machine;
pub mod memory;
pub mod page;
pub mod primitives;
pub mod reg;

pub use error::Exception;
pub use machine::Machine;
