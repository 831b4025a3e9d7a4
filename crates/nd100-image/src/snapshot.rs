//! `cpustate.bin` snapshot format (spec §6), grounded verbatim in
//! `examples/original_source/cpu_state.c`'s `cpustate()`: a line-oriented
//! `key=value` text file. Words are written octal (`0%o`), blocks are
//! written hex, everything else decimal — matching `state_word`/
//! `state_block`/`state_ulong` exactly.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nd100_core::interrupt::IdentEntry;
use nd100_core::machine::Machine;
use nd100_core::memory::ByteSelect;
use nd100_core::page::Pte;
use nd100_core::primitives::{MEM_WORDS, NUM_LEVELS, REGS_PER_BANK, reg_idx};

use crate::error::ImageError;

pub const SNAPSHOT_FILE_NAME: &str = "cpustate.bin";

/// 512-byte blocks, i.e. 256 words (spec §6's `MEM-<offset>=<1024hex>`
/// records: 1024 hex chars = 512 bytes).
const MEM_BLOCK_WORDS: usize = 256;
const REG_NAMES: [&str; REGS_PER_BANK] = ["00", "01", "02", "03", "04", "05", "06", "07"];

fn word_to_octal_field(key: &str, value: u16) -> String {
    format!("{key}=0{value:o}\n")
}

/// `state_word`'s save side writes `"%s=0%o\n"`: a literal leading `0`
/// followed by the value's octal digits. Parsing the whole trimmed field
/// as octal handles that transparently (a leading `0` is a no-op digit).
fn parse_octal_word(s: &str) -> Option<u16> {
    u16::from_str_radix(s.trim(), 8).ok()
}

/// `access(CPUSTATE_FILE_NAME, R_OK) == 0` (spec §6 "a snapshot is loadable
/// if that file exists at startup").
pub fn is_loadable(dir: &Path) -> bool {
    dir.join(SNAPSHOT_FILE_NAME).is_file()
}

pub fn save(dir: &Path, m: &Machine) -> Result<(), ImageError> {
    let path = dir.join(SNAPSHOT_FILE_NAME);
    let mut out = String::new();

    out.push_str(&format!("INSTR_COUNT={}\n", m.ctl.instruction_counter));

    // MEM-<8hex-offset>=<1024hex-bytes>, one record per non-zero 512-byte
    // (256-word) block, skipping all-zero blocks (spec §6).
    let words = m.mem.as_words();
    for block_start in (0..MEM_WORDS).step_by(MEM_BLOCK_WORDS) {
        let block = &words[block_start..block_start + MEM_BLOCK_WORDS];
        if block.iter().all(|w| *w == 0) {
            continue;
        }
        out.push_str(&format!("MEM-{:08x}=", block_start * 2));
        for word in block {
            for byte in word.to_be_bytes() {
                out.push_str(&format!("{byte:02x}"));
            }
        }
        out.push('\n');
    }

    for level in 0..NUM_LEVELS as u8 {
        for (idx, name) in REG_NAMES.iter().enumerate() {
            let key = format!("REG{level:02}.{name}");
            out.push_str(&word_to_octal_field(&key, m.regs.read(level, idx)));
        }
    }

    for level in 0..NUM_LEVELS as u8 {
        out.push_str(&word_to_octal_field(&format!("PCR{level:02}"), m.regs.pcr(level)));
    }

    out.push_str(&word_to_octal_field("PVL", m.ctl.pvl));
    out.push_str(&word_to_octal_field("IID", m.ctl.iid));
    out.push_str(&word_to_octal_field("IIE", m.ctl.iie));
    out.push_str(&word_to_octal_field("PID", m.intr.pid));
    out.push_str(&word_to_octal_field("PIE", m.intr.pie));
    out.push_str(&word_to_octal_field("CSR", m.ctl.csr));
    out.push_str(&word_to_octal_field("CCL", m.ctl.ccl));
    out.push_str(&word_to_octal_field("ACTL", m.ctl.actl));
    out.push_str(&word_to_octal_field("LCIL", m.ctl.lcil));
    out.push_str(&word_to_octal_field("ALD", m.ctl.ald));
    out.push_str(&word_to_octal_field("UCIL", m.ctl.ucil));
    out.push_str(&word_to_octal_field("PES", m.ctl.pes));
    out.push_str(&word_to_octal_field("PGC", m.ctl.pgc));
    out.push_str(&word_to_octal_field("PEA", m.ctl.pea));
    out.push_str(&word_to_octal_field("ECCR", m.ctl.eccr));
    out.push_str(&word_to_octal_field("MIR", m.ctl.ir));
    out.push_str(&word_to_octal_field("MPFB", m.ctl.pfb));
    out.push_str(&word_to_octal_field("PANS", m.ctl.pans));
    out.push_str(&word_to_octal_field("PANC", m.ctl.panc));
    out.push_str(&word_to_octal_field("OPR", m.ctl.opr));
    out.push_str(&word_to_octal_field("LMP", m.ctl.lmp));
    out.push_str(&word_to_octal_field("PGS", m.page.pgs() as u16));

    for flat in 0..4 * 64 {
        out.push_str(&format!("PT{flat:03}={}\n", m.page.entry_at_flat(flat).raw()));
    }

    for (i, entry) in m.intr.ident_entries().into_iter().enumerate() {
        out.push_str(&format!("IDC{i:03}={}\n", entry.caller_id));
        out.push_str(&format!("IDL{i:03}={}\n", entry.level));
        out.push_str(&word_to_octal_field(&format!("IDI{i:03}"), entry.identcode));
    }

    fs::write(&path, out).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load(dir: &Path, m: &mut Machine) -> Result<(), ImageError> {
    let path = dir.join(SNAPSHOT_FILE_NAME);
    let text = fs::read_to_string(&path).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut fields: HashMap<&str, &str> = HashMap::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once('=') {
            fields.insert(key, value);
        }
    }

    if let Some(v) = fields.get("INSTR_COUNT") {
        m.ctl.instruction_counter = v.trim().parse().unwrap_or(0);
    }

    for line in text.lines() {
        let Some(rest) = line.strip_prefix("MEM-") else {
            continue;
        };
        let Some((offset_hex, hexbytes)) = rest.split_once('=') else {
            continue;
        };
        let Ok(byte_offset) = usize::from_str_radix(offset_hex, 16) else {
            continue;
        };
        let bytes: Vec<u8> = hexbytes
            .as_bytes()
            .chunks_exact(2)
            .filter_map(|pair| u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok())
            .collect();
        for (i, pair) in bytes.chunks_exact(2).enumerate() {
            let word_addr = (byte_offset / 2 + i) as u16;
            let value = u16::from_be_bytes([pair[0], pair[1]]);
            m.mem.write_word(word_addr, value, ByteSelect::Whole);
        }
    }

    for level in 0..NUM_LEVELS as u8 {
        for (idx, name) in REG_NAMES.iter().enumerate() {
            let key = format!("REG{level:02}.{name}");
            if let Some(v) = fields.get(key.as_str()).and_then(|s| parse_octal_word(s)) {
                if idx == reg_idx::STS {
                    m.regs.set_sts(level, v.into());
                } else {
                    m.regs.write(level, idx, v);
                }
            }
        }
        let pcr_key = format!("PCR{level:02}");
        if let Some(v) = fields.get(pcr_key.as_str()).and_then(|s| parse_octal_word(s)) {
            m.regs.set_pcr(level, v);
        }
    }

    macro_rules! octal_field {
        ($key:literal, $dst:expr) => {
            if let Some(v) = fields.get($key).and_then(|s| parse_octal_word(s)) {
                $dst = v;
            }
        };
    }
    octal_field!("PVL", m.ctl.pvl);
    octal_field!("IID", m.ctl.iid);
    octal_field!("IIE", m.ctl.iie);
    octal_field!("PID", m.intr.pid);
    octal_field!("PIE", m.intr.pie);
    octal_field!("CSR", m.ctl.csr);
    octal_field!("CCL", m.ctl.ccl);
    octal_field!("ACTL", m.ctl.actl);
    octal_field!("LCIL", m.ctl.lcil);
    octal_field!("ALD", m.ctl.ald);
    octal_field!("UCIL", m.ctl.ucil);
    octal_field!("PES", m.ctl.pes);
    octal_field!("PGC", m.ctl.pgc);
    octal_field!("PEA", m.ctl.pea);
    octal_field!("ECCR", m.ctl.eccr);
    octal_field!("MIR", m.ctl.ir);
    octal_field!("MPFB", m.ctl.pfb);
    octal_field!("PANS", m.ctl.pans);
    octal_field!("PANC", m.ctl.panc);
    octal_field!("OPR", m.ctl.opr);
    octal_field!("LMP", m.ctl.lmp);

    if let Some(v) = fields.get("PGS").and_then(|s| parse_octal_word(s)) {
        m.page.set_pgs(v as u8);
    }

    for flat in 0..4 * 64 {
        let key = format!("PT{flat:03}");
        if let Some(v) = fields.get(key.as_str()).and_then(|s| s.trim().parse::<u32>().ok()) {
            m.page.set_entry_at_flat(flat, Pte::from_raw(v));
        }
    }

    for i in 0.. {
        let (ck, lk, ik) = (format!("IDC{i:03}"), format!("IDL{i:03}"), format!("IDI{i:03}"));
        let (Some(caller_id), Some(level), Some(identcode)) = (
            fields.get(ck.as_str()).and_then(|s| s.trim().parse::<u16>().ok()),
            fields.get(lk.as_str()).and_then(|s| s.trim().parse::<u8>().ok()),
            fields.get(ik.as_str()).and_then(|s| parse_octal_word(s)),
        ) else {
            break;
        };
        m.intr.enqueue_ident(IdentEntry {
            level,
            identcode,
            caller_id,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[test]
    fn save_then_load_round_trips_registers_and_memory() {
        let dir = std::env::temp_dir().join(format!("nd100-image-snap-test-{}", std::process::id()));
        stdfs::create_dir_all(&dir).unwrap();

        let mut m = Machine::new();
        m.mem.write_word(10, 0x4242, ByteSelect::Whole);
        m.regs.write(0, reg_idx::A, 0o12345);
        m.ctl.instruction_counter = 99;
        save(&dir, &m).unwrap();

        let mut loaded = Machine::new();
        load(&dir, &mut loaded).unwrap();
        assert_eq!(loaded.mem.read_word(10), 0x4242);
        assert_eq!(loaded.regs.read(0, reg_idx::A), 0o12345);
        assert_eq!(loaded.ctl.instruction_counter, 99);

        stdfs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_then_load_round_trips_the_ident_chain_in_order() {
        let dir = std::env::temp_dir().join(format!("nd100-image-snap-ident-{}", std::process::id()));
        stdfs::create_dir_all(&dir).unwrap();

        let mut m = Machine::new();
        m.intr.enqueue_ident(IdentEntry {
            level: 11,
            identcode: 0o21,
            caller_id: 201,
        });
        m.intr.enqueue_ident(IdentEntry {
            level: 11,
            identcode: 0o17,
            caller_id: 101,
        });
        save(&dir, &m).unwrap();

        let mut loaded = Machine::new();
        load(&dir, &mut loaded).unwrap();
        assert_eq!(loaded.intr.pop_ident(11).unwrap().caller_id, 201);
        assert_eq!(loaded.intr.pop_ident(11).unwrap().caller_id, 101);

        stdfs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn is_loadable_reflects_file_presence() {
        let dir = std::env::temp_dir().join(format!("nd100-image-snap-exists-{}", std::process::id()));
        stdfs::create_dir_all(&dir).unwrap();
        assert!(!is_loadable(&dir));
        stdfs::write(dir.join(SNAPSHOT_FILE_NAME), "INSTR_COUNT=0\n").unwrap();
        assert!(is_loadable(&dir));
        stdfs::remove_dir_all(&dir).ok();
    }
}
