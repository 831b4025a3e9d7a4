//! BPUN ("Binary Punch") load-image format (spec §6), grounded in
//! `examples/original_source/nd100lib.c`'s `bpun_load`: a 7-bit ASCII
//! header terminated by `!`, then big-endian `load_address`/`word_count`,
//! `word_count` big-endian payload words, a 16-bit arithmetic checksum of
//! the payload, and a 16-bit action code.

use nd100_core::memory::{ByteSelect, MemoryStore};

use crate::error::ImageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpunImage {
    pub header: String,
    pub load_address: u16,
    pub payload: Vec<u16>,
    pub checksum: u16,
    pub action_code: u16,
}

impl BpunImage {
    /// The checksum the original computes: the arithmetic (wrapping) sum
    /// of the payload words modulo 2^16.
    pub fn computed_checksum(&self) -> u16 {
        self.payload.iter().fold(0u16, |acc, w| acc.wrapping_add(*w))
    }

    pub fn checksum_valid(&self) -> bool {
        self.checksum == self.computed_checksum()
    }

    /// Writes `payload` into `mem` starting at `load_address`, the way
    /// `bpun_load` pokes words directly into `VolatileMemory` as it reads
    /// them.
    pub fn apply(&self, mem: &mut MemoryStore) {
        let mut addr = self.load_address;
        for word in &self.payload {
            mem.write_word(addr, *word, ByteSelect::Whole);
            addr = addr.wrapping_add(1);
        }
    }
}

fn read_u16(bytes: &[u8], pos: &mut usize) -> Option<u16> {
    let hi = *bytes.get(*pos)? as u16;
    let lo = *bytes.get(*pos + 1)? as u16;
    *pos += 2;
    Some((hi << 8) | lo)
}

/// Parse a full BPUN file's bytes (header onward) into a `BpunImage`.
/// Does not validate the checksum — callers check `checksum_valid`
/// themselves so a mismatch can be reported rather than silently refused,
/// matching the original which only logs a mismatch.
pub fn parse(bytes: &[u8]) -> Result<BpunImage, ImageError> {
    let bang = bytes
        .iter()
        .position(|&b| b == b'!')
        .ok_or(ImageError::BadBpunHeader)?;
    let header = String::from_utf8_lossy(&bytes[..bang]).into_owned();
    let mut pos = bang + 1;

    let load_address = read_u16(bytes, &mut pos).ok_or(ImageError::BadBpunHeader)?;
    let word_count = read_u16(bytes, &mut pos).ok_or(ImageError::BadBpunHeader)?;

    let mut payload = Vec::with_capacity(word_count as usize);
    for _ in 0..word_count {
        payload.push(read_u16(bytes, &mut pos).ok_or(ImageError::BadBpunHeader)?);
    }

    let checksum = read_u16(bytes, &mut pos).ok_or(ImageError::BadBpunHeader)?;
    let action_code = read_u16(bytes, &mut pos).ok_or(ImageError::BadBpunHeader)?;

    Ok(BpunImage {
        header,
        load_address,
        payload,
        checksum,
        action_code,
    })
}

/// Serialize a `BpunImage` back to bytes, recomputing the checksum field
/// from the current payload (used by test fixtures and round-trip tests;
/// the emulator itself is load-only).
pub fn serialize(header: &str, load_address: u16, payload: &[u16], action_code: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(header.as_bytes());
    out.push(b'!');
    out.extend_from_slice(&load_address.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    for word in payload {
        out.extend_from_slice(&word.to_be_bytes());
    }
    let checksum = payload.iter().fold(0u16, |acc, w| acc.wrapping_add(*w));
    out.extend_from_slice(&checksum.to_be_bytes());
    out.extend_from_slice(&action_code.to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_spec_example_and_validates_checksum() {
        let bytes = [
            b'1', b'2', b'3', b'!', 0x00, 0x00, 0x00, 0x02, 0x00, 0x05, 0x00, 0x07, 0x00, 0x0C,
            0x00, 0x00,
        ];
        let img = parse(&bytes).unwrap();
        assert_eq!(img.header, "123");
        assert_eq!(img.load_address, 0);
        assert_eq!(img.payload, vec![5, 7]);
        assert_eq!(img.checksum, 0x000C);
        assert!(img.checksum_valid());
    }

    #[test]
    fn apply_pokes_payload_starting_at_load_address() {
        let bytes = serialize("hdr", 100, &[0x1111, 0x2222, 0x3333], 0);
        let img = parse(&bytes).unwrap();
        let mut mem = MemoryStore::new();
        img.apply(&mut mem);
        assert_eq!(mem.read_word(100), 0x1111);
        assert_eq!(mem.read_word(101), 0x2222);
        assert_eq!(mem.read_word(102), 0x3333);
    }

    #[test]
    fn mismatched_checksum_is_detected_not_rejected_at_parse() {
        let mut bytes = serialize("hdr", 0, &[1, 2, 3], 0);
        let checksum_pos = bytes.len() - 4;
        bytes[checksum_pos] = 0xff;
        let img = parse(&bytes).unwrap();
        assert!(!img.checksum_valid());
    }

    #[test]
    fn missing_bang_is_a_bad_header() {
        assert!(matches!(parse(b"no terminator here"), Err(ImageError::BadBpunHeader)));
    }
}
