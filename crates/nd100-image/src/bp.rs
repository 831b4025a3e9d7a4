//! BP image format (spec §6): a raw 65536-word memory dump, big-endian,
//! with no header at all — the simplest of the three load paths the
//! original's `BootType` switch supports (`bpun_load`'s sibling, not shown
//! under its own name in the filtered original sources, but its layout is
//! fixed by spec.md directly).

use nd100_core::memory::{ByteSelect, MemoryStore};
use nd100_core::primitives::MEM_WORDS;

use crate::error::ImageError;

/// Parse a raw big-endian word dump. `bytes.len()` must be exactly
/// `2 * MEM_WORDS`.
pub fn parse(bytes: &[u8]) -> Result<Vec<u16>, ImageError> {
    if bytes.len() != MEM_WORDS * 2 {
        return Err(ImageError::BadBpLength {
            expected: MEM_WORDS * 2,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| ((pair[0] as u16) << 8) | pair[1] as u16)
        .collect())
}

pub fn apply(words: &[u16], mem: &mut MemoryStore) {
    for (addr, word) in words.iter().enumerate() {
        mem.write_word(addr as u16, *word, ByteSelect::Whole);
    }
}

/// Serialize the full 64K-word memory image back to big-endian bytes, for
/// snapshotting a `BP`-style dump (used by test fixtures).
pub fn serialize(mem: &MemoryStore) -> Vec<u8> {
    let mut out = Vec::with_capacity(MEM_WORDS * 2);
    for word in mem.as_words() {
        out.extend_from_slice(&word.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_memory_store() {
        let mut mem = MemoryStore::new();
        mem.write_word(0, 0x1234, ByteSelect::Whole);
        mem.write_word(65535, 0xabcd, ByteSelect::Whole);
        let bytes = serialize(&mem);
        let words = parse(&bytes).unwrap();
        let mut mem2 = MemoryStore::new();
        apply(&words, &mut mem2);
        assert_eq!(mem2.read_word(0), 0x1234);
        assert_eq!(mem2.read_word(65535), 0xabcd);
    }

    #[test]
    fn rejects_the_wrong_length() {
        assert!(matches!(
            parse(&[0u8; 10]),
            Err(ImageError::BadBpLength { .. })
        ));
    }
}
