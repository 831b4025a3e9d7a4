//! HDD disk image file I/O (spec §6): fixed geometry 823 cylinders x 5
//! surfaces x 18 sectors x 1024 bytes, file `hdd.img`. Grounded in
//! `examples/original_source/io.c`'s `hdd_thread`, whose "75MB" geometry
//! branch is the one left active (see DESIGN.md for the other-geometry
//! Open Question resolution).

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::ImageError;

pub const CYLINDERS: u16 = 823;
pub const SURFACES: u16 = 5;
pub const SECTORS_PER_TRACK: u16 = 18;
pub const BYTES_PER_SECTOR: usize = 1024;
pub const WORDS_PER_SECTOR: usize = BYTES_PER_SECTOR / 2;

pub fn image_path(dir: &Path) -> PathBuf {
    dir.join("hdd.img")
}

/// `((track * 5 + surface) * 18 + sector) * 1024`, per spec §6.
pub fn byte_offset(track: u16, surface: u16, sector: u16) -> u64 {
    (((track as u64 * SURFACES as u64) + surface as u64) * SECTORS_PER_TRACK as u64 + sector as u64)
        * BYTES_PER_SECTOR as u64
}

fn io_err(path: &Path, source: std::io::Error) -> ImageError {
    ImageError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn sector_read(
    path: &Path,
    track: u16,
    surface: u16,
    sector: u16,
) -> Result<[u16; WORDS_PER_SECTOR], ImageError> {
    let mut file = OpenOptions::new().read(true).open(path).map_err(|e| io_err(path, e))?;
    file.seek(SeekFrom::Start(byte_offset(track, surface, sector)))
        .map_err(|e| io_err(path, e))?;
    let mut raw = [0u8; BYTES_PER_SECTOR];
    file.read_exact(&mut raw).map_err(|e| io_err(path, e))?;
    let mut words = [0u16; WORDS_PER_SECTOR];
    for (w, pair) in words.iter_mut().zip(raw.chunks_exact(2)) {
        *w = u16::from_be_bytes([pair[0], pair[1]]);
    }
    Ok(words)
}

pub fn sector_write(
    path: &Path,
    track: u16,
    surface: u16,
    sector: u16,
    words: &[u16; WORDS_PER_SECTOR],
) -> Result<(), ImageError> {
    let mut file = OpenOptions::new().read(true).write(true).open(path).map_err(|e| io_err(path, e))?;
    file.seek(SeekFrom::Start(byte_offset(track, surface, sector)))
        .map_err(|e| io_err(path, e))?;
    let mut raw = [0u8; BYTES_PER_SECTOR];
    for (pair, w) in raw.chunks_exact_mut(2).zip(words.iter()) {
        pair.copy_from_slice(&w.to_be_bytes());
    }
    file.write_all(&raw).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn byte_offset_matches_the_geometry_formula() {
        assert_eq!(byte_offset(0, 0, 0), 0);
        assert_eq!(byte_offset(0, 0, 1), 1024);
        assert_eq!(byte_offset(0, 1, 0), 18 * 1024);
        assert_eq!(byte_offset(1, 0, 0), 5 * 18 * 1024);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = std::env::temp_dir().join(format!("nd100-image-hdd-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = image_path(&dir);
        fs::write(&path, vec![0u8; BYTES_PER_SECTOR * 2]).unwrap();

        let mut words = [0u16; WORDS_PER_SECTOR];
        words[0] = 0xface;
        sector_write(&path, 0, 0, 1, &words).unwrap();
        let back = sector_read(&path, 0, 0, 1).unwrap();
        assert_eq!(back[0], 0xface);

        fs::remove_dir_all(&dir).ok();
    }
}
