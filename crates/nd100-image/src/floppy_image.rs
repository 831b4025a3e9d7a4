//! Floppy disk image file I/O (spec §6), grounded in
//! `examples/original_source/floppy.c`'s `sectorread`/`sectorwrite`: a
//! file named `floppy.nd100.NN.img`, linear 512-byte sectors, big-endian
//! words within each sector, flat sector index `(cyl + side) * 8 + sector`.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::ImageError;

pub const SECTOR_BYTES: usize = 512;
pub const SECTOR_WORDS: usize = SECTOR_BYTES / 2;

pub fn image_path(dir: &Path, disk_number: u8) -> PathBuf {
    dir.join(format!("floppy.nd100.{disk_number:02}.img"))
}

/// Flat linear sector index, matching `sectorread`'s
/// `(cyl + side) * 8 + sector` exactly (including its apparent omission of
/// a `* 2` on `cyl`, which the original's comment shows was deliberately
/// dropped from an earlier version).
pub fn sector_offset(cyl: u16, side: u16, sector: u16) -> u64 {
    let flat_sector = (cyl as u64 + side as u64) * 8 + sector as u64;
    flat_sector * SECTOR_BYTES as u64
}

fn io_err(path: &Path, source: std::io::Error) -> ImageError {
    ImageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Read one 256-word sector. Missing files/short reads are reported as
/// `ImageError::Io`; the caller (the floppy device worker) turns that into
/// a guest-visible "drive not ready" status bit (spec §7).
pub fn sector_read(path: &Path, cyl: u16, side: u16, sector: u16) -> Result<[u16; SECTOR_WORDS], ImageError> {
    let mut file = OpenOptions::new().read(true).open(path).map_err(|e| io_err(path, e))?;
    file.seek(SeekFrom::Start(sector_offset(cyl, side, sector)))
        .map_err(|e| io_err(path, e))?;
    let mut raw = [0u8; SECTOR_BYTES];
    file.read_exact(&mut raw).map_err(|e| io_err(path, e))?;
    let mut words = [0u16; SECTOR_WORDS];
    for (w, pair) in words.iter_mut().zip(raw.chunks_exact(2)) {
        *w = u16::from_be_bytes([pair[0], pair[1]]);
    }
    Ok(words)
}

/// Write one 256-word sector in place. The image file is opened
/// read+write (never created) so an accidental typo in `floppy_image`
/// configuration surfaces as a load error, not a silently created blank.
pub fn sector_write(path: &Path, cyl: u16, side: u16, sector: u16, words: &[u16; SECTOR_WORDS]) -> Result<(), ImageError> {
    let mut file = OpenOptions::new().read(true).write(true).open(path).map_err(|e| io_err(path, e))?;
    file.seek(SeekFrom::Start(sector_offset(cyl, side, sector)))
        .map_err(|e| io_err(path, e))?;
    let mut raw = [0u8; SECTOR_BYTES];
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
    fn sector_offset_matches_the_original_formula() {
        assert_eq!(sector_offset(0, 0, 0), 0);
        assert_eq!(sector_offset(0, 0, 1), 512);
        assert_eq!(sector_offset(1, 0, 0), 4096);
        assert_eq!(sector_offset(0, 1, 0), 4096);
    }

    #[test]
    fn write_then_read_round_trips_with_big_endian_swap() {
        let dir = std::env::temp_dir().join(format!("nd100-image-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = image_path(&dir, 3);
        // Pre-size the file; sector_write never creates the file itself.
        let blank = vec![0u8; SECTOR_BYTES * 4];
        fs::write(&path, &blank).unwrap();

        let mut words = [0u16; SECTOR_WORDS];
        words[0] = 0xabcd;
        words[1] = 0x1234;
        sector_write(&path, 0, 0, 2, &words).unwrap();

        let back = sector_read(&path, 0, 0, 2).unwrap();
        assert_eq!(back[0], 0xabcd);
        assert_eq!(back[1], 0x1234);

        let raw = fs::read(&path).unwrap();
        let sector_start = sector_offset(0, 0, 2) as usize;
        assert_eq!(&raw[sector_start..sector_start + 2], &[0xab, 0xcd]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = Path::new("/nonexistent/floppy.nd100.00.img");
        assert!(matches!(sector_read(path, 0, 0, 0), Err(ImageError::Io { .. })));
    }
}
