//! Four-way shadow page table (spec §4.2).
//!
//! Each of the four shadow sets holds 64 page-table entries (1K words per
//! page, 64 pages = 64K words = the full virtual address space). The
//! current-page-set register (PGS) selects which shadow set backs the
//! "normal" page table (NPT) for a translation; a small number of store
//! instructions (the STATX family, spec §4.2/§4.4) instead want the
//! "alternate" page table (APT). The layout of `nd100.h`'s `union NewPT`
//! that would pin down the real APT/NPT <-> shadow-set relationship is not
//! present in `examples/original_source/` (only `cpu_state.c`'s
//! serialization of `gPT->pt_arr` survives), so this resolves the mapping
//! as: PGS selects the NPT set directly, and the APT set is the next
//! shadow set in ring order (`(pgs + 1) % 4`). See DESIGN.md.

use crate::primitives::{NUM_PAGE_SETS, PAGE_SIZE_WORDS, PTES_PER_SET};

/// A single page-table entry. Packed as a 32-bit value per spec §3: a
/// physical page number, permission flags, a page-table index field, and
/// access/dirty bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pte(u32);

const VALID_BIT: u32 = 1 << 0;
const WRITABLE_BIT: u32 = 1 << 1;
const RING_BIT: u32 = 1 << 2;
const ACCESSED_BIT: u32 = 1 << 3;
const DIRTY_BIT: u32 = 1 << 4;
const INDEX_SHIFT: u32 = 5;
const INDEX_MASK: u32 = 0x7f << INDEX_SHIFT;
const PHYS_PAGE_SHIFT: u32 = 16;

impl Pte {
    pub fn new(phys_page: u16, writable: bool, privileged: bool, index: u8) -> Self {
        let mut bits = VALID_BIT;
        if writable {
            bits |= WRITABLE_BIT;
        }
        if privileged {
            bits |= RING_BIT;
        }
        bits |= ((index as u32) << INDEX_SHIFT) & INDEX_MASK;
        bits |= (phys_page as u32) << PHYS_PAGE_SHIFT;
        Pte(bits)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Self {
        Pte(raw)
    }

    pub fn valid(self) -> bool {
        self.0 & VALID_BIT != 0
    }

    pub fn writable(self) -> bool {
        self.0 & WRITABLE_BIT != 0
    }

    pub fn privileged(self) -> bool {
        self.0 & RING_BIT != 0
    }

    pub fn accessed(self) -> bool {
        self.0 & ACCESSED_BIT != 0
    }

    pub fn dirty(self) -> bool {
        self.0 & DIRTY_BIT != 0
    }

    pub fn phys_page(self) -> u16 {
        (self.0 >> PHYS_PAGE_SHIFT) as u16
    }

    pub fn set_accessed(&mut self) {
        self.0 |= ACCESSED_BIT;
    }

    pub fn set_dirty(&mut self) {
        self.0 |= DIRTY_BIT;
    }
}

/// Which of the two logical tables a translation consulted. Needed by the
/// executor for STATX-family stores (spec §4.2, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableUsed {
    Normal,
    Alternate,
}

/// Outcome of a successful translation.
#[derive(Debug, Clone, Copy)]
pub struct Translation {
    pub phys_word_addr: u16,
    pub table_used: TableUsed,
}

/// Why a translation failed; the caller raises the matching internal
/// interrupt sub-code (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFault {
    Invalid,
    Protected,
}

#[derive(Debug, Clone)]
pub struct PageTable {
    sets: [[Pte; PTES_PER_SET]; NUM_PAGE_SETS],
    /// Current-page-set register (PGS); selects the NPT shadow set.
    pgs: u8,
}

impl PageTable {
    pub fn new() -> Self {
        Self {
            sets: [[Pte::default(); PTES_PER_SET]; NUM_PAGE_SETS],
            pgs: 0,
        }
    }

    pub fn clear(&mut self) {
        self.sets = [[Pte::default(); PTES_PER_SET]; NUM_PAGE_SETS];
    }

    pub fn pgs(&self) -> u8 {
        self.pgs
    }

    pub fn set_pgs(&mut self, pgs: u8) {
        self.pgs = pgs & 0b11;
    }

    fn npt_set(&self) -> usize {
        self.pgs as usize % NUM_PAGE_SETS
    }

    fn apt_set(&self) -> usize {
        (self.pgs as usize + 1) % NUM_PAGE_SETS
    }

    /// Flat PTE index into the 4x64 array, as used by `setpt`/`clept` and
    /// by the `PT###` records in the `cpustate.bin` snapshot format.
    pub fn flat_index(set: usize, entry: usize) -> usize {
        set * PTES_PER_SET + entry
    }

    /// The PTE governing `virt_word_addr`, without performing a full
    /// translation (no fault, no access/dirty bookkeeping). Used to check
    /// the privileged bit of the page the active level is executing out of,
    /// ahead of a privileged instruction (spec §4.6, §7
    /// "privileged-in-user").
    pub fn pte_for(&self, virt_word_addr: u16, use_apt: bool) -> Pte {
        let page_index = (virt_word_addr / PAGE_SIZE_WORDS) as usize;
        let set_idx = if use_apt { self.apt_set() } else { self.npt_set() };
        self.sets[set_idx][page_index]
    }

    pub fn entry_at_flat(&self, flat: usize) -> Pte {
        self.sets[flat / PTES_PER_SET][flat % PTES_PER_SET]
    }

    pub fn set_entry_at_flat(&mut self, flat: usize, pte: Pte) {
        self.sets[flat / PTES_PER_SET][flat % PTES_PER_SET] = pte;
    }

    /// `SETPT`: write a PTE (spec §4.6).
    pub fn setpt(&mut self, pte_index: usize, value: Pte) {
        self.set_entry_at_flat(pte_index, value);
    }

    /// `CLEPT`: clear a PTE (spec §4.6).
    pub fn clept(&mut self, pte_index: usize) {
        self.set_entry_at_flat(pte_index, Pte::default());
    }

    /// Translate a 16-bit virtual word address into a physical word
    /// address (spec §4.2). `use_apt` selects the alternate table for
    /// STATX-family stores; `for_write` gates the writable-bit check.
    pub fn translate(
        &mut self,
        virt_word_addr: u16,
        for_write: bool,
        use_apt: bool,
    ) -> Result<Translation, PageFault> {
        let page_index = (virt_word_addr / PAGE_SIZE_WORDS) as usize;
        let offset = virt_word_addr % PAGE_SIZE_WORDS;

        let (set_idx, table_used) = if use_apt {
            (self.apt_set(), TableUsed::Alternate)
        } else {
            (self.npt_set(), TableUsed::Normal)
        };

        let pte = &mut self.sets[set_idx][page_index];
        if !pte.valid() {
            return Err(PageFault::Invalid);
        }
        if for_write && !pte.writable() {
            return Err(PageFault::Protected);
        }

        pte.set_accessed();
        if for_write {
            pte.set_dirty();
        }

        let phys_word_addr = (pte.phys_page() as u32) * (PAGE_SIZE_WORDS as u32) + offset as u32;
        Ok(Translation {
            phys_word_addr: phys_word_addr as u16,
            table_used,
        })
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_maps_page_and_offset() {
        let mut pt = PageTable::new();
        pt.setpt(3, Pte::new(7, true, false, 3));
        let t = pt.translate(3 * 1024 + 5, false, false).unwrap();
        assert_eq!(t.phys_word_addr, 7 * 1024 + 5);
        assert_eq!(t.table_used, TableUsed::Normal);
    }

    #[test]
    fn invalid_entry_faults() {
        let mut pt = PageTable::new();
        let err = pt.translate(3 * 1024, false, false).unwrap_err();
        assert_eq!(err, PageFault::Invalid);
    }

    #[test]
    fn write_to_read_only_page_faults() {
        let mut pt = PageTable::new();
        pt.setpt(0, Pte::new(0, false, false, 0));
        let err = pt.translate(0, true, false).unwrap_err();
        assert_eq!(err, PageFault::Protected);
    }

    #[test]
    fn apt_uses_the_next_shadow_set() {
        let mut pt = PageTable::new();
        pt.set_pgs(0);
        pt.setpt(PageTable::flat_index(1, 0), Pte::new(9, true, false, 0));
        let t = pt.translate(0, false, true).unwrap();
        assert_eq!(t.phys_word_addr, 9 * 1024);
        assert_eq!(t.table_used, TableUsed::Alternate);
    }
}
