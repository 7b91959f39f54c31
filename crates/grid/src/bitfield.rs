use pf_geom::ObjectId;

use crate::{Grid, SightCache};

/// Dense row-major passability storage of `width × height` cells.
///
/// Cell `i` (row-major index) is stored in bit `i % 64` of word `i / 64`. Bits
/// past the last cell are always zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitfield {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl Bitfield {
    /// Creates a fully passable bitfield.
    pub fn new(width: u32, height: u32) -> Self {
        let mut cells = Self::blocked(width, height);
        cells.clear();
        cells
    }

    fn blocked(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            words: vec![0; (len + 63) / 64],
        }
    }

    /// Creates a bitfield from bits packed by [`Self::to_bytes`].
    ///
    /// Returns None if the number of bytes does not correspond to the number
    /// of cells.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let mut cells = Self::blocked(width, height);
        let len = cells.len();
        if bytes.len() != (len + 7) / 8 {
            return None;
        }

        for index in 0..len {
            if bytes[index / 8] & (0x80u8 >> (index % 8)) != 0 {
                cells.words[index / 64] |= 1u64 << (index % 64);
            }
        }
        Some(cells)
    }

    /// Creates a bitfield from 64-bit words as produced by
    /// [`Self::to_words`]. Missing words are treated as zeros (impassable).
    pub fn from_words(width: u32, height: u32, words: &[u64]) -> Self {
        let mut cells = Self::blocked(width, height);
        for (target, &word) in cells.words.iter_mut().zip(words) {
            *target = word;
        }
        cells.mask_tail();
        cells
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns passability of a cell. Cells outside of the bitfield are
    /// impassable.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        let index = self.index(x as u32, y as u32);
        (self.words[index / 64] >> (index % 64)) & 1 != 0
    }

    /// # Panics
    ///
    /// Panics if the cell is out of bounds.
    pub fn set(&mut self, x: u32, y: u32, passable: bool) {
        assert!(x < self.width && y < self.height);
        let index = self.index(x, y);
        let mask = 1u64 << (index % 64);
        if passable {
            self.words[index / 64] |= mask;
        } else {
            self.words[index / 64] &= !mask;
        }
    }

    /// Sets all cells to passable.
    pub fn clear(&mut self) {
        self.words.fill(u64::MAX);
        self.mask_tail();
    }

    /// Copies the region overlapping with `other`.
    pub fn copy_from(&mut self, other: &Bitfield) {
        for y in 0..self.height.min(other.height) {
            for x in 0..self.width.min(other.width) {
                self.set(x, y, other.get(x as i32, y as i32));
            }
        }
    }

    /// Returns number of impassable cells.
    pub fn count_blocked(&self) -> usize {
        let passable: u32 = self.words.iter().map(|word| word.count_ones()).sum();
        self.len() - passable as usize
    }

    /// Returns bits packed into bytes, first cell in the most significant
    /// bit of the first byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.len();
        let mut bytes = vec![0u8; (len + 7) / 8];
        for index in 0..len {
            if (self.words[index / 64] >> (index % 64)) & 1 != 0 {
                bytes[index / 8] |= 0x80u8 >> (index % 8);
            }
        }
        bytes
    }

    /// Returns bits packed into 64-bit words, cell `i` in bit `i % 64` of
    /// word `i / 64`. Trailing all-zero words are omitted.
    pub fn to_words(&self) -> Vec<u64> {
        let mut words = self.words.clone();
        while words.last() == Some(&0) {
            words.pop();
        }
        words
    }

    fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }

    /// Zeroes bits past the last cell.
    fn mask_tail(&mut self) {
        let used = self.len() % 64;
        if used > 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

/// A grid backed by directly mutable bit storage.
#[derive(Debug)]
pub struct BitfieldGrid {
    id: ObjectId,
    cells: Bitfield,
    sight: SightCache,
}

impl BitfieldGrid {
    /// Creates a fully passable grid.
    pub fn new(id: ObjectId, width: u32, height: u32) -> Self {
        Self::from_bitfield(id, Bitfield::new(width, height))
    }

    pub fn from_bitfield(id: ObjectId, cells: Bitfield) -> Self {
        Self {
            id,
            cells,
            sight: SightCache::new(),
        }
    }

    pub fn cells(&self) -> &Bitfield {
        &self.cells
    }

    /// Sets passability of a single cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of bounds.
    pub fn set(&mut self, x: u32, y: u32, passable: bool) {
        self.cells.set(x, y, passable);
        self.invalidate_sight();
    }

    /// Makes all cells passable.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.invalidate_sight();
    }

    /// Copies the region overlapping with `other`.
    pub fn copy_from(&mut self, other: &Bitfield) {
        self.cells.copy_from(other);
        self.invalidate_sight();
    }
}

impl Grid for BitfieldGrid {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn cell_width(&self) -> u32 {
        self.cells.width()
    }

    fn cell_height(&self) -> u32 {
        self.cells.height()
    }

    fn can_cell_pass(&self, x: i32, y: i32) -> bool {
        self.cells.get(x, y)
    }

    fn sight(&self) -> &SightCache {
        &self.sight
    }
}
