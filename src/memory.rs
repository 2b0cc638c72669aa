// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use std::fmt;
use std::ops::{Index, IndexMut};

/// Flat, growable Intcode memory
///
/// Reading past the end yields `0`. Writing past the end zero-fills up to the written address.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Discard the current contents and replace them with `image`, reusing the allocation
    pub(crate) fn restore(&mut self, image: &[i64]) {
        self.cells.clear();
        self.cells.extend_from_slice(image);
    }

    pub(crate) fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// Grow so that `index` is in bounds
    fn ensure(&mut self, index: usize) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, 0);
        }
    }
}

impl From<&[i64]> for Memory {
    fn from(image: &[i64]) -> Self {
        Self {
            cells: image.to_vec(),
        }
    }
}

impl Index<u64> for Memory {
    type Output = i64;
    fn index(&self, address: u64) -> &i64 {
        usize::try_from(address)
            .ok()
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&0)
    }
}

impl IndexMut<u64> for Memory {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "addresses past usize::MAX could never be allocated anyway"
    )]
    fn index_mut(&mut self, address: u64) -> &mut i64 {
        let index = address as usize;
        self.ensure(index);
        &mut self.cells[index]
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // rows of 8, skipping rows that are entirely zero
        let mut fmtmap = fmt.debug_map();
        for (row, chunk) in self.cells.chunks(8).enumerate() {
            if chunk.iter().any(|&i| i != 0) {
                fmtmap.entry(&format_args!("{:04x}", row * 8), &chunk);
            }
        }
        fmtmap.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_past_end_are_zero() {
        let mem = Memory::from(&[1, 2, 3][..]);
        assert_eq!(mem[2], 3);
        assert_eq!(mem[3], 0);
        assert_eq!(mem[u64::MAX], 0);
        assert_eq!(mem.as_slice().len(), 3);
    }

    #[test]
    fn writes_past_end_zero_fill() {
        let mut mem = Memory::from(&[1, 2][..]);
        mem[5] = 7;
        assert_eq!(mem.as_slice(), &[1, 2, 0, 0, 0, 7]);
    }

    #[test]
    fn restore_discards_growth() {
        let image = [4, 5, 6];
        let mut mem = Memory::from(&image[..]);
        mem[0] = -1;
        mem[100] = 1;
        mem.restore(&image);
        assert_eq!(mem, Memory::from(&image[..]));
    }
}
