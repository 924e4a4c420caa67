/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use super::div_ceil;

/// Fixed size bit vector, one bit per zone.
pub(crate) struct BitArray {
    arr: Box<[u8]>,
    bit_count: usize,
}

impl BitArray {
    /// Creates a new bit array with `bit_count` cleared bits
    pub(crate) fn new(bit_count: usize) -> Self {
        BitArray {
            arr: vec![0u8; div_ceil(bit_count, 8)].into_boxed_slice(),
            bit_count,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bit_count
    }

    pub(crate) fn set(&mut self, value: bool, index: usize) {
        debug_assert!(
            index < self.bit_count,
            "index {} out of range {}",
            index,
            self.bit_count
        );

        let arr_index = index / 8;
        let internal_index = index % 8;

        let item = &mut self.arr[arr_index];
        if value {
            // set bit
            *item |= 1u8 << internal_index;
        } else {
            // unset bit
            *item &= !(1u8 << internal_index);
        }
    }

    pub(crate) fn is_set(&self, index: usize) -> bool {
        let arr_index = index / 8;
        let internal_index = index % 8;

        let item = self.arr[arr_index];
        (item & (1u8 << internal_index)) != 0
    }

    /// Returns `true` if no bit is set
    pub(crate) fn is_clear(&self) -> bool {
        self.arr.iter().all(|item| *item == 0)
    }

    pub(crate) fn count_set(&self) -> usize {
        self.arr.iter().map(|item| item.count_ones() as usize).sum()
    }

    /// Returns the lowest set index that is `>= start`
    pub(crate) fn next_set(&self, start: usize) -> Option<usize> {
        (start..self.bit_count).find(|i| self.is_set(*i))
    }
}

#[cfg(test)]
mod test {
    use super::BitArray;

    #[test]
    fn test_bit_array_set_and_clear() {
        let mut arr = BitArray::new(20);
        assert_eq!(arr.len(), 20);
        assert!(arr.is_clear());

        arr.set(true, 0);
        arr.set(true, 9);
        arr.set(true, 19);
        assert!(arr.is_set(0));
        assert!(arr.is_set(9));
        assert!(arr.is_set(19));
        assert!(!arr.is_set(8));
        assert!(!arr.is_set(10));
        assert_eq!(arr.count_set(), 3);

        // clearing one bit must not touch the neighbours in the same byte
        arr.set(false, 9);
        assert!(!arr.is_set(9));
        assert!(arr.is_set(0));
        assert!(arr.is_set(19));
        assert_eq!(arr.count_set(), 2);

        arr.set(false, 0);
        arr.set(false, 19);
        assert!(arr.is_clear());
    }

    #[test]
    fn test_bit_array_next_set() {
        let mut arr = BitArray::new(17);
        assert_eq!(arr.next_set(0), None);

        arr.set(true, 3);
        arr.set(true, 8);
        arr.set(true, 16);

        assert_eq!(arr.next_set(0), Some(3));
        assert_eq!(arr.next_set(4), Some(8));
        assert_eq!(arr.next_set(9), Some(16));
        assert_eq!(arr.next_set(17), None);
    }
}
