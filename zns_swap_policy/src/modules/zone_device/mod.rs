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

mod simulated;

pub use simulated::{SimulatedPage, SimulatedZoneDevice};

use std::sync::Arc;

pub type ZoneIndex = usize;

/// Live counters of one zone as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneInfo {
    /// number of slots this zone can hold
    pub capacity: u64,

    /// slots that were written since the last reset
    pub occupied_slots: u64,

    /// written slots whose page was freed or swapped in again
    pub invalid_slots: u64,

    /// written slots that still have a copy in the swap cache
    pub swap_cache_slots: u64,
}

impl ZoneInfo {
    /// A zone is full once its write pointer reached the end of the zone
    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied_slots >= self.capacity
    }

    /// Returns the harm score of this zone or `None` if the zone is not full
    /// (and can therefore not be reclaimed).
    ///
    /// The higher the score, the less live data has to be moved if
    /// this zone is reset.
    #[inline]
    pub fn harm_score(&self) -> Option<u64> {
        if self.is_full() {
            Some(self.invalid_slots.saturating_add(self.swap_cache_slots))
        } else {
            None
        }
    }
}

pub trait ZoneDeviceModule {
    /// Number of zones the device exposes
    fn zone_count(&self) -> usize;

    /// Returns the current counters of zone `zone`.
    ///
    /// Values can change between two calls, callers should not cache them.
    fn zone_info(&self, zone: ZoneIndex) -> ZoneInfo;

    /// Resets `zone` so that it can be written again.
    ///
    /// This is assumed to be synchronous and to always succeed.
    fn reclaim_zone(&self, zone: ZoneIndex);
}

impl<T: ZoneDeviceModule + ?Sized> ZoneDeviceModule for &T {
    #[inline]
    fn zone_count(&self) -> usize {
        (**self).zone_count()
    }

    #[inline]
    fn zone_info(&self, zone: ZoneIndex) -> ZoneInfo {
        (**self).zone_info(zone)
    }

    #[inline]
    fn reclaim_zone(&self, zone: ZoneIndex) {
        (**self).reclaim_zone(zone)
    }
}

impl<T: ZoneDeviceModule + ?Sized> ZoneDeviceModule for Arc<T> {
    #[inline]
    fn zone_count(&self) -> usize {
        (**self).zone_count()
    }

    #[inline]
    fn zone_info(&self, zone: ZoneIndex) -> ZoneInfo {
        (**self).zone_info(zone)
    }

    #[inline]
    fn reclaim_zone(&self, zone: ZoneIndex) {
        (**self).reclaim_zone(zone)
    }
}

#[cfg(test)]
mod test {
    use super::ZoneInfo;

    #[test]
    fn test_harm_score_only_for_full_zones() {
        let partial = ZoneInfo {
            capacity: 64,
            occupied_slots: 63,
            invalid_slots: 50,
            swap_cache_slots: 10,
        };
        assert!(!partial.is_full());
        assert_eq!(partial.harm_score(), None);

        let full = ZoneInfo {
            occupied_slots: 64,
            ..partial
        };
        assert!(full.is_full());
        assert_eq!(full.harm_score(), Some(60));
    }

    #[test]
    fn test_harm_score_saturates() {
        let zone = ZoneInfo {
            capacity: 64,
            occupied_slots: 64,
            invalid_slots: u64::MAX,
            swap_cache_slots: 3,
        };
        assert_eq!(zone.harm_score(), Some(u64::MAX));
    }
}
