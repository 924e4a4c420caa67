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

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use log::debug;
#[cfg(feature = "benchmarks")]
use serde::Serialize;
use try_lock::{Locked, TryLock};

use crate::util::bit_array::BitArray;

/// Counters collected over the lifetime of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "benchmarks", derive(Serialize))]
pub struct PolicyStats {
    pub reclaim_cycles: u64,
    pub zones_reclaimed: u64,
    pub status_records: u64,
}

/// State shared by placement and reclaim.
///
/// Lives as long as the policy that owns it, dropping it releases the
/// selection set.
pub struct PolicyState {
    /// Zero if no reclaim is running, otherwise the number of zones the
    /// running cycle was armed with.
    ///
    /// Only the caller that moves this from zero to a positive value
    /// is allowed to run the reclaimer.
    reclaim_demand: AtomicUsize,

    /// Free zone count seen by the last status record.
    ///
    /// Racy, only used to decide when to print the next status record.
    last_free: AtomicUsize,

    /// Victims of the running reclaim cycle, empty otherwise
    selection: TryLock<BitArray>,
    zone_count: usize,

    reclaim_cycles: AtomicU64,
    zones_reclaimed: AtomicU64,
    status_records: AtomicU64,
}

impl PolicyState {
    pub fn new(zone_count: usize) -> Self {
        Self {
            reclaim_demand: AtomicUsize::new(0),
            last_free: AtomicUsize::new(0),
            selection: TryLock::new(BitArray::new(zone_count)),
            zone_count,
            reclaim_cycles: AtomicU64::new(0),
            zones_reclaimed: AtomicU64::new(0),
            status_records: AtomicU64::new(0),
        }
    }

    /// Tries to claim the reclaim gate for a cycle of `needed` zones.
    ///
    /// Returns `true` for exactly one caller until the gate is released again
    /// with [`Self::disarm`].
    pub(crate) fn try_arm(&self, needed: usize) -> bool {
        debug_assert!(needed > 0, "a reclaim cycle needs at least one zone");

        self.reclaim_demand
            .compare_exchange(0, needed, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the reclaim gate
    pub(crate) fn disarm(&self) {
        self.reclaim_demand.store(0, Ordering::Release);
    }

    /// Number of zones the running reclaim cycle was armed with, zero if idle
    pub fn reclaim_demand(&self) -> usize {
        self.reclaim_demand.load(Ordering::Acquire)
    }

    /// Remembers `free_zones` and returns `true` if it differs from the
    /// previously observed value.
    ///
    /// Concurrent callers can both see a change or both miss it.
    /// Never use this to decide anything but logging.
    pub(crate) fn observe_free_zones(&self, free_zones: usize) -> bool {
        if self.last_free.load(Ordering::Relaxed) == free_zones {
            return false;
        }

        self.last_free.store(free_zones, Ordering::Relaxed);
        true
    }

    pub fn last_observed_free(&self) -> usize {
        self.last_free.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn lock_selection(&self) -> Option<Locked<'_, BitArray>> {
        self.selection.try_lock()
    }

    /// Returns `true` if no zone is marked for reclaim.
    ///
    /// While a reclaim cycle runs this returns `false`.
    pub fn is_selection_clear(&self) -> bool {
        match self.selection.try_lock() {
            Some(selection) => selection.is_clear(),
            None => false,
        }
    }

    #[inline]
    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    pub(crate) fn record_cycle(&self, zones: usize) {
        self.reclaim_cycles.fetch_add(1, Ordering::Relaxed);
        self.zones_reclaimed.fetch_add(zones as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_status(&self) {
        self.status_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> PolicyStats {
        PolicyStats {
            reclaim_cycles: self.reclaim_cycles.load(Ordering::Relaxed),
            zones_reclaimed: self.zones_reclaimed.load(Ordering::Relaxed),
            status_records: self.status_records.load(Ordering::Relaxed),
        }
    }
}

impl Drop for PolicyState {
    fn drop(&mut self) {
        let stats = self.stats();
        debug!(
            "Releasing reclaim selection set (cycles: {}, zones reclaimed: {})",
            stats.reclaim_cycles, stats.zones_reclaimed
        );
    }
}

#[cfg(test)]
mod test {
    use super::PolicyState;

    #[test]
    fn test_gate_claimed_once() {
        let state = PolicyState::new(20);
        assert_eq!(state.reclaim_demand(), 0);

        assert!(state.try_arm(3));
        assert_eq!(state.reclaim_demand(), 3);

        // gate is taken until disarmed
        assert!(!state.try_arm(5));
        assert_eq!(state.reclaim_demand(), 3);

        state.disarm();
        assert_eq!(state.reclaim_demand(), 0);
        assert!(state.try_arm(5));
        assert_eq!(state.reclaim_demand(), 5);
    }

    #[test]
    fn test_observe_free_zones() {
        let state = PolicyState::new(20);
        assert_eq!(state.last_observed_free(), 0);

        assert!(state.observe_free_zones(12));
        assert!(!state.observe_free_zones(12));
        assert_eq!(state.last_observed_free(), 12);

        assert!(state.observe_free_zones(11));
        assert!(state.observe_free_zones(0));
        assert!(!state.observe_free_zones(0));
    }

    #[test]
    fn test_selection_reports_busy_while_locked() {
        let state = PolicyState::new(8);
        assert!(state.is_selection_clear());
        assert_eq!(state.zone_count(), 8);

        let mut selection = state.lock_selection().unwrap();
        selection.set(true, 2);
        assert!(state.lock_selection().is_none());
        assert!(!state.is_selection_clear());

        selection.set(false, 2);
        drop(selection);
        assert!(state.is_selection_clear());
    }
}
