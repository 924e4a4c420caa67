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

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use super::{ZoneDeviceModule, ZoneIndex, ZoneInfo};
use crate::modules::swap_info::{PageInfo, SwapInfo, SwapInfoModule, VmInfo};

/// Page metadata the simulated host hands to the policy with every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulatedPage {
    pub owner_pid: i32,
    pub cgroup_id: u64,
    pub access_bits: u32,
    pub vma_size: u64,
}

struct SimulatedZone {
    info: ZoneInfo,
    reset_count: u64,
}

struct DeviceState {
    zones: Vec<SimulatedZone>,

    /// zone that is currently appended to, per zone slot
    open_zones: Vec<Option<ZoneIndex>>,
}

impl DeviceState {
    fn close_zone(&mut self, zone: ZoneIndex) {
        for open in self.open_zones.iter_mut() {
            if *open == Some(zone) {
                *open = None;
            }
        }
    }

    fn find_empty_zone(&self) -> Option<ZoneIndex> {
        self.zones
            .iter()
            .position(|zone| zone.info.occupied_slots == 0)
    }
}

/// In memory zoned swap device.
///
/// Every zone slot appends to its own open zone. Once that zone is full,
/// the next write opens the lowest empty zone.
pub struct SimulatedZoneDevice {
    state: Mutex<DeviceState>,
    zone_capacity: u64,
    reclaim_running: AtomicBool,
}

impl SimulatedZoneDevice {
    pub fn new(zone_count: usize, zone_capacity: u64, slot_array_size: usize) -> Self {
        assert!(zone_capacity > 0, "zones need at least one slot");

        let zones = (0..zone_count)
            .map(|_| SimulatedZone {
                info: ZoneInfo {
                    capacity: zone_capacity,
                    ..Default::default()
                },
                reset_count: 0,
            })
            .collect();

        Self {
            state: Mutex::new(DeviceState {
                zones,
                open_zones: vec![None; slot_array_size],
            }),
            zone_capacity,
            reclaim_running: AtomicBool::new(false),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        // counters stay consistent even if a test thread panicked while holding the lock
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn zone_capacity(&self) -> u64 {
        self.zone_capacity
    }

    pub fn slot_array_size(&self) -> usize {
        self.lock().open_zones.len()
    }

    /// Overwrites the counters of `zone`
    pub fn set_zone(&self, zone: ZoneIndex, info: ZoneInfo) {
        let mut state = self.lock();
        state.close_zone(zone);
        state.zones[zone].info = info;
    }

    /// Marks `zone` as completely written with the given amount of dead slots
    pub fn fill_zone(&self, zone: ZoneIndex, invalid_slots: u64, swap_cache_slots: u64) {
        self.set_zone(
            zone,
            ZoneInfo {
                capacity: self.zone_capacity,
                occupied_slots: self.zone_capacity,
                invalid_slots,
                swap_cache_slots,
            },
        );
    }

    /// Appends one page to the zone opened for `slot`.
    ///
    /// Returns the zone the page was written to, or `Err` if no empty zone
    /// is left to open.
    pub fn write_page(&self, slot: usize) -> Result<ZoneIndex, ()> {
        let mut state = self.lock();
        if slot >= state.open_zones.len() {
            return Err(());
        }

        let zone = match state.open_zones[slot] {
            Some(zone) if !state.zones[zone].info.is_full() => zone,
            _ => {
                let zone = state.find_empty_zone().ok_or(())?;
                state.open_zones[slot] = Some(zone);
                zone
            }
        };

        state.zones[zone].info.occupied_slots += 1;
        Ok(zone)
    }

    /// Marks `count` written slots of `zone` as invalid
    pub fn invalidate_slots(&self, zone: ZoneIndex, count: u64) {
        let mut state = self.lock();
        let info = &mut state.zones[zone].info;
        info.invalid_slots = (info.invalid_slots + count).min(info.occupied_slots);
    }

    pub fn set_swap_cache_slots(&self, zone: ZoneIndex, count: u64) {
        let mut state = self.lock();
        let info = &mut state.zones[zone].info;
        info.swap_cache_slots = count.min(info.occupied_slots);
    }

    /// Simulates the device resetting zones on its own
    pub fn set_reclaim_running(&self, running: bool) {
        self.reclaim_running.store(running, Ordering::SeqCst);
    }

    pub fn free_zone_count(&self) -> usize {
        self.lock()
            .zones
            .iter()
            .filter(|zone| zone.info.occupied_slots == 0)
            .count()
    }

    pub fn full_zone_count(&self) -> usize {
        self.lock()
            .zones
            .iter()
            .filter(|zone| zone.info.is_full())
            .count()
    }

    /// How often `zone` was reset
    pub fn reset_count(&self, zone: ZoneIndex) -> u64 {
        self.lock().zones[zone].reset_count
    }

    pub fn total_reset_count(&self) -> u64 {
        self.lock().zones.iter().map(|zone| zone.reset_count).sum()
    }
}

impl ZoneDeviceModule for SimulatedZoneDevice {
    fn zone_count(&self) -> usize {
        self.lock().zones.len()
    }

    fn zone_info(&self, zone: ZoneIndex) -> ZoneInfo {
        self.lock().zones[zone].info
    }

    fn reclaim_zone(&self, zone: ZoneIndex) {
        let mut state = self.lock();
        state.close_zone(zone);

        let zone = &mut state.zones[zone];
        zone.info = ZoneInfo {
            capacity: self.zone_capacity,
            ..Default::default()
        };
        zone.reset_count += 1;
    }
}

impl SwapInfoModule for SimulatedZoneDevice {
    type Context = SimulatedPage;

    fn swap_info(&self) -> SwapInfo {
        SwapInfo {
            free_zone_count: self.free_zone_count(),
            reclaim_running: self.reclaim_running.load(Ordering::SeqCst),
            slot_array_size: self.slot_array_size(),
        }
    }

    fn page_info(&self, _pfn: u64, ctx: &SimulatedPage) -> PageInfo {
        PageInfo {
            owner_pid: ctx.owner_pid,
            cgroup_id: ctx.cgroup_id,
            access_bits: ctx.access_bits,
        }
    }

    fn vm_info(&self, _pfn: u64, ctx: &SimulatedPage) -> VmInfo {
        VmInfo {
            region_size: ctx.vma_size,
        }
    }
}
