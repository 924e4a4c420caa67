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

use std::sync::Arc;

use env_logger::{Builder, Env};
use log::warn;
use rand::{rngs::SmallRng, RngCore, SeedableRng};
use zns_swap_policy::{
    modules::zone_device::{SimulatedPage, SimulatedZoneDevice, ZoneDeviceModule},
    PolicyAccessPoint, PolicyConfig, ZonePlacementPolicy, DEFAULT_ZONE_COUNT,
};

const SEED: u64 = 5446535461589659585;
const ZONE_CAPACITY: u64 = 256;
const SLOT_ARRAY_SIZE: usize = 8;
const PAGE_COUNT: u64 = 50_000;

fn main() {
    Builder::from_env(Env::default())
        .filter_level(log::LevelFilter::Info)
        .format_module_path(false)
        .init();

    let device = Arc::new(SimulatedZoneDevice::new(
        DEFAULT_ZONE_COUNT,
        ZONE_CAPACITY,
        SLOT_ARRAY_SIZE,
    ));
    let host = PolicyAccessPoint::empty();

    let config = PolicyConfig::for_device(device.as_ref());
    let registration = ZonePlacementPolicy::new(device.clone(), device.clone(), config)
        .register(&host)
        .expect("no other policy is registered");

    // a few user processes and pages without owner
    let mut processes: Vec<SimulatedPage> = (0..12)
        .map(|i| SimulatedPage {
            owner_pid: 1000 + i,
            cgroup_id: (i % 3) as u64,
            access_bits: 0,
            vma_size: 4096 * (1 + i as u64) * 64,
        })
        .collect();
    processes.push(SimulatedPage {
        owner_pid: 0,
        cgroup_id: 0,
        access_bits: 0,
        vma_size: 4096,
    });

    let mut rand = SmallRng::seed_from_u64(SEED);
    let mut swapped_out = 0u64;
    let mut rejected = 0u64;

    for pfn in 0..PAGE_COUNT {
        let mut page = processes[rand.next_u32() as usize % processes.len()];
        page.access_bits = rand.next_u32() & 0xff;

        let slot = host.place(pfn, &page).unwrap_or(0);
        match device.write_page(slot) {
            Ok(_) => swapped_out += 1,
            Err(()) => {
                warn!("No free zone left for pfn {}", pfn);
                rejected += 1;
            }
        }

        // some other page gets freed or is swapped in again
        let zone = rand.next_u32() as usize % device.zone_count();
        if rand.next_u32() % 3 == 0 {
            let cached = device.zone_info(zone).swap_cache_slots;
            device.set_swap_cache_slots(zone, cached + 1);
        } else {
            device.invalidate_slots(zone, 1);
        }
    }

    let stats = registration.policy().state().stats();
    println!(
        "swapped out: {}, rejected: {}, reclaim cycles: {}, zones reclaimed: {}, \
         status records: {}",
        swapped_out, rejected, stats.reclaim_cycles, stats.zones_reclaimed, stats.status_records
    );

    drop(registration);
}
