use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Barrier,
    },
    thread,
    time::{Duration, Instant},
};

use super::{fill_zones, get_test_policy, init_test_logger, test_page};
use crate::{
    modules::{
        swap_info::{PageInfo, SwapInfo, SwapInfoModule, VmInfo},
        zone_device::{SimulatedPage, SimulatedZoneDevice, ZoneDeviceModule, ZoneIndex, ZoneInfo},
    },
    PolicyConfig, ZonePlacementPolicy,
};

const THREAD_COUNT: usize = 16;
const ZONE_COUNT: usize = 20;

/// Device that always reports 3 free zones and holds the first zone reset
/// back until every other caller returned from `place`.
struct GatedDevice {
    resets: Vec<AtomicU64>,
    returned: AtomicUsize,
    reclaim_calls: AtomicUsize,
}

impl GatedDevice {
    fn new() -> Self {
        Self {
            resets: (0..ZONE_COUNT).map(|_| AtomicU64::new(0)).collect(),
            returned: AtomicUsize::new(0),
            reclaim_calls: AtomicUsize::new(0),
        }
    }
}

impl ZoneDeviceModule for GatedDevice {
    fn zone_count(&self) -> usize {
        ZONE_COUNT
    }

    fn zone_info(&self, zone: ZoneIndex) -> ZoneInfo {
        ZoneInfo {
            capacity: 8,
            occupied_slots: 8,
            invalid_slots: zone as u64 + 1,
            swap_cache_slots: 0,
        }
    }

    fn reclaim_zone(&self, zone: ZoneIndex) {
        if self.reclaim_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            // don't hang forever if the gate is broken
            let deadline = Instant::now() + Duration::from_secs(10);
            while self.returned.load(Ordering::SeqCst) < THREAD_COUNT - 1
                && Instant::now() < deadline
            {
                thread::yield_now();
            }
        }
        self.resets[zone].fetch_add(1, Ordering::SeqCst);
    }
}

impl SwapInfoModule for GatedDevice {
    type Context = SimulatedPage;

    fn swap_info(&self) -> SwapInfo {
        SwapInfo {
            free_zone_count: 3,
            reclaim_running: false,
            slot_array_size: 8,
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

#[test]
fn test_concurrent_place_runs_one_reclaim() {
    init_test_logger();

    let device = GatedDevice::new();
    let policy = ZonePlacementPolicy::new(&device, &device, PolicyConfig::default());
    let barrier = Barrier::new(THREAD_COUNT);

    let slots: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREAD_COUNT)
            .map(|i| {
                let policy = &policy;
                let barrier = &barrier;
                let device = &device;
                scope.spawn(move || {
                    barrier.wait();
                    let slot = policy.place(i as u64, &test_page(i as i32));
                    device.returned.fetch_add(1, Ordering::SeqCst);
                    slot
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, slot) in slots.iter().enumerate() {
        assert_eq!(*slot, i % 8);
    }

    // exactly one cycle of 10 - 3 zones
    let stats = policy.state().stats();
    assert_eq!(stats.reclaim_cycles, 1);
    assert_eq!(stats.zones_reclaimed, 7);
    assert_eq!(device.reclaim_calls.load(Ordering::SeqCst), 7);
    assert_eq!(policy.state().reclaim_demand(), 0);
    assert!(policy.state().is_selection_clear());

    // the 7 zones with the most dead slots, each reset once
    for zone in 0..ZONE_COUNT {
        let expected = if zone >= ZONE_COUNT - 7 { 1 } else { 0 };
        assert_eq!(device.resets[zone].load(Ordering::SeqCst), expected);
    }
}

#[test]
fn test_concurrent_place_on_simulated_device() {
    const PAGES_PER_THREAD: usize = 200;

    let device = SimulatedZoneDevice::new(ZONE_COUNT, 16, 4);
    fill_zones(&device, &[2; 8]);

    let config = PolicyConfig {
        fail_fast: false,
        ..Default::default()
    };
    let policy = get_test_policy(&device, config);

    thread::scope(|scope| {
        for t in 0..4 {
            let policy = &policy;
            let device = &device;
            scope.spawn(move || {
                for i in 0..PAGES_PER_THREAD {
                    let pid = (t * 7 + i) as i32;
                    let slot = policy.place((t * PAGES_PER_THREAD + i) as u64, &test_page(pid));
                    assert_eq!(slot, pid as usize % 4);

                    if let Ok(zone) = device.write_page(slot) {
                        // the page it replaced is dead now
                        device.invalidate_slots(zone, 1);
                    }
                }
            });
        }
    });

    assert_eq!(policy.state().reclaim_demand(), 0);
    assert!(policy.state().is_selection_clear());
    assert!(policy.state().stats().reclaim_cycles > 0);
}
