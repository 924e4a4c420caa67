use std::hint::black_box;

use rand_xoshiro::{
    rand_core::{RngCore, SeedableRng},
    Xoshiro128StarStar,
};
use serde::Serialize;

use super::{Benchmark, Timer};
use crate::{
    modules::zone_device::{SimulatedZoneDevice, ZoneDeviceModule},
    PolicyConfig, ZonePlacementPolicy,
};

#[derive(Serialize)]
pub struct ReclaimCycleBenchmarkOptions {
    zone_count: usize,
    target_count: usize,
}

/// Latency of one full reclaim cycle over a device where every zone is full
pub struct ReclaimCycleBenchmark<'a> {
    policy: ZonePlacementPolicy<&'a SimulatedZoneDevice, &'a SimulatedZoneDevice>,
    rng: Xoshiro128StarStar,
    target_count: usize,
}

impl<'a> ReclaimCycleBenchmark<'a> {
    pub fn new(device: &'a SimulatedZoneDevice, config: PolicyConfig, target_count: usize) -> Self {
        assert!(
            target_count <= config.zone_count,
            "cannot reclaim more zones than there are"
        );

        const SEED: [u8; 16] = [
            149, 228, 163, 172, 175, 184, 104, 86, 131, 185, 95, 73, 18, 58, 248, 111,
        ];

        Self {
            policy: ZonePlacementPolicy::new(device, device, config),
            rng: Xoshiro128StarStar::from_seed(SEED),
            target_count,
        }
    }

    fn fill_device(&mut self) {
        let device = *self.policy.device();
        let capacity = device.zone_capacity();

        for zone in 0..device.zone_count() {
            // at least one dead slot, so every zone is a candidate
            let invalid = 1 + self.rng.next_u64() % capacity;
            let cached = self.rng.next_u64() % (capacity - invalid + 1);
            device.fill_zone(zone, invalid, cached);
        }
    }
}

impl Benchmark<ReclaimCycleBenchmarkOptions> for ReclaimCycleBenchmark<'_> {
    fn get_name(&self) -> &'static str {
        "reclaim_cycle"
    }

    fn get_bench_options(&self) -> ReclaimCycleBenchmarkOptions {
        ReclaimCycleBenchmarkOptions {
            zone_count: self.policy.config().zone_count,
            target_count: self.target_count,
        }
    }

    fn execute<T: Timer>(&mut self) -> u32 {
        self.fill_device();
        let reclaimer = self.policy.reclaimer();

        let timer = T::start();

        let res = black_box(reclaimer.reclaim(self.target_count));

        let ticks = timer.stop();
        assert_eq!(res, Ok(self.target_count));
        ticks
    }
}
