use std::hint::black_box;

use rand_xoshiro::{
    rand_core::{RngCore, SeedableRng},
    Xoshiro128StarStar,
};
use serde::Serialize;

use super::{Benchmark, Timer};
use crate::{
    modules::zone_device::{SimulatedPage, SimulatedZoneDevice},
    PolicyConfig, ZonePlacementPolicy,
};

#[derive(Serialize)]
pub struct PlacementBenchmarkOptions {
    slot_array_size: usize,
    config: PolicyConfig,
}

/// Latency of one `place` call while enough zones are free
pub struct PlacementBenchmark<'a> {
    policy: ZonePlacementPolicy<&'a SimulatedZoneDevice, &'a SimulatedZoneDevice>,
    rng: Xoshiro128StarStar,
    next_pfn: u64,
}

impl<'a> PlacementBenchmark<'a> {
    pub fn new(device: &'a SimulatedZoneDevice, config: PolicyConfig) -> Self {
        const SEED: [u8; 16] = [
            17, 47, 137, 149, 21, 154, 201, 98, 148, 76, 203, 156, 140, 247, 234, 183,
        ];

        Self {
            policy: ZonePlacementPolicy::new(device, device, config),
            rng: Xoshiro128StarStar::from_seed(SEED),
            next_pfn: 0,
        }
    }
}

impl Benchmark<PlacementBenchmarkOptions> for PlacementBenchmark<'_> {
    fn get_name(&self) -> &'static str {
        "placement"
    }

    fn get_bench_options(&self) -> PlacementBenchmarkOptions {
        PlacementBenchmarkOptions {
            slot_array_size: self.policy.device().slot_array_size(),
            config: *self.policy.config(),
        }
    }

    fn execute<T: Timer>(&mut self) -> u32 {
        let page = SimulatedPage {
            owner_pid: (self.rng.next_u32() % 4096) as i32,
            cgroup_id: 1,
            access_bits: self.rng.next_u32(),
            vma_size: 4096,
        };
        self.next_pfn += 1;

        let timer = T::start();

        black_box(self.policy.place(self.next_pfn, &page));

        timer.stop()
    }
}
