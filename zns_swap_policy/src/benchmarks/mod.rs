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

#[cfg(not(test))]
use std::io::stdout;

use serde::Serialize;

mod placement;
mod reclaim_cycle;

pub use placement::*;
pub use reclaim_cycle::*;

use crate::{modules::zone_device::SimulatedZoneDevice, PolicyConfig};

pub struct RunAllBenchmarkOptions {
    pub run_placement_benchmarks: bool,
    pub run_reclaim_benchmarks: bool,
}

impl Default for RunAllBenchmarkOptions {
    fn default() -> Self {
        Self {
            run_placement_benchmarks: false,
            run_reclaim_benchmarks: false,
        }
    }
}

impl RunAllBenchmarkOptions {
    pub fn all() -> Self {
        Self {
            run_placement_benchmarks: true,
            run_reclaim_benchmarks: true,
        }
    }
}

pub fn run_all_benchmarks<TIMER: Timer>(
    mut run_options: BenchmarkRunOptions,
    options: RunAllBenchmarkOptions,
) {
    const ZONE_CAPACITY: u64 = 4096;

    if options.run_placement_benchmarks {
        for slot_array_size in [1, 4, 16] {
            let device = SimulatedZoneDevice::new(20, ZONE_CAPACITY, slot_array_size);
            let bench = PlacementBenchmark::new(&device, PolicyConfig::default());
            bench.run_benchmark::<TIMER>(&mut run_options);
        }
    }

    if options.run_reclaim_benchmarks {
        for (zone_count, target_count) in [(20, 1), (20, 10), (64, 10), (64, 32)] {
            let device = SimulatedZoneDevice::new(zone_count, ZONE_CAPACITY, 4);
            let config = PolicyConfig {
                zone_count,
                ..Default::default()
            };
            let bench = ReclaimCycleBenchmark::new(&device, config, target_count);
            bench.run_benchmark::<TIMER>(&mut run_options);
        }
    }
}

pub trait Benchmark<O: Serialize> {
    fn get_name(&self) -> &'static str;

    fn get_bench_options(&self) -> O;

    fn execute<T: Timer>(&mut self) -> u32;

    #[inline(never)]
    fn run_benchmark<T: Timer>(mut self, options: &mut BenchmarkRunOptions) -> BenchmarkRunResult
    where
        Self: Sized,
    {
        assert_eq!(options.repetitions as usize, options.result_buffer.len());

        print!("Running Benchmark \"{}\" with options ", self.get_name());

        #[cfg(not(test))]
        serde_json::to_writer(stdout(), &self.get_bench_options()).unwrap();
        println!();

        for _ in 0..options.cold_start {
            self.execute::<T>();
        }

        for i in 0..options.result_buffer.len() {
            let res = self.execute::<T>();
            options.result_buffer[i] = res;
        }

        print!("[BENCH-INFO] ");

        #[cfg(not(test))]
        {
            let run_info = BenchmarkRunInfo {
                bench_name: self.get_name(),
                bench_options: &self.get_bench_options(),
                machine_name: options.machine_name,
                cold_start: options.cold_start,
                repetitions: options.repetitions,
                ticks_per_ms: T::get_ticks_per_ms(),
                data: &options.result_buffer,
            };
            serde_json::to_writer(stdout(), &run_info).unwrap();
        }
        println!();

        let res = BenchmarkRunResult::from_buffer(&options.result_buffer);
        println!(
            "-> Finished {}: mean={}, min={}, max={}",
            self.get_name(),
            res.mean_latency,
            res.min_latency,
            res.max_latency
        );
        println!();

        res
    }
}

pub struct BenchmarkRunOptions<'a> {
    pub repetitions: u32,
    pub result_buffer: &'a mut [u32],

    pub cold_start: u32,

    pub machine_name: &'static str,
}

#[derive(Serialize)]
pub struct BenchmarkRunInfo<'a, O: Serialize> {
    bench_name: &'static str,
    bench_options: &'a O,
    machine_name: &'static str,
    cold_start: u32,
    repetitions: u32,
    ticks_per_ms: u32,
    data: &'a [u32],
}

pub struct BenchmarkRunResult {
    pub mean_latency: u32,
    pub min_latency: u32,
    pub max_latency: u32,
}

impl BenchmarkRunResult {
    fn from_buffer(buffer: &[u32]) -> Self {
        if buffer.is_empty() {
            return Self {
                mean_latency: 0,
                min_latency: 0,
                max_latency: 0,
            };
        }

        Self {
            mean_latency: (buffer.iter().map(|x| *x as u64).sum::<u64>() / buffer.len() as u64)
                as u32,
            min_latency: buffer.iter().copied().min().unwrap_or_default(),
            max_latency: buffer.iter().copied().max().unwrap_or_default(),
        }
    }
}

pub trait Timer {
    fn get_ticks_per_ms() -> u32;

    fn start() -> Self;

    fn stop(self) -> u32;
}
