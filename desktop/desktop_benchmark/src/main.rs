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

use std::time::Instant;

use env_logger::{Builder, Env};
use zns_swap_policy::benchmarks::{
    run_all_benchmarks, BenchmarkRunOptions, RunAllBenchmarkOptions, Timer,
};

struct DesktopTimer {
    start_time: Instant,
}

impl Timer for DesktopTimer {
    fn get_ticks_per_ms() -> u32 {
        1_000_000
    }

    #[inline]
    fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    #[inline]
    fn stop(self) -> u32 {
        self.start_time.elapsed().as_nanos() as u32
    }
}

fn main() {
    // status records of the policy would flood the benchmark output
    Builder::from_env(Env::default())
        .filter_level(log::LevelFilter::Warn)
        .format_module_path(false)
        .init();

    const REPETITIONS: usize = 50;
    let mut result_buffer = [0u32; REPETITIONS];

    run_all_benchmarks::<DesktopTimer>(
        BenchmarkRunOptions {
            repetitions: REPETITIONS as u32,
            result_buffer: &mut result_buffer,
            cold_start: 5,
            machine_name: "desktop",
        },
        RunAllBenchmarkOptions::all(),
    );
}
