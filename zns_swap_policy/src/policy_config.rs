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

#[cfg(feature = "benchmarks")]
use serde::Serialize;
use static_assertions::const_assert;

use crate::modules::zone_device::ZoneDeviceModule;

pub const DEFAULT_ZONE_COUNT: usize = 20;
pub const DEFAULT_LOW_WATERMARK: usize = 7;
pub const DEFAULT_HIGH_WATERMARK: usize = 10;

const_assert!(DEFAULT_LOW_WATERMARK <= DEFAULT_HIGH_WATERMARK);
const_assert!(DEFAULT_HIGH_WATERMARK <= DEFAULT_ZONE_COUNT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "benchmarks", derive(Serialize))]
pub struct PolicyConfig {
    /// a reclaim is started once fewer zones than this are free
    pub low_watermark: usize,

    /// a reclaim resets zones until this many zones would be free again
    pub high_watermark: usize,

    /// number of zones of the device
    pub zone_count: usize,

    /// Panic if a reclaim cannot find enough victims.
    ///
    /// If unset, the violation is only logged and placement continues.
    pub fail_fast: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            low_watermark: DEFAULT_LOW_WATERMARK,
            high_watermark: DEFAULT_HIGH_WATERMARK,
            zone_count: DEFAULT_ZONE_COUNT,
            fail_fast: true,
        }
    }
}

impl PolicyConfig {
    /// Default watermarks, zone count taken from `device`
    pub fn for_device<D: ZoneDeviceModule>(device: &D) -> Self {
        Self {
            zone_count: device.zone_count(),
            ..Default::default()
        }
    }

    pub(crate) fn check(&self) {
        assert!(
            self.low_watermark <= self.high_watermark,
            "low watermark ({}) has to be smaller or equal to the high watermark ({})",
            self.low_watermark,
            self.high_watermark
        );
        assert!(
            self.high_watermark <= self.zone_count,
            "high watermark ({}) is bigger than the zone count ({})",
            self.high_watermark,
            self.zone_count
        );
    }
}

#[cfg(test)]
mod test {
    use super::PolicyConfig;
    use crate::modules::zone_device::SimulatedZoneDevice;

    #[test]
    fn test_default_config() {
        let config = PolicyConfig::default();
        assert_eq!(config.low_watermark, 7);
        assert_eq!(config.high_watermark, 10);
        assert_eq!(config.zone_count, 20);
        assert!(config.fail_fast);
        config.check();
    }

    #[test]
    fn test_config_for_device() {
        let device = SimulatedZoneDevice::new(32, 16, 4);
        let config = PolicyConfig::for_device(&device);
        assert_eq!(config.zone_count, 32);
        assert_eq!(config.low_watermark, 7);
        assert_eq!(config.high_watermark, 10);
    }

    #[test]
    #[should_panic]
    fn test_config_inverted_watermarks() {
        PolicyConfig {
            low_watermark: 10,
            high_watermark: 7,
            ..Default::default()
        }
        .check();
    }

    #[test]
    #[should_panic]
    fn test_config_high_watermark_above_zone_count() {
        PolicyConfig {
            zone_count: 8,
            ..Default::default()
        }
        .check();
    }
}
