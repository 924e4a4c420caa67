use crate::{
    modules::zone_device::{SimulatedPage, SimulatedZoneDevice},
    PolicyConfig, ZonePlacementPolicy,
};

mod concurrency;

pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn test_page(owner_pid: i32) -> SimulatedPage {
    SimulatedPage {
        owner_pid,
        cgroup_id: 42,
        access_bits: 0b1011,
        vma_size: 16 * 4096,
    }
}

pub(crate) fn get_test_policy(
    device: &SimulatedZoneDevice,
    config: PolicyConfig,
) -> ZonePlacementPolicy<&SimulatedZoneDevice, &SimulatedZoneDevice> {
    init_test_logger();
    ZonePlacementPolicy::new(device, device, config)
}

/// Fills the first `harm.len()` zones, zone `i` gets `harm[i]` invalid slots
pub(crate) fn fill_zones(device: &SimulatedZoneDevice, harm: &[u64]) {
    for (zone, harm) in harm.iter().enumerate() {
        device.fill_zone(zone, *harm, 0);
    }
}
