mod placement_policy;
mod policy_access_point;
mod policy_config;
mod policy_state;
mod util;
mod zone_reclaimer;

#[cfg(test)]
mod test;

#[cfg(feature = "benchmarks")]
pub mod benchmarks;

pub use placement_policy::{slot_for_owner, PolicyRegistration, ZonePlacementPolicy};
pub use policy_access_point::PolicyAccessPoint;
pub use policy_config::{
    PolicyConfig, DEFAULT_HIGH_WATERMARK, DEFAULT_LOW_WATERMARK, DEFAULT_ZONE_COUNT,
};
pub use policy_state::{PolicyState, PolicyStats};
pub use zone_reclaimer::{ReclaimError, ZoneReclaimer};
pub mod modules;
