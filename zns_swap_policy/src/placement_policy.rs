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

use core::marker::PhantomData;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::{
    modules::{
        policy_host::{PolicyHostModule, SwapPolicy},
        swap_info::{PageInfo, SwapInfo, SwapInfoModule},
        zone_device::ZoneDeviceModule,
    },
    policy_config::PolicyConfig,
    policy_state::PolicyState,
    zone_reclaimer::{ReclaimError, ZoneReclaimer},
};

/// Returns the zone slot for pages of process `owner_pid`.
///
/// Pages without a real owner (`owner_pid <= 0`) all go to slot 0.
/// A slot array size of zero is treated as one.
#[inline]
pub fn slot_for_owner(owner_pid: i32, slot_array_size: usize) -> usize {
    let owner = owner_pid.max(0) as usize;
    owner % slot_array_size.max(1)
}

/// Routes pages to zone slots by owning process and starts a reclaim
/// once the device runs low on free zones.
pub struct ZonePlacementPolicy<D: ZoneDeviceModule, S: SwapInfoModule> {
    device: D,
    swap: S,
    config: PolicyConfig,
    state: PolicyState,
}

impl<D: ZoneDeviceModule, S: SwapInfoModule> ZonePlacementPolicy<D, S> {
    pub fn new(device: D, swap: S, config: PolicyConfig) -> Self {
        config.check();
        assert!(
            device.zone_count() >= config.zone_count,
            "device only has {} zones but config expects {}",
            device.zone_count(),
            config.zone_count
        );

        Self {
            device,
            swap,
            state: PolicyState::new(config.zone_count),
            config,
        }
    }

    /// Returns the zone slot for page `pfn`.
    ///
    /// Never fails. If the device is below the low watermark and no reclaim
    /// is running yet, this call runs a full reclaim cycle before returning.
    pub fn place(&self, pfn: u64, ctx: &S::Context) -> usize {
        let swap = self.swap.swap_info();
        let page = self.swap.page_info(pfn, ctx);

        if self.state.observe_free_zones(swap.free_zone_count) {
            self.print_status(pfn, ctx, &swap, &page);
        }

        if swap.free_zone_count < self.config.low_watermark && !swap.reclaim_running {
            self.trigger_reclaim(swap.free_zone_count);
        }

        slot_for_owner(page.owner_pid, swap.slot_array_size)
    }

    // racy: concurrent callers can print the same change twice or not at all
    fn print_status(&self, pfn: u64, ctx: &S::Context, swap: &SwapInfo, page: &PageInfo) {
        let vm = self.swap.vm_info(pfn, ctx);
        self.state.record_status();

        info!("current free zones {}", swap.free_zone_count);
        info!(
            "current pfn {}, pid {}, cgroup {}, bitmap {:#x}, vma_size {}, zslot_array_sz {}",
            pfn,
            page.owner_pid,
            page.cgroup_id,
            page.access_bits,
            vm.region_size,
            swap.slot_array_size
        );
    }

    fn trigger_reclaim(&self, free_zones: usize) {
        let needed = self.config.high_watermark - free_zones;
        if !self.state.try_arm(needed) {
            // someone else is already reclaiming
            return;
        }

        debug!(
            "Free zones ({}) below low watermark ({}), reclaiming {} zones",
            free_zones, self.config.low_watermark, needed
        );

        match self.reclaimer().reclaim(needed) {
            Ok(_) => {}
            Err(err @ ReclaimError::NoVictim { .. }) => {
                if self.config.fail_fast {
                    panic!("reclaim invariant violated: {:?}", err);
                }
                error!("Reclaim invariant violated: {:?}", err);
            }
            Err(ReclaimError::SelectionBusy) => {
                // only possible if someone calls the reclaimer without holding the gate
                warn!("Reclaim skipped, selection set is in use");
                self.state.disarm();
            }
        }
    }

    /// Reclaimer working on the state of this policy.
    ///
    /// Calling [`ZoneReclaimer::reclaim`] directly bypasses the reclaim gate.
    pub fn reclaimer(&self) -> ZoneReclaimer<'_, D> {
        ZoneReclaimer::new(&self.device, &self.state)
    }

    #[inline]
    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D, S> SwapPolicy<S::Context> for ZonePlacementPolicy<D, S>
where
    D: ZoneDeviceModule + Send + Sync,
    S: SwapInfoModule + Send + Sync,
{
    #[inline]
    fn place(&self, pfn: u64, ctx: &S::Context) -> usize {
        ZonePlacementPolicy::place(self, pfn, ctx)
    }
}

impl<D, S> ZonePlacementPolicy<D, S>
where
    D: ZoneDeviceModule + Send + Sync + 'static,
    S: SwapInfoModule + Send + Sync + 'static,
    S::Context: 'static,
{
    /// Installs this policy as the active policy of `host`.
    ///
    /// The policy stays active until the returned registration is dropped.
    pub fn register<H: PolicyHostModule<S::Context>>(
        self,
        host: &H,
    ) -> Result<PolicyRegistration<'_, S::Context, H, Self>, ()> {
        info!("registering policy");

        let policy = Arc::new(self);
        if let Err(()) = host.register_policy(policy.clone()) {
            warn!("Host refused policy registration, another policy is active");
            return Err(());
        }

        Ok(PolicyRegistration {
            host,
            policy,
            _phantom_data: PhantomData,
        })
    }
}

/// Keeps a policy registered at a host.
///
/// Dropping this unregisters the policy. The policy state is released as
/// soon as the host dropped its handle as well.
pub struct PolicyRegistration<'h, C: 'static, H: PolicyHostModule<C>, P> {
    host: &'h H,
    policy: Arc<P>,
    _phantom_data: PhantomData<fn(&C)>,
}

impl<C: 'static, H: PolicyHostModule<C>, P> PolicyRegistration<'_, C, H, P> {
    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<C: 'static, H: PolicyHostModule<C>, P> Drop for PolicyRegistration<'_, C, H, P> {
    fn drop(&mut self) {
        info!("unregistering policy");

        if let Err(()) = self.host.unregister_policy() {
            warn!("Host failed to unregister policy");
        }
    }
}

#[cfg(test)]
mod test {
    use super::slot_for_owner;

    #[test]
    fn test_slot_for_owner() {
        assert_eq!(slot_for_owner(17, 5), 2);
        assert_eq!(slot_for_owner(-3, 5), 0);
        assert_eq!(slot_for_owner(0, 5), 0);
        assert_eq!(slot_for_owner(4, 5), 4);
        assert_eq!(slot_for_owner(5, 5), 0);
        assert_eq!(slot_for_owner(i32::MIN, 7), 0);
        assert_eq!(slot_for_owner(i32::MAX, 1), 0);
    }

    #[test]
    fn test_slot_for_owner_empty_slot_array() {
        assert_eq!(slot_for_owner(17, 0), 0);
        assert_eq!(slot_for_owner(-1, 0), 0);
    }
}
