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

use log::{debug, error, trace, warn};

use crate::{
    modules::zone_device::{ZoneDeviceModule, ZoneIndex},
    policy_state::PolicyState,
    util::bit_array::BitArray,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimError {
    /// Fewer full zones with dead slots were found than requested.
    ///
    /// The watermark arithmetic should make this impossible, so this is an
    /// invariant violation and must not be retried.
    /// `reclaimed` zones were still reset before returning.
    NoVictim { requested: usize, reclaimed: usize },

    /// Another reclaim on the same state is in progress
    SelectionBusy,
}

impl ReclaimError {
    /// Returns `true` for errors that indicate a broken invariant
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReclaimError::NoVictim { .. })
    }
}

/// Picks full zones with the most dead slots and resets them.
///
/// Only one reclaimer may run per [`PolicyState`] at a time, the caller has
/// to hold the reclaim gate.
pub struct ZoneReclaimer<'a, D: ZoneDeviceModule> {
    device: &'a D,
    state: &'a PolicyState,
}

impl<'a, D: ZoneDeviceModule> ZoneReclaimer<'a, D> {
    pub fn new(device: &'a D, state: &'a PolicyState) -> Self {
        Self { device, state }
    }

    /// Resets `target_count` distinct zones and releases the reclaim gate.
    ///
    /// Returns the number of zones that were reset.
    pub fn reclaim(&self, target_count: usize) -> Result<usize, ReclaimError> {
        let mut selection = match self.state.lock_selection() {
            Some(selection) => selection,
            None => {
                warn!(
                    "Reclaim of {} zones requested while another reclaim is running",
                    target_count
                );
                return Err(ReclaimError::SelectionBusy);
            }
        };

        debug_assert!(
            selection.is_clear(),
            "selection set has to be empty outside of a reclaim cycle"
        );

        let mut res = Ok(target_count);
        for picked in 0..target_count {
            // zone counters can change between two picks, so always scan again
            match self.find_victim(&selection) {
                Some(zone) => selection.set(true, zone),
                None => {
                    error!(
                        "No reclaimable zone left after {} of {} picks",
                        picked, target_count
                    );
                    res = Err(ReclaimError::NoVictim {
                        requested: target_count,
                        reclaimed: picked,
                    });
                    break;
                }
            }
        }

        // every pick marks a different zone
        debug_assert!(res.is_err() || selection.count_set() == target_count);

        let reclaimed = self.reset_selected(&mut selection);
        drop(selection);

        self.state.record_cycle(reclaimed);
        self.state.disarm();

        debug!("Reclaim cycle finished, {} zones reset", reclaimed);
        res
    }

    /// Scans all zones and returns the full, not yet selected zone with the
    /// highest harm score. On equal scores the lower index wins.
    fn find_victim(&self, selection: &BitArray) -> Option<ZoneIndex> {
        // zones without any dead slot are never worth a reset
        let mut max_harm = 0;
        let mut victim = None;

        for zone in 0..selection.len() {
            let harm = match self.device.zone_info(zone).harm_score() {
                Some(harm) => harm,
                None => continue,
            };

            if harm > max_harm && !selection.is_set(zone) {
                max_harm = harm;
                victim = Some(zone);
            }
        }

        if let Some(zone) = victim {
            trace!("Picked zone {} (harm score: {})", zone, max_harm);
        }
        victim
    }

    /// Resets all selected zones in ascending order and clears the selection
    fn reset_selected(&self, selection: &mut BitArray) -> usize {
        let mut count = 0;
        let mut next = selection.next_set(0);

        while let Some(zone) = next {
            self.device.reclaim_zone(zone);
            selection.set(false, zone);
            count += 1;

            next = selection.next_set(zone + 1);
        }

        count
    }
}
