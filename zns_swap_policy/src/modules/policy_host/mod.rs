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

use std::sync::Arc;

/// Entry point the host calls for every page that needs a zone slot.
///
/// Called from many threads at the same time.
pub trait SwapPolicy<C>: Send + Sync {
    /// Returns the zone slot for page `pfn`. Has to be smaller than the
    /// slot array size of the device.
    fn place(&self, pfn: u64, ctx: &C) -> usize;
}

pub trait PolicyHostModule<C: 'static> {
    /// Installs `policy` as the active placement policy.
    ///
    /// Fails if another policy is already active.
    fn register_policy(&self, policy: Arc<dyn SwapPolicy<C>>) -> Result<(), ()>;

    /// Removes the active policy again
    fn unregister_policy(&self) -> Result<(), ()>;
}
