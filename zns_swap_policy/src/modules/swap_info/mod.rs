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

/// Snapshot of the swap device state.
///
/// The fields are not read atomically with respect to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapInfo {
    pub free_zone_count: usize,

    /// set if the device itself is already resetting zones
    pub reclaim_running: bool,

    /// number of zone slots pages can be routed to
    pub slot_array_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    /// id of the owning process, can be zero or negative for kernel pages
    pub owner_pid: i32,
    pub cgroup_id: u64,
    pub access_bits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VmInfo {
    /// size in bytes of the vm region the page belongs to
    pub region_size: u64,
}

pub trait SwapInfoModule {
    /// Opaque per call context the host passes along with the page
    type Context;

    fn swap_info(&self) -> SwapInfo;

    fn page_info(&self, pfn: u64, ctx: &Self::Context) -> PageInfo;

    fn vm_info(&self, pfn: u64, ctx: &Self::Context) -> VmInfo;
}

impl<T: SwapInfoModule + ?Sized> SwapInfoModule for &T {
    type Context = T::Context;

    #[inline]
    fn swap_info(&self) -> SwapInfo {
        (**self).swap_info()
    }

    #[inline]
    fn page_info(&self, pfn: u64, ctx: &Self::Context) -> PageInfo {
        (**self).page_info(pfn, ctx)
    }

    #[inline]
    fn vm_info(&self, pfn: u64, ctx: &Self::Context) -> VmInfo {
        (**self).vm_info(pfn, ctx)
    }
}

impl<T: SwapInfoModule + ?Sized> SwapInfoModule for Arc<T> {
    type Context = T::Context;

    #[inline]
    fn swap_info(&self) -> SwapInfo {
        (**self).swap_info()
    }

    #[inline]
    fn page_info(&self, pfn: u64, ctx: &Self::Context) -> PageInfo {
        (**self).page_info(pfn, ctx)
    }

    #[inline]
    fn vm_info(&self, pfn: u64, ctx: &Self::Context) -> VmInfo {
        (**self).vm_info(pfn, ctx)
    }
}
