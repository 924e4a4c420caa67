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

use std::sync::{Arc, PoisonError, RwLock};

use crate::modules::policy_host::{PolicyHostModule, SwapPolicy};

/// Host side slot holding the active placement policy.
///
/// At most one policy can be registered. Pages are dispatched to it
/// from any number of threads.
pub struct PolicyAccessPoint<C: 'static> {
    inner: RwLock<Option<Arc<dyn SwapPolicy<C>>>>,
}

impl<C: 'static> PolicyAccessPoint<C> {
    pub const fn empty() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Returns `true` if a policy is registered
    pub fn is_active(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Asks the active policy for the zone slot of `pfn`.
    ///
    /// Returns `None` if no policy is registered, the host has to fall back
    /// to its own placement in that case.
    pub fn place(&self, pfn: u64, ctx: &C) -> Option<usize> {
        // don't hold the lock while the policy runs, it might reclaim zones
        let policy = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;

        Some(policy.place(pfn, ctx))
    }
}

impl<C: 'static> PolicyHostModule<C> for PolicyAccessPoint<C> {
    fn register_policy(&self, policy: Arc<dyn SwapPolicy<C>>) -> Result<(), ()> {
        let mut guard = self.inner.write().map_err(|_| ())?;

        if guard.is_some() {
            // already in use
            return Err(());
        }

        *guard = Some(policy);
        Ok(())
    }

    fn unregister_policy(&self) -> Result<(), ()> {
        let mut guard = self.inner.write().map_err(|_| ())?;
        guard.take().map(|_| ()).ok_or(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::PolicyAccessPoint;
    use crate::modules::policy_host::{PolicyHostModule, SwapPolicy};

    struct FixedSlotPolicy {
        slot: usize,
        calls: AtomicUsize,
    }

    impl SwapPolicy<()> for FixedSlotPolicy {
        fn place(&self, _pfn: u64, _ctx: &()) -> usize {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.slot
        }
    }

    #[test]
    fn test_access_point_dispatch() {
        let access_point: PolicyAccessPoint<()> = PolicyAccessPoint::empty();
        assert!(!access_point.is_active());
        assert_eq!(access_point.place(1, &()), None);

        let policy = Arc::new(FixedSlotPolicy {
            slot: 3,
            calls: AtomicUsize::new(0),
        });
        access_point.register_policy(policy.clone()).unwrap();
        assert!(access_point.is_active());

        assert_eq!(access_point.place(1, &()), Some(3));
        assert_eq!(access_point.place(2, &()), Some(3));
        assert_eq!(policy.calls.load(Ordering::SeqCst), 2);

        access_point.unregister_policy().unwrap();
        assert!(!access_point.is_active());
        assert_eq!(access_point.place(3, &()), None);

        // host handle is gone again
        assert_eq!(Arc::strong_count(&policy), 1);
    }

    #[test]
    fn test_access_point_single_policy() {
        let access_point: PolicyAccessPoint<()> = PolicyAccessPoint::empty();
        let first = Arc::new(FixedSlotPolicy {
            slot: 0,
            calls: AtomicUsize::new(0),
        });
        let second = Arc::new(FixedSlotPolicy {
            slot: 1,
            calls: AtomicUsize::new(0),
        });

        access_point.register_policy(first).unwrap();
        assert_eq!(access_point.register_policy(second), Err(()));
        assert_eq!(access_point.place(0, &()), Some(0));

        access_point.unregister_policy().unwrap();
        assert_eq!(access_point.unregister_policy(), Err(()));
    }
}
