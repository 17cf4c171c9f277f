// The real-time owner of the live state.

use crate::Core::error::Result;
use crate::Core::urid::Urid;
use crate::Props::registry::{PropState, RegistryCore};
use crate::Props::Slot::PropSlot;

use std::sync::Arc;

/// Handle held by the real-time context.
///
/// Owns the live state buffer. Every method is bounded and lock-free, and
/// none of them allocates or logs, so all of them are safe to call from an
/// audio callback. There is exactly one `PropsRt` per registry.
pub struct PropsRt<S: PropState> {
    pub(crate) core: Arc<RegistryCore<S>>,
    live: Box<S>,
}

impl<S: PropState> PropsRt<S> {
    pub(crate) fn new(core: Arc<RegistryCore<S>>, live: Box<S>) -> Self {
        Self { core, live }
    }

    #[inline]
    fn live_ptr(&self) -> *const u8 {
        &*self.live as *const S as *const u8
    }

    #[inline]
    fn live_mut_ptr(&mut self) -> *mut u8 {
        &mut *self.live as *mut S as *mut u8
    }

    /// The live state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.live
    }

    /// The live state, for direct mutation. Follow up with
    /// [`PropsRt::mark_changed_for_export`] for every property touched.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.live
    }

    #[inline]
    pub fn resolve(&self, property: Urid) -> Option<&PropSlot> {
        self.core.slot(property)
    }

    /// Publish the current live value of `property` for export.
    ///
    /// `HandoffBusy` means an import is pending or a handoff is in flight;
    /// the import wins and the caller should mark again on a later cycle,
    /// after [`PropsRt::drain_for_import`] has run.
    pub fn mark_changed_for_export(&self, property: Urid) -> Result<()> {
        let slot = self.core.slot_or_err(property)?;
        // Safety: both pointers are the buffers the slot was registered
        // against, and `self` is the unique real-time owner.
        unsafe { slot.mark_changed_for_export(self.live_ptr(), self.core.stash_ptr()) }
    }

    /// Adopt a staged import of `property` into the live state.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub fn drain_for_import(&mut self, property: Urid) -> Result<bool> {
        let slot = self.core.slot_or_err(property)?;
        let stash = self.core.stash_ptr();
        let live = &mut *self.live as *mut S as *mut u8;
        // Safety: as above, and `&mut self` excludes any other live access.
        Ok(unsafe { slot.drain_for_import(live, stash) })
    }

    /// Adopt every staged import; returns how many were applied.
    ///
    /// Walks the fixed slot table once.
    pub fn drain_all_for_import(&mut self) -> usize {
        let live = self.live_mut_ptr();
        let stash = self.core.stash_ptr();
        let mut applied = 0;
        for slot in self.core.slots.iter() {
            // Safety: see `drain_for_import`.
            if unsafe { slot.drain_for_import(live, stash) } {
                applied += 1;
            }
        }
        applied
    }

    /// Token of the subject this registry answers for.
    #[inline]
    pub fn subject(&self) -> Urid {
        self.core.subject
    }
}
