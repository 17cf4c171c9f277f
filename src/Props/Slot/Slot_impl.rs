use std::ptr;
use std::slice;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use super::layout::SyncState;
use super::Slot::PropSlot;
use crate::Core::error::{PropsError, Result};
use crate::Props::codec::{self, Decoded};

// Every path below follows the same shape: compare-and-swap some unlocked
// state into `Locked` (acquire), move bytes, store the next state (release).
// Nobody spins; losing the swap means `HandoffBusy` or "nothing to do".

impl PropSlot {
    #[inline]
    fn load_state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Relaxed))
    }

    #[inline]
    fn try_lock(&self, from: SyncState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), SyncState::Locked.as_u8(), Acquire, Relaxed)
            .is_ok()
    }

    #[inline]
    fn publish(&self, to: SyncState) {
        self.state.store(to.as_u8(), Release);
    }

    /// Lock from whatever unlocked state the slot is in; returns that state.
    #[inline]
    fn try_lock_any(&self) -> Result<SyncState> {
        let current = self.load_state();
        if current == SyncState::Locked || !self.try_lock(current) {
            return Err(PropsError::HandoffBusy);
        }
        Ok(current)
    }

    /// # Safety
    /// `base` points to a state buffer covering this slot's field, and the
    /// caller holds the slot lock (or otherwise owns that buffer exclusively).
    #[inline]
    unsafe fn field<'a>(&self, base: *const u8) -> &'a [u8] {
        slice::from_raw_parts(base.add(self.view.offset), self.view.len)
    }

    /// # Safety
    /// Same as [`PropSlot::field`], for writing.
    #[inline]
    unsafe fn field_mut<'a>(&self, base: *mut u8) -> &'a mut [u8] {
        slice::from_raw_parts_mut(base.add(self.view.offset), self.view.len)
    }

    /// Real-time side: the live field was just written, hand it over.
    ///
    /// Copies the live field into the stash and publishes `PendingExport`.
    /// Repeated marks coalesce into one pending export carrying the newest
    /// value. A pending import takes priority: the mark is refused with
    /// `HandoffBusy` and the caller marks again after adopting the import.
    ///
    /// # Safety
    /// `live` and `stash` point to the two state buffers this slot was
    /// registered against, and the caller is the unique real-time owner.
    pub(crate) unsafe fn mark_changed_for_export(
        &self,
        live: *const u8,
        stash: *mut u8,
    ) -> Result<()> {
        let current = self.load_state();
        match current {
            SyncState::None | SyncState::PendingExport => {}
            SyncState::PendingImport | SyncState::Locked => return Err(PropsError::HandoffBusy),
        }
        if !self.try_lock(current) {
            return Err(PropsError::HandoffBusy);
        }

        ptr::copy_nonoverlapping(
            live.add(self.view.offset),
            stash.add(self.view.offset),
            self.view.len,
        );

        self.publish(SyncState::PendingExport);
        Ok(())
    }

    /// Non-real-time side: encode a pending export into `out`.
    ///
    /// Returns `Ok(false)` when nothing is pending. A value that cannot be
    /// encoded leaves the export pending.
    ///
    /// # Safety
    /// `stash` points to the stash buffer this slot was registered against.
    pub(crate) unsafe fn drain_for_export(&self, stash: *const u8, out: &mut Vec<u8>) -> Result<bool> {
        match self.load_state() {
            SyncState::PendingExport => {}
            SyncState::Locked => return Err(PropsError::HandoffBusy),
            SyncState::None | SyncState::PendingImport => return Ok(false),
        }
        if !self.try_lock(SyncState::PendingExport) {
            return Err(PropsError::HandoffBusy);
        }

        let start = out.len();
        match codec::encode(self, self.field(stash), out) {
            Ok(()) => {
                self.publish(SyncState::None);
                Ok(true)
            }
            Err(e) => {
                out.truncate(start);
                self.publish(SyncState::PendingExport);
                Err(e)
            }
        }
    }

    /// Non-real-time side: stage an already validated value for the live side.
    ///
    /// Supersedes a pending export (import wins) and replaces an import the
    /// live side has not adopted yet.
    ///
    /// # Safety
    /// `stash` points to the stash buffer this slot was registered against.
    pub(crate) unsafe fn accept_for_import(&self, value: &Decoded<'_>, stash: *mut u8) -> Result<()> {
        self.try_lock_any()?;
        codec::store(value, self.field_mut(stash));
        self.publish(SyncState::PendingImport);
        Ok(())
    }

    /// Real-time side: adopt a staged import into the live field.
    ///
    /// Returns whether a value was applied.
    ///
    /// # Safety
    /// Same contract as [`PropSlot::mark_changed_for_export`].
    pub(crate) unsafe fn drain_for_import(&self, live: *mut u8, stash: *const u8) -> bool {
        if !self.try_lock(SyncState::PendingImport) {
            return false;
        }

        ptr::copy_nonoverlapping(
            stash.add(self.view.offset),
            live.add(self.view.offset),
            self.view.len,
        );

        self.publish(SyncState::None);
        true
    }

    /// Non-real-time side: encode whatever the stash currently holds.
    ///
    /// Consumes a pending export, keeps a pending import pending.
    ///
    /// # Safety
    /// `stash` points to the stash buffer this slot was registered against.
    pub(crate) unsafe fn read_stash(&self, stash: *const u8, out: &mut Vec<u8>) -> Result<()> {
        let previous = self.try_lock_any()?;

        let start = out.len();
        let result = codec::encode(self, self.field(stash), out);
        match (&result, previous) {
            (Ok(()), SyncState::PendingExport) => self.publish(SyncState::None),
            (Err(_), _) => {
                out.truncate(start);
                self.publish(previous);
            }
            (Ok(()), _) => self.publish(previous),
        }
        result
    }
}
