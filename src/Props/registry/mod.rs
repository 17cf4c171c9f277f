use crate::Core::atom::AtomUrids;
use crate::Core::error::{PropsError, Result};
use crate::Core::forge::AtomForge;
use crate::Core::urid::{Urid, UridMap};
use crate::Props::codec;
use crate::Props::Slot::PropSlot;
use crate::Props::Structs::Props_Structs::ValueType;

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

mod debug;
mod getters;

/// Marker for plugin state structures the registry may address by offset.
///
/// # Safety
/// The type must be `#[repr(C)]` plain data. Every byte range named by a
/// registered descriptor must be initialized memory (no padding) for which
/// any bit pattern is a valid value, because imports write raw bytes there.
pub unsafe trait PropState: Copy + Send + 'static {}

/// State shared by the real-time handle and every registry handle.
pub(crate) struct RegistryCore<S> {
    pub(crate) subject: Urid,
    pub(crate) slots: Box<[PropSlot]>,
    /// Token -> position in `slots`. Built once, never grows.
    pub(crate) index: HashMap<Urid, usize>,
    /// The stash buffer. Each field is only touched by whoever holds the
    /// owning slot in `Locked`.
    pub(crate) stash: UnsafeCell<S>,
    pub(crate) urids: AtomUrids,
    pub(crate) map: Arc<dyn UridMap>,
    pub(crate) capacity: usize,
}

// Access to `stash` is partitioned per slot and serialized by the slot state.
unsafe impl<S: PropState> Sync for RegistryCore<S> {}

impl<S> RegistryCore<S> {
    #[inline]
    pub(crate) fn stash_ptr(&self) -> *mut u8 {
        self.stash.get() as *mut u8
    }

    #[inline]
    pub(crate) fn slot(&self, property: Urid) -> Option<&PropSlot> {
        self.index.get(&property).map(|&i| &self.slots[i])
    }

    #[inline]
    pub(crate) fn slot_or_err(&self, property: Urid) -> Result<&PropSlot> {
        self.slot(property)
            .ok_or(PropsError::UnknownProperty(property.get()))
    }
}

/// Registry handle for non-real-time agents (worker, UI, session I/O).
///
/// Cloning is cheap; clones share one registry. Concurrent agents are kept
/// apart per slot by the slot state, the loser of a race gets `HandoffBusy`.
pub struct Props<S: PropState> {
    pub(crate) core: Arc<RegistryCore<S>>,
}

impl<S: PropState> Clone for Props<S> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<S: PropState> Props<S> {
    pub(crate) fn new(core: Arc<RegistryCore<S>>) -> Self {
        Self { core }
    }

    /// Slot registered under `property`.
    #[inline]
    pub fn resolve(&self, property: Urid) -> Option<&PropSlot> {
        self.core.slot(property)
    }

    /// Slot registered under the identifier `uri`. Never creates a token.
    pub fn resolve_by_identifier(&self, uri: &str) -> Option<&PropSlot> {
        self.core.map.lookup(uri).and_then(|urid| self.resolve(urid))
    }

    /// Value type named by an atom type token, if it is one the registry knows.
    pub fn value_type_of(&self, type_urid: u32) -> Option<ValueType> {
        let uri = Urid::new(type_urid).and_then(|urid| self.core.map.unmap(urid))?;
        ValueType::from_uri(&uri)
    }

    /// Slots in descriptor declaration order.
    pub fn slots(&self) -> impl Iterator<Item = &PropSlot> + '_ {
        self.core.slots.iter()
    }

    pub fn for_each_slot(&self, mut visitor: impl FnMut(&PropSlot)) {
        for slot in self.core.slots.iter() {
            visitor(slot);
        }
    }

    /// Encode the property's pending export, if any.
    pub fn drain_for_export(&self, property: Urid) -> Result<Option<Vec<u8>>> {
        let slot = self.core.slot_or_err(property)?;
        let mut out = Vec::new();
        // Safety: the stash pointer is the one the slot was registered with.
        let drained = unsafe { slot.drain_for_export(self.core.stash_ptr(), &mut out)? };
        if drained {
            trace!(property = %property, bytes = out.len(), "drained export");
            Ok(Some(out))
        } else {
            Ok(None)
        }
    }

    /// Every pending export, in declaration order.
    ///
    /// Busy slots are skipped; they stay pending for the next call.
    pub fn drain_all_for_export(&self) -> Vec<(Urid, Vec<u8>)> {
        let mut drained = Vec::new();
        for slot in self.core.slots.iter() {
            match self.drain_for_export(slot.property) {
                Ok(Some(atom)) => drained.push((slot.property, atom)),
                Ok(None) | Err(PropsError::HandoffBusy) => {}
                Err(e) => warn!(property = %slot.property, error = %e, "export skipped"),
            }
        }
        drained
    }

    /// Validate `atom` and stage it for the real-time side.
    ///
    /// On any error the slot state and both buffers are left untouched.
    pub fn accept_for_import(&self, property: Urid, atom: &[u8]) -> Result<()> {
        let slot = self.core.slot_or_err(property)?;
        if !slot.access().is_writable() {
            return Err(PropsError::AccessDenied(property.get()));
        }
        let value = codec::decode(slot, atom)?;
        // Safety: the stash pointer is the one the slot was registered with.
        unsafe { slot.accept_for_import(&value, self.core.stash_ptr())? };
        trace!(property = %property, bytes = value.stored_len(), "staged import");
        Ok(())
    }

    /// Current value of a readable property, whether or not it changed.
    ///
    /// Consumes a pending export of that property.
    pub fn get(&self, property: Urid) -> Result<Vec<u8>> {
        let slot = self.core.slot_or_err(property)?;
        if !slot.access().is_readable() {
            return Err(PropsError::AccessDenied(property.get()));
        }
        let mut out = Vec::new();
        // Safety: the stash pointer is the one the slot was registered with.
        unsafe { slot.read_stash(self.core.stash_ptr(), &mut out)? };
        Ok(out)
    }

    /// Current value of every readable property, in declaration order.
    ///
    /// Busy slots are left out.
    pub fn get_all(&self) -> Vec<(Urid, Vec<u8>)> {
        let mut values = Vec::with_capacity(self.core.slots.len());
        for slot in self.core.slots.iter().filter(|s| s.access().is_readable()) {
            match self.get(slot.property) {
                Ok(atom) => values.push((slot.property, atom)),
                Err(PropsError::HandoffBusy) => {
                    trace!(property = %slot.property, "busy, left out of bulk get")
                }
                Err(e) => warn!(property = %slot.property, error = %e, "get skipped"),
            }
        }
        values
    }

    /// A forge primed with this registry's vocabulary.
    pub fn forge(&self) -> AtomForge {
        AtomForge::new(&self.core.urids)
    }
}
