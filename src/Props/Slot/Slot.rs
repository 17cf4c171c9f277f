// A property slot: the registry's mutable per-property record.

use super::layout::{FieldView, SyncState};
use crate::Core::urid::Urid;
use crate::Props::Structs::Props_Structs::{Access, ValueDescriptor, ValueType};

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU8, Ordering};

/// One registered property.
///
/// Identity is the property token. The slot never owns value bytes; its view
/// addresses the same field in the live buffer (owned by the real-time
/// handle) and in the stash buffer (owned by the registry core).
pub struct PropSlot {
    /// Token of the property identifier.
    pub(crate) property: Urid,

    /// Token of the value type, checked against every incoming atom.
    pub(crate) type_urid: Urid,

    /// Token of `patch:readable` / `patch:writable`.
    pub(crate) access_urid: Urid,

    /// Copy of the descriptor this slot was built from.
    pub(crate) descriptor: ValueDescriptor,

    /// Field location, identical in live and stash.
    pub(crate) view: FieldView,

    /// `SyncState` as a raw byte. Padded so neighbouring slots touched by
    /// different threads do not share a cache line.
    pub(crate) state: CachePadded<AtomicU8>,
}

impl PropSlot {
    pub(crate) fn new(
        descriptor: ValueDescriptor,
        property: Urid,
        type_urid: Urid,
        access_urid: Urid,
    ) -> Self {
        Self {
            property,
            type_urid,
            access_urid,
            view: FieldView {
                offset: descriptor.offset,
                len: descriptor.field_size(),
            },
            descriptor,
            state: CachePadded::new(AtomicU8::new(SyncState::None.as_u8())),
        }
    }

    #[inline]
    pub fn property(&self) -> Urid {
        self.property
    }

    #[inline]
    pub fn type_urid(&self) -> Urid {
        self.type_urid
    }

    #[inline]
    pub fn access_urid(&self) -> Urid {
        self.access_urid
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.descriptor.value_type
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.descriptor.access
    }

    #[inline]
    pub fn descriptor(&self) -> &ValueDescriptor {
        &self.descriptor
    }

    /// Where the field lives in the live buffer.
    #[inline]
    pub fn live_view(&self) -> FieldView {
        self.view
    }

    /// Where the field lives in the stash buffer.
    #[inline]
    pub fn stash_view(&self) -> FieldView {
        self.view
    }

    /// Snapshot of the synchronization state. Informational only; it may be
    /// stale by the time the caller looks at it.
    #[inline]
    pub fn sync_state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }
}
