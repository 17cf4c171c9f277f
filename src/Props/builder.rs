use super::realtime::PropsRt;
use super::registry::{PropState, Props, RegistryCore};
use super::Slot::PropSlot;
use super::Structs::Props_Structs::{ValueDescriptor, ValueKind};
use crate::Core::atom::{AtomUrids, ATOM_HEADER_SIZE};
use crate::Core::error::{PropsError, Result};
use crate::Core::urid::{Urid, UridMap};

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::mem::size_of;
use std::ptr;
use std::sync::Arc;
use tracing::debug;

/// Default upper bound on registered properties.
pub const MAX_NPROPS: usize = 256;

/// Configuration for one registry instance.
pub struct RegistryBuilder {
    subject: String,
    capacity: usize,
    descriptors: Vec<ValueDescriptor>,
}

impl RegistryBuilder {
    /// Start a registry answering for `subject` (usually the plugin URI).
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            capacity: MAX_NPROPS,
            descriptors: Vec::new(),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_descriptors(mut self, descriptors: &[ValueDescriptor]) -> Self {
        self.descriptors.extend_from_slice(descriptors);
        self
    }

    pub fn with_descriptor(mut self, descriptor: ValueDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Intern every identifier, validate every field against `S` and hand
    /// out the registry handle plus the unique real-time handle.
    ///
    /// `live` becomes the real-time owner's state, `stash` the staging copy.
    /// They share `S`'s layout, so one offset addresses both. Registered
    /// fields of `stash` are overwritten with their `live` values; bytes no
    /// descriptor covers keep whatever `stash` held.
    pub fn build<S: PropState>(
        self,
        live: S,
        mut stash: S,
        map: Arc<dyn UridMap>,
    ) -> Result<(Props<S>, PropsRt<S>)> {
        let count = self.descriptors.len();
        if count > self.capacity {
            return Err(PropsError::CapacityExceeded {
                count,
                capacity: self.capacity,
            });
        }

        let map_uri = |uri: &str| -> Result<Urid> {
            map.map(uri).ok_or_else(|| PropsError::MapFailed {
                uri: uri.to_owned(),
            })
        };

        let urids = AtomUrids::map(&*map)?;
        let subject = map_uri(&self.subject)?;
        let state_size = size_of::<S>();

        let mut slots: Vec<PropSlot> = Vec::with_capacity(count);
        let mut index = HashMap::with_capacity(count);

        for def in &self.descriptors {
            validate(def, state_size)?;

            let slot = PropSlot::new(
                *def,
                map_uri(def.property)?,
                map_uri(def.value_type.uri())?,
                map_uri(def.access.uri())?,
            );

            if let Some(other) = slots.iter().find(|s| s.view.overlaps(&slot.view)) {
                return Err(PropsError::Overlap {
                    first: other.descriptor.property,
                    second: def.property,
                });
            }
            if index.insert(slot.property, slots.len()).is_some() {
                return Err(PropsError::DuplicateProperty {
                    property: def.property,
                });
            }

            debug!(
                property = def.property,
                urid = %slot.property,
                value_type = ?def.value_type,
                offset = slot.view.offset,
                len = slot.view.len,
                "registered property"
            );
            slots.push(slot);
        }

        // every slot starts idle, so the stash has to agree with live
        seed_stash(&slots, &live, &mut stash);

        let core = Arc::new(RegistryCore {
            subject,
            slots: slots.into_boxed_slice(),
            index,
            stash: UnsafeCell::new(stash),
            urids,
            map,
            capacity: self.capacity,
        });

        debug!(
            subject = %self.subject,
            properties = count,
            state_size,
            "property registry ready"
        );

        Ok((
            Props::new(Arc::clone(&core)),
            PropsRt::new(core, Box::new(live)),
        ))
    }
}

/// Copy every registered field from `live` into `stash`.
fn seed_stash<S: PropState>(slots: &[PropSlot], live: &S, stash: &mut S) {
    let src = live as *const S as *const u8;
    let dst = stash as *mut S as *mut u8;
    for slot in slots {
        // Safety: each view was checked against size_of::<S>() in `validate`,
        // and `PropState` guarantees the described bytes are initialized.
        unsafe {
            ptr::copy_nonoverlapping(
                src.add(slot.view.offset),
                dst.add(slot.view.offset),
                slot.view.len,
            );
        }
    }
}

fn validate(def: &ValueDescriptor, state_size: usize) -> Result<()> {
    let invalid = |reason| PropsError::InvalidDescriptor {
        property: def.property,
        reason,
    };
    match def.value_type.kind() {
        ValueKind::Scalar => {
            if def.max_size != 0 && def.max_size != def.value_type.intrinsic_size() {
                return Err(invalid("scalar max_size must be 0 or its intrinsic size"));
            }
        }
        ValueKind::Text => {
            if def.max_size == 0 {
                return Err(invalid("text needs room for its terminator"));
            }
        }
        ValueKind::Container => {
            if def.max_size < ATOM_HEADER_SIZE {
                return Err(invalid("container needs room for its atom header"));
            }
        }
    }

    let size = def.field_size();
    match def.offset.checked_add(size) {
        Some(end) if end <= state_size => Ok(()),
        _ => Err(PropsError::OutOfBounds {
            property: def.property,
            offset: def.offset,
            size,
            state_size,
        }),
    }
}
