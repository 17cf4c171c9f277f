use std::fmt;
use crate::Props::realtime::PropsRt;
use crate::Props::registry::{PropState, Props};
use crate::Props::Slot::PropSlot;

/// Debug function for Props
///
/// Shows the subject, the slot count and how many slots have a handoff
/// pending. Never touches a buffer.
pub fn debug_props<S: PropState>(props: &Props<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Props")
        .field("subject", &props.subject())
        .field("properties", &props.len())
        .field("capacity", &props.capacity())
        .field("pending", &props.pending_count())
        .finish()
}

/// Debug function for PropsRt
///
/// The live state is opaque here; only its address is shown.
pub fn debug_props_rt<S: PropState>(rt: &PropsRt<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PropsRt")
        .field("subject", &rt.subject())
        .field("live", &format_args!("{:p}", rt.state() as *const S))
        .finish_non_exhaustive()
}

/// Debug function for PropSlot
pub fn debug_prop_slot(slot: &PropSlot, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PropSlot")
        .field("property", &slot.descriptor().property)
        .field("urid", &slot.property())
        .field("value_type", &slot.value_type())
        .field("access", &slot.access())
        .field("view", &slot.live_view())
        .field("state", &slot.sync_state())
        .finish()
}
