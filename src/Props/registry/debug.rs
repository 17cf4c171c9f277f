use super::*;
use crate::Props::realtime::PropsRt;
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl<S: PropState> fmt::Debug for Props<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_props(self, f)
    }
}

impl<S: PropState> fmt::Debug for PropsRt<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_props_rt(self, f)
    }
}

impl fmt::Debug for PropSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_prop_slot(self, f)
    }
}
