use super::*;

/// Read-only accessors on the registry handle.
///
/// None of these touch a slot state or a buffer.
impl<S: PropState> Props<S> {
    /// Token of the subject this registry answers for.
    pub fn subject(&self) -> Urid {
        self.core.subject
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.core.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.slots.is_empty()
    }

    /// The capacity the registry was built with.
    pub fn capacity(&self) -> usize {
        self.core.capacity
    }

    /// Tokens of the atom and patch vocabulary.
    pub fn urids(&self) -> &AtomUrids {
        &self.core.urids
    }

    /// The injected identifier interner.
    pub fn urid_map(&self) -> &Arc<dyn UridMap> {
        &self.core.map
    }

    /// Number of slots currently holding a pending export or import.
    ///
    /// A snapshot, for monitoring.
    pub fn pending_count(&self) -> usize {
        self.core
            .slots
            .iter()
            .filter(|s| s.sync_state().is_pending())
            .count()
    }
}
