// Per-slot synchronization word and field addressing.

/// The single synchronization point of a property slot.
///
/// Stored in an `AtomicU8`. Any side that wants to move payload bytes first
/// swaps the slot into `Locked` (acquire), moves the bytes, then publishes
/// the next state with a release store. A side that finds the slot `Locked`
/// gives up immediately and retries on a later cycle.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Idle; live and stash agree, or nothing needs to move.
    None = 0,
    /// Live side changed; the stash holds the new value, not yet exported.
    PendingExport = 1,
    /// Import side staged a new value in the stash, not yet adopted by live.
    PendingImport = 2,
    /// A handoff is moving bytes right now.
    Locked = 3,
}

impl SyncState {
    #[inline]
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SyncState::PendingExport,
            2 => SyncState::PendingImport,
            3 => SyncState::Locked,
            _ => SyncState::None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_pending(self) -> bool {
        matches!(self, SyncState::PendingExport | SyncState::PendingImport)
    }
}

/// Bounds-checked location of a field inside a state buffer.
///
/// Computed once at registration and validated against the state size. The
/// live and stash buffers share one layout, so one view addresses both.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldView {
    pub offset: usize,
    pub len: usize,
}

impl FieldView {
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    #[inline]
    pub const fn overlaps(&self, other: &FieldView) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}
