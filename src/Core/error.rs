// Error kinds shared by the registry, the slot state machine and the codec.

use thiserror::Error;

/// Errors produced while building or driving a property registry.
///
/// Variants that can come back from a real-time call (`UnknownProperty`,
/// `HandoffBusy`) only carry `Copy` data, so returning them never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropsError {
    /// More descriptors than the registry was configured to hold.
    #[error("descriptor count {count} exceeds registry capacity {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },

    /// The identifier interner refused to hand out a token.
    #[error("failed to map identifier {uri:?}")]
    MapFailed { uri: String },

    /// A descriptor's field does not fit inside the state structure.
    #[error("field of {property:?} at offset {offset} with size {size} exceeds state size {state_size}")]
    OutOfBounds {
        property: &'static str,
        offset: usize,
        size: usize,
        state_size: usize,
    },

    /// Two descriptors share bytes of the state structure.
    #[error("fields of {first:?} and {second:?} overlap")]
    Overlap {
        first: &'static str,
        second: &'static str,
    },

    /// The same property identifier was registered twice.
    #[error("property {property:?} registered twice")]
    DuplicateProperty { property: &'static str },

    /// The descriptor's size settings cannot hold a value of its type.
    #[error("invalid descriptor for {property:?}: {reason}")]
    InvalidDescriptor {
        property: &'static str,
        reason: &'static str,
    },

    /// Token or identifier not registered.
    #[error("unknown property {0}")]
    UnknownProperty(u32),

    /// Incoming atom carries another type than the property declares.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: u32, found: u32 },

    /// Payload larger than the field can hold.
    #[error("payload of {size} bytes exceeds limit of {max} bytes")]
    SizeExceeded { size: usize, max: usize },

    /// Write attempted on a property that is not writable (or read on one
    /// that is not readable).
    #[error("access denied for property {0}")]
    AccessDenied(u32),

    /// Another handoff holds the slot; retry on a later cycle.
    #[error("handoff in progress, retry later")]
    HandoffBusy,

    /// Truncated or otherwise unreadable atom.
    #[error("malformed atom: {0}")]
    Malformed(&'static str),
}

impl PropsError {
    /// Whether the caller should simply try again on a later cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PropsError::HandoffBusy)
    }
}

pub type Result<T> = std::result::Result<T, PropsError>;
