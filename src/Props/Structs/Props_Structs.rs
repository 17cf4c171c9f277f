// Caller-supplied description of each property: identifier, type, field
// offset, access rights and size bound.

use crate::Core::atom::uris;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Shape of a property value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Stored as a 4-byte int, any non-zero value is true.
    Bool,
    Int,
    Long,
    Float,
    Double,
    Urid,
    String,
    Uri,
    Path,
    Chunk,
    Literal,
    Vector,
    Object,
    Sequence,
}

/// How a value type is laid out inside the state structure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Fixed intrinsic size, copied byte for byte.
    Scalar,
    /// NUL-terminated byte array of `max_size` bytes.
    Text,
    /// Complete atom (header + body) of at most `max_size` bytes.
    Container,
}

lazy_static! {
    static ref TYPES_BY_URI: HashMap<&'static str, ValueType> = {
        let mut m = HashMap::new();
        for ty in ValueType::ALL {
            m.insert(ty.uri(), ty);
        }
        m
    };
}

impl ValueType {
    pub const ALL: [ValueType; 14] = [
        ValueType::Bool,
        ValueType::Int,
        ValueType::Long,
        ValueType::Float,
        ValueType::Double,
        ValueType::Urid,
        ValueType::String,
        ValueType::Uri,
        ValueType::Path,
        ValueType::Chunk,
        ValueType::Literal,
        ValueType::Vector,
        ValueType::Object,
        ValueType::Sequence,
    ];

    /// The type's identifier in the atom vocabulary.
    pub const fn uri(self) -> &'static str {
        match self {
            ValueType::Bool => uris::ATOM_BOOL,
            ValueType::Int => uris::ATOM_INT,
            ValueType::Long => uris::ATOM_LONG,
            ValueType::Float => uris::ATOM_FLOAT,
            ValueType::Double => uris::ATOM_DOUBLE,
            ValueType::Urid => uris::ATOM_URID,
            ValueType::String => uris::ATOM_STRING,
            ValueType::Uri => uris::ATOM_URI,
            ValueType::Path => uris::ATOM_PATH,
            ValueType::Chunk => uris::ATOM_CHUNK,
            ValueType::Literal => uris::ATOM_LITERAL,
            ValueType::Vector => uris::ATOM_VECTOR,
            ValueType::Object => uris::ATOM_OBJECT,
            ValueType::Sequence => uris::ATOM_SEQUENCE,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        TYPES_BY_URI.get(uri).copied()
    }

    pub const fn kind(self) -> ValueKind {
        match self {
            ValueType::Bool
            | ValueType::Int
            | ValueType::Long
            | ValueType::Float
            | ValueType::Double
            | ValueType::Urid => ValueKind::Scalar,
            ValueType::String | ValueType::Uri | ValueType::Path => ValueKind::Text,
            ValueType::Chunk
            | ValueType::Literal
            | ValueType::Vector
            | ValueType::Object
            | ValueType::Sequence => ValueKind::Container,
        }
    }

    /// Byte size of a scalar field, 0 for variable-size types.
    pub const fn intrinsic_size(self) -> usize {
        match self {
            ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::Urid => 4,
            ValueType::Long | ValueType::Double => 8,
            _ => 0,
        }
    }
}

/// Who may touch a property from the outside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// Exported to the host, never set by it.
    Read,
    /// Set by the host, never reported back.
    Write,
    #[default]
    ReadWrite,
}

impl Access {
    #[inline]
    pub const fn is_readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }

    /// The patch vocabulary term announcing this access level.
    pub const fn uri(self) -> &'static str {
        if self.is_writable() {
            uris::PATCH_WRITABLE
        } else {
            uris::PATCH_READABLE
        }
    }
}

/// Immutable description of one property.
///
/// ```ignore
/// const DEFS: [ValueDescriptor; 2] = [
///     ValueDescriptor::new("urn:ex#gain", ValueType::Float, offset_of!(State, gain)),
///     ValueDescriptor::new("urn:ex#name", ValueType::String, offset_of!(State, name))
///         .max_size(64)
///         .access(Access::Read),
/// ];
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueDescriptor {
    pub property: &'static str,
    pub value_type: ValueType,
    pub offset: usize,
    pub access: Access,
    /// Field capacity for variable-size types; 0 means the intrinsic size.
    pub max_size: usize,
}

impl ValueDescriptor {
    pub const fn new(property: &'static str, value_type: ValueType, offset: usize) -> Self {
        Self {
            property,
            value_type,
            offset,
            access: Access::ReadWrite,
            max_size: 0,
        }
    }

    pub const fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub const fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Bytes the property occupies in the state structure.
    pub const fn field_size(&self) -> usize {
        match self.value_type.kind() {
            ValueKind::Scalar => self.value_type.intrinsic_size(),
            _ => self.max_size,
        }
    }
}
