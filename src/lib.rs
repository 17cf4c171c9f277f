// Module naming follows project convention (Core = shared plumbing, Props = the registry)
#[allow(non_snake_case)]
pub mod Core {
    pub mod atom;
    pub mod error;
    pub mod forge;
    pub mod urid;
    pub use atom::{parse_atom, Atom, AtomHeader, AtomUrids}; // re-export for stable path
    pub use error::PropsError;
    pub use forge::AtomForge;
    pub use urid::{HashUridMap, Urid, UridMap};
}
#[allow(non_snake_case)]
pub mod Props {
    pub mod Slot {
        pub mod Slot;
        pub mod Slot_impl;
        pub mod layout;
        pub use layout::{FieldView, SyncState};
        pub use Slot::PropSlot; // re-export for stable path
    }
    pub mod Structs {
        pub mod Props_Structs;
        pub use Props_Structs::{Access, ValueDescriptor, ValueKind, ValueType}; // re-export for stable path
    }
    pub mod builder;
    pub mod codec;
    pub mod patch;
    pub mod realtime;
    pub mod registry;

    pub use builder::{RegistryBuilder, MAX_NPROPS};
    pub use patch::PatchResponse;
    pub use realtime::PropsRt;
    pub use registry::{PropState, Props};
    pub use Slot::{FieldView, PropSlot, SyncState};
    pub use Structs::{Access, ValueDescriptor, ValueKind, ValueType};
}
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
