// Shared fixtures for the integration tests.
#![allow(dead_code)]

use lv2_props::Core::{AtomForge, HashUridMap, Urid, UridMap};
use lv2_props::Props::{
    Access, PropState, Props, PropsRt, RegistryBuilder, ValueDescriptor, ValueType,
};
use memoffset::offset_of;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    // RUST_LOG=lv2_props=trace to see the handoffs
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub const PROPS_PREFIX: &str = "http://open-music-kontrollers.ch/lv2/props#";

pub fn uri(name: &str) -> String {
    format!("{PROPS_PREFIX}{name}")
}

pub fn subject_uri() -> String {
    uri("subj")
}

/// Smallest possible plugin state: one 32-bit integer at offset 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DummyState {
    pub dummy: u32,
}

unsafe impl PropState for DummyState {}

pub fn dummy_defs() -> [ValueDescriptor; 1] {
    [ValueDescriptor::new(
        "http://open-music-kontrollers.ch/lv2/props#dummy",
        ValueType::Int,
        offset_of!(DummyState, dummy),
    )]
}

pub struct Dummy {
    pub props: Props<DummyState>,
    pub rt: PropsRt<DummyState>,
    pub map: Arc<HashUridMap>,
    pub dummy: Urid,
}

pub fn dummy() -> Dummy {
    let map = Arc::new(HashUridMap::new());
    let (props, rt) = RegistryBuilder::new(subject_uri())
        .with_descriptors(&dummy_defs())
        .build(DummyState::default(), DummyState::default(), map.clone())
        .expect("registry should build");
    let dummy = map.lookup(&uri("dummy")).expect("dummy is mapped");
    Dummy {
        props,
        rt,
        map,
        dummy,
    }
}

/// A state structure exercising every value kind.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlugState {
    pub int: i32,
    pub toggle: i32,
    pub long: i64,
    pub float: f32,
    pub urid: u32,
    pub double: f64,
    pub string: [u8; 32],
    pub path: [u8; 16],
    pub chunk: [u8; 24],
    pub vector: [u8; 32],
    pub sequence: [u8; 64],
    pub readonly: i32,
    pub writeonly: i32,
}

unsafe impl PropState for PlugState {}

impl Default for PlugState {
    fn default() -> Self {
        Self {
            int: 0,
            toggle: 0,
            long: 0,
            float: 0.0,
            urid: 0,
            double: 0.0,
            string: [0; 32],
            path: [0; 16],
            chunk: [0; 24],
            vector: [0; 32],
            sequence: [0; 64],
            readonly: 0,
            writeonly: 0,
        }
    }
}

pub fn plug_defs() -> Vec<ValueDescriptor> {
    vec![
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#int",
            ValueType::Int,
            offset_of!(PlugState, int),
        ),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#toggle",
            ValueType::Bool,
            offset_of!(PlugState, toggle),
        ),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#long",
            ValueType::Long,
            offset_of!(PlugState, long),
        ),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#float",
            ValueType::Float,
            offset_of!(PlugState, float),
        ),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#urid",
            ValueType::Urid,
            offset_of!(PlugState, urid),
        ),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#double",
            ValueType::Double,
            offset_of!(PlugState, double),
        ),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#string",
            ValueType::String,
            offset_of!(PlugState, string),
        )
        .max_size(32),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#path",
            ValueType::Path,
            offset_of!(PlugState, path),
        )
        .max_size(16),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#chunk",
            ValueType::Chunk,
            offset_of!(PlugState, chunk),
        )
        .max_size(24),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#vector",
            ValueType::Vector,
            offset_of!(PlugState, vector),
        )
        .max_size(32),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#sequence",
            ValueType::Sequence,
            offset_of!(PlugState, sequence),
        )
        .max_size(64),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#readonly",
            ValueType::Int,
            offset_of!(PlugState, readonly),
        )
        .access(Access::Read),
        ValueDescriptor::new(
            "http://open-music-kontrollers.ch/lv2/props#writeonly",
            ValueType::Int,
            offset_of!(PlugState, writeonly),
        )
        .access(Access::Write),
    ]
}

pub struct Plug {
    pub props: Props<PlugState>,
    pub rt: PropsRt<PlugState>,
    pub map: Arc<HashUridMap>,
}

impl Plug {
    /// Token of a property by its short name.
    pub fn urid(&self, name: &str) -> Urid {
        self.map
            .lookup(&uri(name))
            .unwrap_or_else(|| panic!("{name} is not mapped"))
    }
}

pub fn plug() -> Plug {
    let map = Arc::new(HashUridMap::new());
    let (props, rt) = RegistryBuilder::new(subject_uri())
        .with_descriptors(&plug_defs())
        .build(PlugState::default(), PlugState::default(), map.clone())
        .expect("registry should build");
    Plug { props, rt, map }
}

/// Run `f` against a fresh forge and return the bytes it wrote.
pub fn forged<S: PropState>(props: &Props<S>, f: impl FnOnce(&mut AtomForge)) -> Vec<u8> {
    let mut forge = props.forge();
    f(&mut forge);
    forge.finish()
}

/// Copy `text` into a NUL-padded fixed array.
pub fn text<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [0u8; N];
    out[..text.len()].copy_from_slice(text.as_bytes());
    out
}
