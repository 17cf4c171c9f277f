// Write side of the LV2 atom container format.

use super::atom::{pad_size, AtomHeader, AtomUrids, ATOM_HEADER_SIZE};
use super::urid::Urid;

/// Builds atoms into a growable byte buffer.
///
/// Used on the non-real-time side only: it allocates. Atoms written inside a
/// container frame (object, sequence) are padded to 8 bytes; a top-level atom
/// is emitted without trailing padding.
pub struct AtomForge {
    urids: AtomUrids,
    buf: Vec<u8>,
    frames: Vec<usize>,
}

impl AtomForge {
    pub fn new(urids: &AtomUrids) -> Self {
        Self::with_capacity(urids, 64)
    }

    pub fn with_capacity(urids: &AtomUrids, capacity: usize) -> Self {
        Self {
            urids: *urids,
            buf: Vec::with_capacity(capacity),
            frames: Vec::new(),
        }
    }

    #[inline]
    fn in_frame(&self) -> bool {
        !self.frames.is_empty()
    }

    fn pad(&mut self) {
        if self.in_frame() {
            let padded = pad_size(self.buf.len());
            self.buf.resize(padded, 0);
        }
    }

    fn header(&mut self, size: usize, type_urid: u32) {
        let mut raw = [0u8; ATOM_HEADER_SIZE];
        AtomHeader {
            size: size as u32,
            type_urid,
        }
        .write(&mut raw);
        self.buf.extend_from_slice(&raw);
    }

    /// Atom with an arbitrary type and body.
    pub fn atom(&mut self, type_urid: u32, body: &[u8]) -> &mut Self {
        self.header(body.len(), type_urid);
        self.buf.extend_from_slice(body);
        self.pad();
        self
    }

    /// Atom whose body is split into parts, written back to back.
    pub fn atom_parts(&mut self, type_urid: u32, parts: &[&[u8]]) -> &mut Self {
        let size = parts.iter().map(|p| p.len()).sum();
        self.header(size, type_urid);
        for part in parts {
            self.buf.extend_from_slice(part);
        }
        self.pad();
        self
    }

    /// A complete, already encoded atom copied verbatim.
    pub fn raw(&mut self, atom: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(atom);
        self.pad();
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.atom(self.urids.bool_.get(), &(value as i32).to_ne_bytes())
    }

    pub fn int(&mut self, value: i32) -> &mut Self {
        self.atom(self.urids.int.get(), &value.to_ne_bytes())
    }

    pub fn long(&mut self, value: i64) -> &mut Self {
        self.atom(self.urids.long.get(), &value.to_ne_bytes())
    }

    pub fn float(&mut self, value: f32) -> &mut Self {
        self.atom(self.urids.float.get(), &value.to_ne_bytes())
    }

    pub fn double(&mut self, value: f64) -> &mut Self {
        self.atom(self.urids.double.get(), &value.to_ne_bytes())
    }

    pub fn urid(&mut self, value: Urid) -> &mut Self {
        self.atom(self.urids.urid.get(), &value.get().to_ne_bytes())
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.atom_parts(self.urids.string.get(), &[value.as_bytes(), &[0]])
    }

    pub fn uri(&mut self, value: &str) -> &mut Self {
        self.atom_parts(self.urids.uri.get(), &[value.as_bytes(), &[0]])
    }

    pub fn path(&mut self, value: &str) -> &mut Self {
        self.atom_parts(self.urids.path.get(), &[value.as_bytes(), &[0]])
    }

    pub fn chunk(&mut self, value: &[u8]) -> &mut Self {
        self.atom(self.urids.chunk.get(), value)
    }

    pub fn literal(&mut self, datatype: u32, lang: u32, text: &str) -> &mut Self {
        self.atom_parts(
            self.urids.literal.get(),
            &[
                &datatype.to_ne_bytes(),
                &lang.to_ne_bytes(),
                text.as_bytes(),
                &[0],
            ],
        )
    }

    /// Vector of fixed-size children, `elements` already laid out back to back.
    pub fn vector(&mut self, child_type: Urid, child_size: u32, elements: &[u8]) -> &mut Self {
        self.atom_parts(
            self.urids.vector.get(),
            &[
                &child_size.to_ne_bytes(),
                &child_type.get().to_ne_bytes(),
                elements,
            ],
        )
    }

    /// Property key, to be followed by exactly one value atom.
    pub fn key(&mut self, key: Urid) -> &mut Self {
        self.buf.extend_from_slice(&key.get().to_ne_bytes());
        self.buf.extend_from_slice(&0u32.to_ne_bytes());
        self
    }

    /// Frame time of the next sequence event, to be followed by one atom.
    pub fn frame_time(&mut self, frames: i64) -> &mut Self {
        self.buf.extend_from_slice(&frames.to_ne_bytes());
        self
    }

    fn push_frame(&mut self, type_urid: u32) {
        let start = self.buf.len();
        self.header(0, type_urid);
        self.frames.push(start);
    }

    fn pop_frame(&mut self) {
        if let Some(start) = self.frames.pop() {
            let size = self.buf.len() - start - ATOM_HEADER_SIZE;
            self.buf[start..start + 4].copy_from_slice(&(size as u32).to_ne_bytes());
        }
        self.pad();
    }

    /// Object atom; `f` writes `key` + value pairs.
    pub fn object(&mut self, id: u32, otype: u32, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.push_frame(self.urids.object.get());
        self.buf.extend_from_slice(&id.to_ne_bytes());
        self.buf.extend_from_slice(&otype.to_ne_bytes());
        f(self);
        self.pop_frame();
        self
    }

    /// Sequence atom; `f` writes `frame_time` + event atom pairs.
    pub fn sequence(&mut self, unit: u32, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.push_frame(self.urids.sequence.get());
        self.buf.extend_from_slice(&unit.to_ne_bytes());
        self.buf.extend_from_slice(&0u32.to_ne_bytes());
        f(self);
        self.pop_frame();
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
