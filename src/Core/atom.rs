// Read side of the LV2 atom container format.
//
// An atom is an 8-byte header {size: u32, type: u32} followed by `size`
// body bytes, all in native byte order. Atoms nested inside objects and
// sequences are padded to 8 bytes.

use super::error::{PropsError, Result};
use super::urid::{Urid, UridMap};

pub const ATOM_HEADER_SIZE: usize = 8;

pub mod uris {
    pub const ATOM_BOOL: &str = "http://lv2plug.in/ns/ext/atom#Bool";
    pub const ATOM_INT: &str = "http://lv2plug.in/ns/ext/atom#Int";
    pub const ATOM_LONG: &str = "http://lv2plug.in/ns/ext/atom#Long";
    pub const ATOM_FLOAT: &str = "http://lv2plug.in/ns/ext/atom#Float";
    pub const ATOM_DOUBLE: &str = "http://lv2plug.in/ns/ext/atom#Double";
    pub const ATOM_URID: &str = "http://lv2plug.in/ns/ext/atom#URID";
    pub const ATOM_STRING: &str = "http://lv2plug.in/ns/ext/atom#String";
    pub const ATOM_URI: &str = "http://lv2plug.in/ns/ext/atom#URI";
    pub const ATOM_PATH: &str = "http://lv2plug.in/ns/ext/atom#Path";
    pub const ATOM_CHUNK: &str = "http://lv2plug.in/ns/ext/atom#Chunk";
    pub const ATOM_LITERAL: &str = "http://lv2plug.in/ns/ext/atom#Literal";
    pub const ATOM_VECTOR: &str = "http://lv2plug.in/ns/ext/atom#Vector";
    pub const ATOM_OBJECT: &str = "http://lv2plug.in/ns/ext/atom#Object";
    pub const ATOM_SEQUENCE: &str = "http://lv2plug.in/ns/ext/atom#Sequence";

    pub const PATCH_GET: &str = "http://lv2plug.in/ns/ext/patch#Get";
    pub const PATCH_SET: &str = "http://lv2plug.in/ns/ext/patch#Set";
    pub const PATCH_PUT: &str = "http://lv2plug.in/ns/ext/patch#Put";
    pub const PATCH_SUBJECT: &str = "http://lv2plug.in/ns/ext/patch#subject";
    pub const PATCH_PROPERTY: &str = "http://lv2plug.in/ns/ext/patch#property";
    pub const PATCH_VALUE: &str = "http://lv2plug.in/ns/ext/patch#value";
    pub const PATCH_BODY: &str = "http://lv2plug.in/ns/ext/patch#body";
    pub const PATCH_READABLE: &str = "http://lv2plug.in/ns/ext/patch#readable";
    pub const PATCH_WRITABLE: &str = "http://lv2plug.in/ns/ext/patch#writable";
}

/// Round `size` up to the 8-byte atom alignment.
#[inline]
pub const fn pad_size(size: usize) -> usize {
    (size + 7) & !7
}

#[inline]
pub(crate) fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// The fixed header in front of every atom body.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AtomHeader {
    /// Body size in bytes, header excluded.
    pub size: u32,
    /// Type token.
    pub type_urid: u32,
}

impl AtomHeader {
    pub fn read(bytes: &[u8]) -> Result<Self> {
        match (read_u32(bytes, 0), read_u32(bytes, 4)) {
            (Some(size), Some(type_urid)) => Ok(Self { size, type_urid }),
            _ => Err(PropsError::Malformed("atom header truncated")),
        }
    }

    /// Write the header into the first 8 bytes of `out`.
    ///
    /// `out` must be at least `ATOM_HEADER_SIZE` long.
    #[inline]
    pub fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.size.to_ne_bytes());
        out[4..8].copy_from_slice(&self.type_urid.to_ne_bytes());
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        ATOM_HEADER_SIZE + self.size as usize
    }
}

/// A borrowed, header-validated atom.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Atom<'a> {
    pub type_urid: u32,
    pub body: &'a [u8],
}

/// Parse one atom from the front of `bytes`. Trailing bytes (padding) are ignored.
pub fn parse_atom(bytes: &[u8]) -> Result<Atom<'_>> {
    let header = AtomHeader::read(bytes)?;
    let body = bytes
        .get(ATOM_HEADER_SIZE..header.total_size())
        .ok_or(PropsError::Malformed("atom body truncated"))?;
    Ok(Atom {
        type_urid: header.type_urid,
        body,
    })
}

impl<'a> Atom<'a> {
    #[inline]
    pub fn header(&self) -> AtomHeader {
        AtomHeader {
            size: self.body.len() as u32,
            type_urid: self.type_urid,
        }
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        ATOM_HEADER_SIZE + self.body.len()
    }

    /// Append header and body, unpadded.
    pub fn write_into(&self, out: &mut Vec<u8>) {
        let mut raw = [0u8; ATOM_HEADER_SIZE];
        self.header().write(&mut raw);
        out.extend_from_slice(&raw);
        out.extend_from_slice(self.body);
    }

    /// Body as a token, when the body is exactly 4 bytes.
    pub fn as_urid(&self) -> Option<Urid> {
        if self.body.len() != 4 {
            return None;
        }
        read_u32(self.body, 0).and_then(Urid::new)
    }

    pub fn as_i32(&self) -> Option<i32> {
        if self.body.len() != 4 {
            return None;
        }
        read_u32(self.body, 0).map(|v| v as i32)
    }

    /// Text body with its terminator stripped.
    pub fn as_str(&self) -> Option<&'a str> {
        let end = self.body.iter().position(|&b| b == 0).unwrap_or(self.body.len());
        std::str::from_utf8(&self.body[..end]).ok()
    }

    /// Interpret the body as an object: `{id, otype}` followed by properties.
    pub fn object(&self) -> Result<ObjectView<'a>> {
        match (read_u32(self.body, 0), read_u32(self.body, 4)) {
            (Some(id), Some(otype)) => Ok(ObjectView {
                id,
                otype,
                props: &self.body[8..],
            }),
            _ => Err(PropsError::Malformed("object body truncated")),
        }
    }
}

/// Object body split into its id, its type and its property list.
#[derive(Copy, Clone, Debug)]
pub struct ObjectView<'a> {
    pub id: u32,
    pub otype: u32,
    props: &'a [u8],
}

impl<'a> ObjectView<'a> {
    pub fn iter(&self) -> ObjectIter<'a> {
        ObjectIter {
            bytes: self.props,
            pos: 0,
        }
    }

    /// First property with the given key.
    pub fn get(&self, key: u32) -> Result<Option<Atom<'a>>> {
        for prop in self.iter() {
            let (k, value) = prop?;
            if k == key {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

/// Iterator over `(key, value)` pairs of an object body.
pub struct ObjectIter<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = Result<(u32, Atom<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[self.pos..];
        let key = match read_u32(rest, 0) {
            Some(key) if rest.len() >= 8 => key,
            _ => {
                self.pos = self.bytes.len();
                return Some(Err(PropsError::Malformed("object property truncated")));
            }
        };
        // rest[4..8] is the context, unused
        match parse_atom(&rest[8..]) {
            Ok(value) => {
                self.pos += pad_size(8 + value.total_size());
                Some(Ok((key, value)))
            }
            Err(e) => {
                self.pos = self.bytes.len();
                Some(Err(e))
            }
        }
    }
}

/// Tokens of the atom and patch vocabulary, mapped once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtomUrids {
    pub bool_: Urid,
    pub int: Urid,
    pub long: Urid,
    pub float: Urid,
    pub double: Urid,
    pub urid: Urid,
    pub string: Urid,
    pub uri: Urid,
    pub path: Urid,
    pub chunk: Urid,
    pub literal: Urid,
    pub vector: Urid,
    pub object: Urid,
    pub sequence: Urid,
    pub patch_get: Urid,
    pub patch_set: Urid,
    pub patch_put: Urid,
    pub patch_subject: Urid,
    pub patch_property: Urid,
    pub patch_value: Urid,
    pub patch_body: Urid,
    pub patch_readable: Urid,
    pub patch_writable: Urid,
}

impl AtomUrids {
    pub fn map(map: &dyn UridMap) -> Result<Self> {
        let m = |uri: &str| {
            map.map(uri).ok_or_else(|| PropsError::MapFailed {
                uri: uri.to_owned(),
            })
        };
        Ok(Self {
            bool_: m(uris::ATOM_BOOL)?,
            int: m(uris::ATOM_INT)?,
            long: m(uris::ATOM_LONG)?,
            float: m(uris::ATOM_FLOAT)?,
            double: m(uris::ATOM_DOUBLE)?,
            urid: m(uris::ATOM_URID)?,
            string: m(uris::ATOM_STRING)?,
            uri: m(uris::ATOM_URI)?,
            path: m(uris::ATOM_PATH)?,
            chunk: m(uris::ATOM_CHUNK)?,
            literal: m(uris::ATOM_LITERAL)?,
            vector: m(uris::ATOM_VECTOR)?,
            object: m(uris::ATOM_OBJECT)?,
            sequence: m(uris::ATOM_SEQUENCE)?,
            patch_get: m(uris::PATCH_GET)?,
            patch_set: m(uris::PATCH_SET)?,
            patch_put: m(uris::PATCH_PUT)?,
            patch_subject: m(uris::PATCH_SUBJECT)?,
            patch_property: m(uris::PATCH_PROPERTY)?,
            patch_value: m(uris::PATCH_VALUE)?,
            patch_body: m(uris::PATCH_BODY)?,
            patch_readable: m(uris::PATCH_READABLE)?,
            patch_writable: m(uris::PATCH_WRITABLE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom_bytes(size: u32, type_urid: u32, body: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; ATOM_HEADER_SIZE];
        AtomHeader { size, type_urid }.write(&mut out);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn parse_reads_header_and_body() {
        let bytes = atom_bytes(4, 9, &42i32.to_ne_bytes());
        let atom = parse_atom(&bytes).unwrap();
        assert_eq!(atom.type_urid, 9);
        assert_eq!(atom.as_i32(), Some(42));
        assert_eq!(atom.total_size(), 12);
    }

    #[test]
    fn truncated_input_is_malformed() {
        assert_eq!(
            parse_atom(&[1, 0, 0]),
            Err(PropsError::Malformed("atom header truncated"))
        );
        let bytes = atom_bytes(16, 9, &[0u8; 4]);
        assert_eq!(
            parse_atom(&bytes),
            Err(PropsError::Malformed("atom body truncated"))
        );
    }

    #[test]
    fn padding_is_aligned_to_eight() {
        assert_eq!(pad_size(0), 0);
        assert_eq!(pad_size(1), 8);
        assert_eq!(pad_size(8), 8);
        assert_eq!(pad_size(13), 16);
    }

    #[test]
    fn object_iteration_steps_over_padding() {
        // object body: id, otype, then two properties whose values need padding
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_ne_bytes());
        body.extend_from_slice(&5u32.to_ne_bytes());
        for (key, text) in [(11u32, &b"ab\0"[..]), (12u32, &b"xyz\0"[..])] {
            body.extend_from_slice(&key.to_ne_bytes());
            body.extend_from_slice(&0u32.to_ne_bytes());
            body.extend(atom_bytes(text.len() as u32, 3, text));
            body.resize(pad_size(body.len()), 0);
        }
        let bytes = atom_bytes(body.len() as u32, 7, &body);
        let object = parse_atom(&bytes).unwrap().object().unwrap();
        assert_eq!(object.otype, 5);

        let props: Vec<_> = object.iter().collect::<Result<_>>().unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].0, 11);
        assert_eq!(props[0].1.as_str(), Some("ab"));
        assert_eq!(props[1].1.as_str(), Some("xyz"));
        assert_eq!(object.get(12).unwrap().and_then(|a| a.as_str()), Some("xyz"));
        assert!(object.get(99).unwrap().is_none());
    }
}
