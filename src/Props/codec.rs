// Field bytes <-> tagged atom, per value kind.
//
// Decoding is split in two: `decode` validates an incoming atom against the
// slot without touching any buffer, `store` writes a validated value into a
// field. A rejected payload therefore never leaves a partial write behind.

use crate::Core::atom::{parse_atom, AtomHeader, ATOM_HEADER_SIZE};
use crate::Core::error::{PropsError, Result};
use crate::Props::Slot::PropSlot;
use crate::Props::Structs::Props_Structs::ValueKind;

/// An incoming value that passed every check for its slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoded<'a> {
    kind: ValueKind,
    type_urid: u32,
    /// Scalar: the intrinsic bytes. Text: the text without terminator.
    /// Container: the atom body.
    body: &'a [u8],
}

impl Decoded<'_> {
    /// Bytes the value occupies once stored in its field.
    pub fn stored_len(&self) -> usize {
        match self.kind {
            ValueKind::Scalar => self.body.len(),
            ValueKind::Text => self.body.len() + 1,
            ValueKind::Container => ATOM_HEADER_SIZE + self.body.len(),
        }
    }
}

fn push_header(out: &mut Vec<u8>, size: usize, type_urid: u32) {
    let mut raw = [0u8; ATOM_HEADER_SIZE];
    AtomHeader {
        size: size as u32,
        type_urid,
    }
    .write(&mut raw);
    out.extend_from_slice(&raw);
}

/// Append the atom encoding of `field` to `out`.
///
/// `field` is the slot's field in some state buffer and must be exactly
/// `slot.stash_view().len` bytes.
pub fn encode(slot: &PropSlot, field: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let type_urid = slot.type_urid.get();
    match slot.value_type().kind() {
        ValueKind::Scalar => {
            push_header(out, field.len(), type_urid);
            out.extend_from_slice(field);
        }
        ValueKind::Text => {
            let len = field
                .iter()
                .position(|&b| b == 0)
                .ok_or(PropsError::SizeExceeded {
                    size: field.len() + 1,
                    max: field.len(),
                })?;
            push_header(out, len + 1, type_urid);
            out.extend_from_slice(&field[..len]);
            out.push(0);
        }
        ValueKind::Container => {
            let header = AtomHeader::read(field)?;
            let total = header.total_size();
            if total > field.len() {
                return Err(PropsError::SizeExceeded {
                    size: total,
                    max: field.len(),
                });
            }
            push_header(out, header.size as usize, type_urid);
            out.extend_from_slice(&field[ATOM_HEADER_SIZE..total]);
        }
    }
    Ok(())
}

/// Check `atom` against the slot's type and size bound.
pub fn decode<'a>(slot: &PropSlot, atom: &'a [u8]) -> Result<Decoded<'a>> {
    let atom = parse_atom(atom)?;
    let expected = slot.type_urid.get();
    if atom.type_urid != expected {
        return Err(PropsError::TypeMismatch {
            expected,
            found: atom.type_urid,
        });
    }

    let max = slot.view.len;
    let kind = slot.value_type().kind();
    let body = match kind {
        ValueKind::Scalar => {
            if atom.body.len() > max {
                return Err(PropsError::SizeExceeded {
                    size: atom.body.len(),
                    max,
                });
            }
            if atom.body.len() < max {
                return Err(PropsError::Malformed("scalar body shorter than its type"));
            }
            atom.body
        }
        ValueKind::Text => {
            if atom.body.len() > max {
                return Err(PropsError::SizeExceeded {
                    size: atom.body.len(),
                    max,
                });
            }
            let text_len = atom
                .body
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(atom.body.len());
            // the terminator has to fit as well
            if text_len >= max {
                return Err(PropsError::SizeExceeded {
                    size: text_len + 1,
                    max,
                });
            }
            &atom.body[..text_len]
        }
        ValueKind::Container => {
            if atom.total_size() > max {
                return Err(PropsError::SizeExceeded {
                    size: atom.total_size(),
                    max,
                });
            }
            atom.body
        }
    };

    Ok(Decoded {
        kind,
        type_urid: atom.type_urid,
        body,
    })
}

/// Write a validated value into `field` (the slot's full field).
pub fn store(decoded: &Decoded<'_>, field: &mut [u8]) {
    match decoded.kind {
        ValueKind::Scalar => field.copy_from_slice(decoded.body),
        ValueKind::Text => {
            let len = decoded.body.len();
            field[..len].copy_from_slice(decoded.body);
            field[len..].fill(0);
        }
        ValueKind::Container => {
            let len = decoded.body.len();
            AtomHeader {
                size: len as u32,
                type_urid: decoded.type_urid,
            }
            .write(field);
            field[ATOM_HEADER_SIZE..ATOM_HEADER_SIZE + len].copy_from_slice(decoded.body);
        }
    }
}
