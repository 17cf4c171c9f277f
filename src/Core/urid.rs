// Identifier interning: URI strings <-> compact integer tokens.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

/// Compact integer token standing in for a URI.
///
/// Zero is never a valid token, it is reserved as "not found".
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Urid(NonZeroU32);

impl Urid {
    /// Wrap a raw token, `None` for 0.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for Urid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Urid({})", self.0)
    }
}

impl fmt::Display for Urid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier interning capability injected into the registry.
///
/// The registry calls `map` while it is being built, `lookup` for
/// on-demand resolution by identifier and `unmap` when naming a type in a
/// diagnostic. None of them is called from the real-time side.
pub trait UridMap: Send + Sync {
    /// Return the token for `uri`, creating one if needed.
    fn map(&self, uri: &str) -> Option<Urid>;

    /// Return the token for `uri` only if it already exists.
    fn lookup(&self, uri: &str) -> Option<Urid>;

    /// Reverse lookup.
    fn unmap(&self, urid: Urid) -> Option<String>;
}

#[derive(Default)]
struct MapInner {
    by_uri: HashMap<String, Urid>,
    by_urid: Vec<String>,
}

/// A thread-safe in-process interner.
///
/// Tokens are handed out sequentially starting at 1. An optional limit makes
/// `map` refuse new identifiers once reached.
pub struct HashUridMap {
    inner: RwLock<MapInner>,
    limit: Option<usize>,
}

impl Default for HashUridMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HashUridMap {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MapInner::default()),
            limit: None,
        }
    }

    /// An interner that refuses to create more than `limit` tokens.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: RwLock::new(MapInner::default()),
            limit: Some(limit),
        }
    }

    /// Number of tokens handed out so far.
    pub fn len(&self) -> usize {
        self.inner.read().by_urid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UridMap for HashUridMap {
    fn map(&self, uri: &str) -> Option<Urid> {
        if let Some(urid) = self.lookup(uri) {
            return Some(urid);
        }

        let mut inner = self.inner.write();
        // Another thread may have created it between the two locks.
        if let Some(&urid) = inner.by_uri.get(uri) {
            return Some(urid);
        }
        if let Some(limit) = self.limit {
            if inner.by_urid.len() >= limit {
                return None;
            }
        }

        let next = u32::try_from(inner.by_urid.len() + 1).ok()?;
        let urid = Urid::new(next)?;
        inner.by_uri.insert(uri.to_owned(), urid);
        inner.by_urid.push(uri.to_owned());
        Some(urid)
    }

    fn lookup(&self, uri: &str) -> Option<Urid> {
        self.inner.read().by_uri.get(uri).copied()
    }

    fn unmap(&self, urid: Urid) -> Option<String> {
        let inner = self.inner.read();
        inner.by_urid.get(urid.get() as usize - 1).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_stable_and_nonzero() {
        let map = HashUridMap::new();
        let a = map.map("urn:a").unwrap();
        let b = map.map("urn:b").unwrap();
        assert_ne!(a, b);
        assert_eq!(map.map("urn:a"), Some(a));
        assert_eq!(a.get(), 1);
        assert_eq!(map.unmap(b).as_deref(), Some("urn:b"));
    }

    #[test]
    fn lookup_never_creates() {
        let map = HashUridMap::new();
        assert_eq!(map.lookup("urn:missing"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn limit_refuses_new_identifiers() {
        let map = HashUridMap::with_limit(2);
        assert!(map.map("urn:1").is_some());
        assert!(map.map("urn:2").is_some());
        assert!(map.map("urn:3").is_none());
        // existing ones still resolve
        assert!(map.map("urn:1").is_some());
    }

    #[test]
    fn zero_is_not_a_token() {
        assert!(Urid::new(0).is_none());
        assert_eq!(Urid::new(7).map(Urid::get), Some(7));
    }
}
