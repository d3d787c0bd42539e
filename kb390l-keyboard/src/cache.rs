//! Page cache and dirty tracking

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use kb390l_transport::cmd;

/// Cache key: page index in the high byte, command in the low byte
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey(u16);

impl PageKey {
    pub fn new(page: u8, index: u8) -> Self {
        Self(u16::from(index) << 8 | u16::from(page))
    }

    pub fn page(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn index(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", cmd::name(self.page()), self.index())
    }
}

/// Last known contents of every page and flag response touched so far.
///
/// A key is dirty iff its cached bytes were changed locally since they were
/// last read from or written to the device. Iteration is in key order, which
/// keeps saves in a stable page order.
#[derive(Debug, Default)]
pub struct PageCache {
    entries: BTreeMap<PageKey, Vec<u8>>,
    dirty: BTreeSet<PageKey>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: PageKey) -> Option<&[u8]> {
        self.entries.get(&key).map(Vec::as_slice)
    }

    /// Store bytes that match the device
    pub fn insert_clean(&mut self, key: PageKey, bytes: Vec<u8>) {
        self.dirty.remove(&key);
        self.entries.insert(key, bytes);
    }

    /// Store bytes that diverge from the device
    pub fn insert_dirty(&mut self, key: PageKey, bytes: Vec<u8>) {
        self.dirty.insert(key);
        self.entries.insert(key, bytes);
    }

    /// Replace cached bytes without touching the dirty flag
    pub fn replace(&mut self, key: PageKey, bytes: Vec<u8>) {
        self.entries.insert(key, bytes);
    }

    pub fn mark_clean(&mut self, key: PageKey) {
        self.dirty.remove(&key);
    }

    pub fn is_dirty(&self, key: PageKey) -> bool {
        self.dirty.contains(&key)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Dirty keys with their pending bytes, in key order
    pub fn dirty_pages(&self) -> Vec<(PageKey, Vec<u8>)> {
        self.dirty
            .iter()
            .filter_map(|key| self.entries.get(key).map(|bytes| (*key, bytes.clone())))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = PageKey::new(cmd::MACRO, 5);
        assert_eq!(key.raw(), 0x0511);
        assert_eq!(key.page(), cmd::MACRO);
        assert_eq!(key.index(), 5);
        assert_eq!(format!("{key:?}"), "MACRO[5]");
    }

    #[test]
    fn test_dirty_tracking() {
        let mut cache = PageCache::new();
        let buttons = PageKey::new(cmd::BUTTONS, 0);
        let mac = PageKey::new(cmd::MACRO, 1);

        cache.insert_clean(buttons, vec![0; 4]);
        assert!(!cache.has_dirty());

        cache.insert_dirty(mac, vec![1; 4]);
        cache.insert_dirty(buttons, vec![2; 4]);
        assert!(cache.is_dirty(buttons));

        let pending: Vec<_> = cache.dirty_pages().into_iter().map(|(k, _)| k).collect();
        assert_eq!(pending, vec![buttons, mac]);

        cache.mark_clean(buttons);
        assert!(!cache.is_dirty(buttons));
        assert_eq!(cache.get(buttons), Some(&[2u8; 4][..]));

        cache.insert_clean(mac, vec![3; 4]);
        assert!(!cache.has_dirty());

        cache.clear();
        assert!(cache.get(buttons).is_none());
    }
}
