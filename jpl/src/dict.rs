//! Hash dictionary keyed by byte slices.
//!
//! Open addressing with quadratic probing. Removed entries leave a
//! tombstone behind so collision chains that run through them stay intact
//! until the next resize.
use std::fmt;

use log::trace;

/// Capacity of a dictionary created with [`HashDict::new`].
pub const SMALL_CAPACITY: usize = 0xFF;

const SEED: u32 = 0x9747_b28c;

#[derive(Debug, Clone, Copy)]
enum Slot<'k, V> {
    /// Never written. Terminates a slot sequence.
    Empty,
    /// Previously occupied, removed since.
    Tombstone,
    Occupied { key: &'k [u8], value: V },
}

/// Error returned by [`HashDict::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError<V> {
    /// A live entry with an equal key exists. Carries its value.
    Occupied(V),
    /// Zero length keys are never stored.
    EmptyKey,
}

impl<V: fmt::Debug> fmt::Display for InsertError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupied(value) => write!(f, "key already bound to {value:?}"),
            Self::EmptyKey => write!(f, "empty key"),
        }
    }
}

pub struct HashDict<'k, V> {
    slots: Vec<Slot<'k, V>>,
    /// Number of live entries.
    size: usize,
}

impl<'k, V: Copy> HashDict<'k, V> {
    pub fn new() -> Self {
        Self::with_capacity(SMALL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::Empty; capacity.max(1)],
            size: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Look up the value bound to the given key.
    pub fn try_get(&self, key: &(impl AsRef<[u8]> + ?Sized)) -> Option<V> {
        let key = key.as_ref();
        if key.is_empty() {
            return None;
        }

        self.find(key).map(|index| match self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("find only returns occupied slots"),
        })
    }

    #[inline]
    pub fn contains_key(&self, key: &(impl AsRef<[u8]> + ?Sized)) -> bool {
        self.try_get(key).is_some()
    }

    /// Insert the entry only if no live entry with an equal key exists.
    ///
    /// On collision the dictionary is left untouched and the existing
    /// value is handed back.
    pub fn insert_if_absent(
        &mut self,
        key: &'k (impl AsRef<[u8]> + ?Sized),
        value: V,
    ) -> Result<(), InsertError<V>> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(InsertError::EmptyKey);
        }

        match self.lookup(key) {
            Lookup::Found(index) => match self.slots[index] {
                Slot::Occupied { value, .. } => Err(InsertError::Occupied(value)),
                _ => unreachable!("lookup found a slot that is not occupied"),
            },
            Lookup::Vacant(index) => {
                self.occupy(index, key, value);
                Ok(())
            }
            Lookup::Full => {
                self.grow();
                self.insert_if_absent(key, value)
            }
        }
    }

    /// Insert the entry, replacing the value of an existing equal key.
    ///
    /// Returns the replaced value.
    pub fn insert_or_replace(&mut self, key: &'k (impl AsRef<[u8]> + ?Sized), value: V) -> Option<V> {
        let key = key.as_ref();
        if key.is_empty() {
            return None;
        }

        match self.lookup(key) {
            Lookup::Found(index) => match &mut self.slots[index] {
                Slot::Occupied { value: old, .. } => Some(std::mem::replace(old, value)),
                _ => unreachable!("lookup found a slot that is not occupied"),
            },
            Lookup::Vacant(index) => {
                self.occupy(index, key, value);
                None
            }
            Lookup::Full => {
                self.grow();
                self.insert_or_replace(key, value)
            }
        }
    }

    /// Remove the live entry with an equal key, leaving a tombstone.
    pub fn remove(&mut self, key: &(impl AsRef<[u8]> + ?Sized)) -> Option<V> {
        let key = key.as_ref();
        if key.is_empty() {
            return None;
        }

        let index = self.find(key)?;
        match std::mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied { value, .. } => {
                self.size -= 1;
                Some(value)
            }
            _ => unreachable!("find only returns occupied slots"),
        }
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&'k [u8], V)> + '_ {
        self.slots.iter().filter_map(|slot| match *slot {
            Slot::Occupied { key, value } => Some((key, value)),
            _ => None,
        })
    }

    /// Slot indices visited by a lookup of `key`, in order.
    fn slot_sequence(&self, key: &[u8]) -> impl Iterator<Item = usize> {
        let capacity = self.slots.len();
        let base = murmur3_32(key, SEED) as usize % capacity;
        (0..capacity).map(move |i| (base + i.wrapping_mul(i) % capacity) % capacity)
    }

    fn find(&self, key: &[u8]) -> Option<usize> {
        for index in self.slot_sequence(key) {
            match self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => continue,
                Slot::Occupied { key: other, .. } => {
                    if other == key {
                        return Some(index);
                    }
                }
            }
        }

        None
    }

    /// Walk the slot sequence looking for an equal live key, remembering
    /// the first reusable slot on the way.
    fn lookup(&self, key: &[u8]) -> Lookup {
        let mut reusable = None;

        for index in self.slot_sequence(key) {
            match self.slots[index] {
                Slot::Empty => return Lookup::Vacant(reusable.unwrap_or(index)),
                Slot::Tombstone => {
                    if reusable.is_none() {
                        reusable = Some(index);
                    }
                }
                Slot::Occupied { key: other, .. } => {
                    if other == key {
                        return Lookup::Found(index);
                    }
                }
            }
        }

        match reusable {
            Some(index) => Lookup::Vacant(index),
            None => Lookup::Full,
        }
    }

    fn occupy(&mut self, index: usize, key: &'k [u8], value: V) {
        self.slots[index] = Slot::Occupied { key, value };
        self.size += 1;

        // Load factor above 0.75
        if self.size * 4 > self.slots.len() * 3 {
            self.grow();
        }
    }

    fn grow(&mut self) {
        let entries: Vec<_> = self.iter().collect();
        let mut capacity = self.slots.len();

        // Quadratic probing only reaches part of the table, so retry
        // with a bigger one in the unlikely case an entry finds no slot.
        loop {
            capacity = ((capacity + 1) << 2) - 1;
            trace!("growing dictionary {} -> {}", self.slots.len(), capacity);

            self.slots = vec![Slot::Empty; capacity];
            self.size = 0;

            if entries.iter().all(|&(key, value)| self.reinsert(key, value)) {
                return;
            }
        }
    }

    /// Place an entry known to be unique during a resize.
    fn reinsert(&mut self, key: &'k [u8], value: V) -> bool {
        match self.lookup(key) {
            Lookup::Vacant(index) => {
                self.slots[index] = Slot::Occupied { key, value };
                self.size += 1;
                true
            }
            _ => false,
        }
    }
}

impl<'k, V: Copy> Default for HashDict<'k, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'k, V: Copy + fmt::Debug> fmt::Debug for HashDict<'k, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(key, value)| (String::from_utf8_lossy(key), value)))
            .finish()
    }
}

enum Lookup {
    Found(usize),
    Vacant(usize),
    /// Every slot on the slot sequence holds a different live key.
    Full,
}

/// 32-bit MurmurHash3 (x86 variant).
pub fn murmur3_32(key: &[u8], seed: u32) -> u32 {
    #[inline]
    fn scramble(k: u32) -> u32 {
        k.wrapping_mul(0xcc9e_2d51)
            .rotate_left(15)
            .wrapping_mul(0x1b87_3593)
    }

    let mut h = seed;

    let mut blocks = key.chunks_exact(4);
    for block in &mut blocks {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= scramble(k);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    let mut k: u32 = 0;
    for byte in tail.iter().rev() {
        k <<= 8;
        k |= *byte as u32;
    }
    h ^= scramble(k);

    h ^= key.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;

    h
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_murmur3_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514E_28B7);
        assert_eq!(murmur3_32(b"", 0xffff_ffff), 0x81F1_6F39);
        assert_eq!(murmur3_32(b"test", SEED), 0x704b_81dc);
        assert_eq!(murmur3_32(b"Hello, world!", SEED), 0x2488_4CBA);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", SEED),
            0x2FA8_26CD
        );
    }

    #[test]
    fn test_insert_get_remove() {
        let mut dict = HashDict::new();

        assert_eq!(dict.insert_if_absent("x", 1_u64), Ok(()));
        assert_eq!(dict.try_get("x"), Some(1));
        assert!(dict.contains_key("x"));
        assert_eq!(dict.len(), 1);

        assert_eq!(dict.remove("x"), Some(1));
        assert_eq!(dict.try_get("x"), None);
        assert!(!dict.contains_key("x"));
        assert_eq!(dict.remove("x"), None);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let mut dict = HashDict::new();

        dict.insert_if_absent("x", 1_u64).unwrap();
        assert_eq!(dict.insert_if_absent("x", 2), Err(InsertError::Occupied(1)));
        assert_eq!(dict.try_get("x"), Some(1));
    }

    #[test]
    fn test_insert_or_replace() {
        let mut dict = HashDict::new();

        assert_eq!(dict.insert_or_replace("x", 1_u64), None);
        assert_eq!(dict.insert_or_replace("x", 2), Some(1));
        assert_eq!(dict.try_get("x"), Some(2));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_empty_key_is_noop() {
        let mut dict: HashDict<u64> = HashDict::new();

        assert_eq!(dict.insert_if_absent("", 1), Err(InsertError::EmptyKey));
        assert_eq!(dict.insert_or_replace("", 1), None);
        assert_eq!(dict.try_get(""), None);
        assert_eq!(dict.remove(""), None);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_tombstone_slot_is_reused() {
        let mut dict = HashDict::with_capacity(7);

        dict.insert_if_absent("a", 1_u64).unwrap();
        let index = dict.find(b"a").unwrap();
        dict.remove("a");
        assert!(matches!(dict.slots[index], Slot::Tombstone));

        dict.insert_if_absent("a", 2).unwrap();
        assert_eq!(dict.find(b"a"), Some(index));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_lookup_skips_tombstones() {
        let keys: Vec<String> = (0..5).map(|i| format!("k{i}")).collect();
        let mut dict = HashDict::with_capacity(7);

        for (i, key) in keys.iter().enumerate() {
            dict.insert_if_absent(key, i).unwrap();
        }
        for key in &keys[..3] {
            dict.remove(key);
        }

        assert_eq!(dict.try_get(&keys[3]), Some(3));
        assert_eq!(dict.try_get(&keys[4]), Some(4));
    }

    #[test]
    fn test_growth_preserves_entries() {
        let keys: Vec<String> = (0..1000).map(|i| format!("name_{i}")).collect();
        let mut dict = HashDict::new();

        for (i, key) in keys.iter().enumerate() {
            dict.insert_if_absent(key, i).unwrap();
        }

        assert!(dict.capacity() > SMALL_CAPACITY);
        assert_eq!(dict.len(), keys.len());
        assert!(dict.len() * 4 <= dict.capacity() * 3);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(dict.try_get(key), Some(i));
        }
    }

    #[test]
    fn test_growth_capacity_sequence() {
        let keys: Vec<String> = (0..192).map(|i| i.to_string()).collect();
        let mut dict = HashDict::new();

        for key in &keys[..191] {
            dict.insert_if_absent(key, ()).unwrap();
        }
        assert_eq!(dict.capacity(), 0xFF);

        dict.insert_if_absent(&keys[191], ()).unwrap();
        assert_eq!(dict.capacity(), 0x3FF);
    }
}
