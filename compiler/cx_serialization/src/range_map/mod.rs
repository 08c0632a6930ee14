//! Sorted map from range starts to values.
//!
//! A key belongs to the entry with the greatest start not above it. Ranges
//! are implicit: each entry covers everything up to the next start, and
//! callers that need a hard end store it in the value.

/// Map from the start of each half-open range to a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContinuousRangeMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for ContinuousRangeMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Ord + Copy, V> ContinuousRangeMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Starts must be inserted in increasing order; use a
    /// [`Builder`] when they arrive out of order.
    ///
    /// # Panics
    /// Panics if `start` is not greater than every existing start.
    pub fn insert(&mut self, start: K, value: V) {
        if let Some((last, _)) = self.entries.last() {
            assert!(*last < start, "range map entries must be inserted in order");
        }
        self.entries.push((start, value));
    }

    /// Entry whose range contains `key`: the one with the greatest start
    /// `<= key`.
    pub fn find(&self, key: K) -> Option<(K, &V)> {
        let idx = self.entries.partition_point(|(start, _)| *start <= key);
        let (start, value) = self.entries.get(idx.checked_sub(1)?)?;
        Some((*start, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn builder(&mut self) -> Builder<'_, K, V> {
        Builder {
            map: self,
            pending: Vec::new(),
        }
    }
}

/// Collects entries in any order and merges them into the map on
/// [`Builder::finish`] (or drop). When two entries share a start, the
/// one added first wins.
pub struct Builder<'m, K: Ord + Copy, V> {
    map: &'m mut ContinuousRangeMap<K, V>,
    pending: Vec<(K, V)>,
}

impl<K: Ord + Copy, V> Builder<'_, K, V> {
    pub fn insert(&mut self, start: K, value: V) {
        self.pending.push((start, value));
    }

    pub fn finish(self) {}

    fn merge(&mut self) {
        let entries = &mut self.map.entries;
        entries.append(&mut self.pending);
        entries.sort_by_key(|(start, _)| *start);
        entries.dedup_by_key(|(start, _)| *start);
    }
}

impl<K: Ord + Copy, V> Drop for Builder<'_, K, V> {
    fn drop(&mut self) {
        self.merge();
    }
}

#[cfg(test)]
mod tests;
