//! Reverse index from qubits to the cached results that depend on them.
//!
//! Every entry is filed under *every* qubit of its stabilizer, so that
//! anything happening to one qubit can find all the results it makes stale.
//! Entries are only ever added or removed through [`CacheIndex`], which keeps
//! the buckets and the entry table in step.

use rustc_hash::{ FxHashMap, FxHashSet };
use crate::{
    error::{ SimError, SimResult },
    stabilizer::{ QubitId, Stabilizer },
};

/// Key of a single cached entry, unique for the lifetime of an index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(usize);

/// A remembered outcome.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CachedValue {
    /// Committed by a measurement.
    Bit(bool),
    /// Reported by a probability query.
    Probability(f64),
}

impl CachedValue {
    /// The outcome a measurement is certain to give, if there is one.
    ///
    /// A probability of exactly 0 or 1 counts as certain.
    pub fn as_bit(self) -> Option<bool> {
        match self {
            Self::Bit(b) => Some(b),
            Self::Probability(p) if p == 0.0 => Some(false),
            Self::Probability(p) if p == 1.0 => Some(true),
            Self::Probability(_) => None,
        }
    }

    /// Probability of a `true` outcome; a committed bit is 0 or 1.
    pub fn as_probability(self) -> f64 {
        match self {
            Self::Bit(b) => if b { 1.0 } else { 0.0 },
            Self::Probability(p) => p,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CachedEntry {
    pub stabilizer: Stabilizer,
    pub value: CachedValue,
}

/// Cached entries plus one bucket per live qubit.
#[derive(Clone, Debug, Default)]
pub struct CacheIndex {
    buckets: FxHashMap<QubitId, Vec<EntryId>>,
    entries: FxHashMap<EntryId, CachedEntry>,
    next_id: usize,
}

impl CacheIndex {
    pub fn new() -> Self { Self::default() }

    /// Number of live entries.
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Number of qubits with a bucket.
    pub fn num_qubits(&self) -> usize { self.buckets.len() }

    /// Create an empty bucket for `q`. Returns `false` if it already had one.
    pub fn add_qubit(&mut self, q: QubitId) -> bool {
        if self.buckets.contains_key(&q) { return false; }
        self.buckets.insert(q, Vec::new());
        true
    }

    pub fn contains_qubit(&self, q: QubitId) -> bool {
        self.buckets.contains_key(&q)
    }

    /// Evict every entry touching `q` and drop its bucket, returning the
    /// number of entries evicted.
    pub fn remove_qubit(&mut self, q: QubitId) -> usize {
        let evicted = self.invalidate_qubit(q);
        self.buckets.remove(&q);
        evicted
    }

    pub fn get(&self, id: EntryId) -> Option<&CachedEntry> { self.entries.get(&id) }

    /// Iterate over all live entries in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &CachedEntry)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Ids of the entries filed under `q`.
    pub fn bucket(&self, q: QubitId) -> Option<&[EntryId]> {
        self.buckets.get(&q).map(|ids| ids.as_slice())
    }

    /// Find the entry whose stabilizer is structurally equal to `stab`,
    /// searching only the bucket of its lead qubit.
    pub fn lookup(&self, stab: &Stabilizer) -> Option<&CachedEntry> {
        let lead = stab.lead()?;
        self.buckets.get(&lead)?
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|entry| entry.stabilizer == *stab)
    }

    /// File `value` under every qubit of `stab`, replacing any entry already
    /// held for the same stabilizer.
    ///
    /// Nothing is changed if any qubit of `stab` has no bucket.
    pub fn insert(&mut self, stab: Stabilizer, value: CachedValue)
        -> SimResult<EntryId>
    {
        if let Some(q) = stab.qubits().iter().find(|q| !self.buckets.contains_key(*q)) {
            return Err(SimError::UnknownQubit(*q));
        }
        let stale: Option<EntryId>
            = stab.lead()
            .and_then(|lead| self.buckets.get(&lead))
            .and_then(|ids| {
                ids.iter().copied()
                    .find(|id| {
                        self.entries.get(id)
                            .is_some_and(|entry| entry.stabilizer == stab)
                    })
            });
        if let Some(id) = stale { self.remove(id); }
        let id = EntryId(self.next_id);
        self.next_id += 1;
        for q in stab.qubits() {
            if let Some(ids) = self.buckets.get_mut(q) { ids.push(id); }
        }
        self.entries.insert(id, CachedEntry { stabilizer: stab, value });
        Ok(id)
    }

    /// Remove an entry from the table and from every bucket it is filed in.
    pub fn remove(&mut self, id: EntryId) -> Option<CachedEntry> {
        let entry = self.entries.remove(&id)?;
        for q in entry.stabilizer.qubits() {
            if let Some(ids) = self.buckets.get_mut(q) {
                ids.retain(|other| *other != id);
            }
        }
        Some(entry)
    }

    /// Evict every entry touching `q`.
    pub fn invalidate_qubit(&mut self, q: QubitId) -> usize {
        let ids: Vec<EntryId>
            = self.buckets.get(&q).cloned().unwrap_or_default();
        ids.into_iter()
            .filter(|id| self.remove(*id).is_some())
            .count()
    }

    /// Evict every entry touching any of `qubits`.
    pub fn invalidate_qubits<'a, I>(&mut self, qubits: I) -> usize
    where I: IntoIterator<Item = &'a QubitId>
    {
        self.touching(qubits).into_iter()
            .filter(|id| self.remove(*id).is_some())
            .count()
    }

    /// Evict every entry whose stabilizer anti-commutes with `stab`.
    ///
    /// Only entries sharing a qubit with `stab` can anti-commute with it, so
    /// only those buckets are searched.
    pub fn invalidate_anti_commuting(&mut self, stab: &Stabilizer) -> usize {
        let doomed: Vec<EntryId>
            = self.touching(stab.qubits())
            .into_iter()
            .filter(|id| {
                self.entries.get(id)
                    .is_some_and(|entry| entry.stabilizer.anti_commutes(stab))
            })
            .collect();
        doomed.into_iter()
            .filter(|id| self.remove(*id).is_some())
            .count()
    }

    fn touching<'a, I>(&self, qubits: I) -> FxHashSet<EntryId>
    where I: IntoIterator<Item = &'a QubitId>
    {
        qubits.into_iter()
            .filter_map(|q| self.buckets.get(q))
            .flatten()
            .copied()
            .collect()
    }

    /// Check that every entry is filed exactly once under each of its qubits
    /// and that every bucket only refers to live entries that touch it.
    pub fn is_consistent(&self) -> bool {
        let filed_everywhere
            = self.entries.iter()
            .all(|(id, entry)| {
                entry.stabilizer.qubits().iter()
                    .all(|q| {
                        self.buckets.get(q)
                            .is_some_and(|ids| {
                                ids.iter().filter(|other| *other == id).count() == 1
                            })
                    })
            });
        let nothing_dangling
            = self.buckets.iter()
            .all(|(q, ids)| {
                ids.iter()
                    .all(|id| {
                        self.entries.get(id)
                            .is_some_and(|entry| entry.stabilizer.touches(*q))
                    })
            });
        filed_everywhere && nothing_dangling
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn qs(idx: &[usize]) -> Vec<QubitId> {
        idx.iter().copied().map(QubitId::new).collect()
    }

    fn stab(idx: &[usize], word: &str) -> Stabilizer {
        Stabilizer::parse(qs(idx), word).unwrap()
    }

    fn index(n: usize) -> CacheIndex {
        let mut index = CacheIndex::new();
        (0..n).for_each(|k| { index.add_qubit(QubitId::new(k)); });
        index
    }

    #[test]
    fn cached_values() {
        assert_eq!(CachedValue::Bit(true).as_bit(), Some(true));
        assert_eq!(CachedValue::Probability(0.0).as_bit(), Some(false));
        assert_eq!(CachedValue::Probability(1.0).as_bit(), Some(true));
        assert_eq!(CachedValue::Probability(0.5).as_bit(), None);
        assert_eq!(CachedValue::Bit(false).as_probability(), 0.0);
        assert_eq!(CachedValue::Probability(0.5).as_probability(), 0.5);
    }

    #[test]
    fn insert_files_under_every_qubit() {
        let mut idx = index(4);
        let s = stab(&[2, 0, 3], "XIZ");
        let id = idx.insert(s.clone(), CachedValue::Bit(true)).unwrap();
        for q in qs(&[0, 2, 3]) {
            assert_eq!(idx.bucket(q), Some([id].as_slice()));
        }
        assert!(idx.bucket(QubitId::new(1)).unwrap().is_empty());
        assert_eq!(idx.lookup(&s).map(|e| e.value), Some(CachedValue::Bit(true)));
        assert!(idx.is_consistent());
    }

    #[test]
    fn lookup_is_structural() {
        let mut idx = index(2);
        idx.insert(stab(&[0, 1], "XZ"), CachedValue::Bit(false)).unwrap();
        assert!(idx.lookup(&stab(&[0, 1], "XZ")).is_some());
        assert!(idx.lookup(&stab(&[1, 0], "ZX")).is_none());
        assert!(idx.lookup(&stab(&[0, 1], "-XZ")).is_none());
        assert!(idx.lookup(&stab(&[0], "X")).is_none());
    }

    #[test]
    fn insert_replaces_same_key() {
        let mut idx = index(2);
        let s = stab(&[0, 1], "ZZ");
        let a = idx.insert(s.clone(), CachedValue::Probability(0.5)).unwrap();
        let b = idx.insert(s.clone(), CachedValue::Bit(true)).unwrap();
        assert_ne!(a, b);
        assert_eq!(idx.len(), 1);
        assert!(idx.get(a).is_none());
        assert_eq!(idx.lookup(&s).map(|e| e.value), Some(CachedValue::Bit(true)));
        assert!(idx.is_consistent());
    }

    #[test]
    fn insert_is_atomic() {
        let mut idx = index(2);
        let err = idx.insert(stab(&[0, 5, 1], "ZZZ"), CachedValue::Bit(true));
        assert_eq!(err, Err(SimError::UnknownQubit(QubitId::new(5))));
        assert!(idx.is_empty());
        assert!(idx.bucket(QubitId::new(0)).unwrap().is_empty());
        assert!(idx.bucket(QubitId::new(1)).unwrap().is_empty());
    }

    #[test]
    fn invalidate_qubit_reaches_all_buckets() {
        let mut idx = index(4);
        idx.insert(stab(&[0, 1], "ZZ"), CachedValue::Bit(false)).unwrap();
        idx.insert(stab(&[1, 2], "XX"), CachedValue::Bit(false)).unwrap();
        idx.insert(stab(&[3], "Z"), CachedValue::Bit(false)).unwrap();
        assert_eq!(idx.invalidate_qubit(QubitId::new(1)), 2);
        assert_eq!(idx.len(), 1);
        for q in qs(&[0, 1, 2]) {
            assert!(idx.bucket(q).unwrap().is_empty());
        }
        assert!(idx.is_consistent());
        assert_eq!(idx.invalidate_qubits(&qs(&[0, 3])), 1);
        assert!(idx.is_empty());
    }

    #[test]
    fn invalidate_anti_commuting_only() {
        let mut idx = index(3);
        idx.insert(stab(&[0, 1], "ZZ"), CachedValue::Bit(false)).unwrap();
        idx.insert(stab(&[0], "X"), CachedValue::Bit(false)).unwrap();
        idx.insert(stab(&[1, 2], "XX"), CachedValue::Bit(false)).unwrap();
        let evicted = idx.invalidate_anti_commuting(&stab(&[0, 2], "ZZ"));
        // X0 and X1X2 anti-commute with Z0Z2; Z0Z1 doesn't
        assert_eq!(evicted, 2);
        assert!(idx.lookup(&stab(&[0, 1], "ZZ")).is_some());
        assert!(idx.is_consistent());
    }

    #[test]
    fn remove_qubit_drops_bucket() {
        let mut idx = index(2);
        idx.insert(stab(&[0, 1], "ZZ"), CachedValue::Bit(false)).unwrap();
        assert_eq!(idx.remove_qubit(QubitId::new(0)), 1);
        assert!(!idx.contains_qubit(QubitId::new(0)));
        assert!(idx.contains_qubit(QubitId::new(1)));
        assert_eq!(idx.num_qubits(), 1);
        assert!(idx.is_empty());
        assert!(idx.is_consistent());
        assert!(idx.add_qubit(QubitId::new(0)));
        assert!(!idx.add_qubit(QubitId::new(0)));
    }
}
