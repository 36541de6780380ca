use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::Config;
use crate::config::RehashMode;
use crate::error::Result;
use crate::hasher::BucketHasher;

#[derive(Clone)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Clone)]
enum Slot<V> {
    Occupied(Node<V>),
    Vacant { next_free: Option<usize> },
}

/// Handle to a non-empty chain in the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chain {
    head: usize,
    tail: usize,
    len: usize,
}

/// Per-bucket chain length statistics.
///
/// `counts()[n]` is the number of buckets whose chain holds exactly `n`
/// entries, so `counts()[0]` is the number of empty buckets.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    counts: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ChainHistogram {
    /// Bucket counts indexed by chain length.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Length of the longest chain.
    pub fn longest(&self) -> usize {
        self.counts.len().saturating_sub(1)
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!("chain histogram ({} buckets):", self.counts.iter().sum::<usize>());
        for (len, &count) in self.counts.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", len, "█".repeat(width), count);
        }
    }
}

/// Utilization statistics for a [`HashTable`].
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    /// Number of entries in the table
    pub entries: usize,
    /// Length of the bucket array
    pub bucket_count: usize,
    /// Number of buckets holding a chain
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Occupied buckets / bucket count, the ratio that drives growth
    pub load_factor: f64,
    /// Entries / occupied buckets
    pub mean_chain_length: f64,
    /// Node slots allocated in the arena, including free ones
    pub arena_slots: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Buckets: {}/{} occupied ({:.2}% load factor)",
            self.occupied_buckets,
            self.bucket_count,
            self.load_factor * 100.0
        );
        println!(
            "Chains: {} entries, mean length {:.2}, longest {}",
            self.entries, self.mean_chain_length, self.longest_chain
        );
        println!(
            "Arena: {}/{} slots live",
            self.entries, self.arena_slots
        );
    }
}

/// A separate-chaining table addressed by precomputed bucket index.
///
/// `HashTable<V>` owns the bucket array and the chain nodes. It does not hash
/// keys itself: callers pass the bucket index for every lookup, and pass a
/// [`BucketHasher`] when inserting so the table can relocate entries when it
/// grows. [`HashMap`](crate::HashMap) is the keyed wrapper most users want.
///
/// Nodes live in a single arena and are linked by index in both directions.
/// Each bucket stores only the head, tail and length of its chain, so
/// relocating entries on growth relinks indices without moving any node.
///
/// ## Example
///
/// ```rust
/// use chain_map::Config;
/// use chain_map::hash_table::Entry;
/// use chain_map::hash_table::HashTable;
/// use chain_map::hasher::BucketHasher;
/// use chain_map::hasher::Polynomial31;
///
/// let mut table = HashTable::new(Config::default().initial_buckets(8)).unwrap();
/// let bucket = Polynomial31.bucket_index("key", table.bucket_count());
///
/// match table.entry(bucket, "key", &Polynomial31) {
///     Entry::Vacant(entry) => {
///         entry.insert("key".to_string(), 7);
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(bucket, "key"), Some(("key", &7)));
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    buckets: Vec<Option<Chain>>,
    slots: Vec<Slot<V>>,
    free_head: Option<usize>,
    occupied: usize,
    config: Config,
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::with_valid_config(Config::default())
    }
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let chains = self
            .buckets
            .iter()
            .enumerate()
            .filter(|(_, chain)| chain.is_some())
            .map(|(index, _)| (index, self.bucket(index).map(|(k, _)| k).collect::<Vec<_>>()))
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("chains", &chains)
            .field("occupied", &self.occupied)
            .field("bucket_count", &self.buckets.len())
            .field("rehash", &self.config.rehash)
            .finish()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with `config.initial_buckets` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// configuration does not pass [`Config::validate`].
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: Config) -> Self {
        Self {
            buckets: vec![None; config.initial_buckets],
            slots: Vec::new(),
            free_head: None,
            occupied: 0,
            config,
        }
    }

    /// Returns the configuration the table was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current length of the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of buckets holding a chain.
    pub fn occupied_buckets(&self) -> usize {
        self.occupied
    }

    /// Returns the number of entries, summing chain lengths over every
    /// bucket.
    pub fn len(&self) -> usize {
        self.buckets.iter().flatten().map(|chain| chain.len).sum()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Finds `key` in the chain at `bucket`.
    ///
    /// Out-of-range buckets are treated as empty.
    pub fn find(&self, bucket: usize, key: &str) -> Option<(&str, &V)> {
        self.find_slot(bucket, key).map(|slot| {
            let node = self.node(slot);
            (node.key.as_str(), &node.value)
        })
    }

    /// Finds `key` in the chain at `bucket`, returning a mutable reference to
    /// its value.
    pub fn find_mut(&mut self, bucket: usize, key: &str) -> Option<&mut V> {
        let slot = self.find_slot(bucket, key)?;
        Some(&mut self.node_mut(slot).value)
    }

    /// Gets the entry for `key` in the chain at `bucket`.
    ///
    /// `hasher` must be the hasher that produced `bucket`; inserting through
    /// a [`VacantEntry`] may grow the table, which rehashes every key with it.
    ///
    /// # Panics
    ///
    /// Panics if `bucket` is out of range.
    pub fn entry<'a, H>(&'a mut self, bucket: usize, key: &str, hasher: &'a H) -> Entry<'a, V, H>
    where
        H: BucketHasher,
    {
        assert!(
            bucket < self.buckets.len(),
            "bucket {bucket} out of range for {} buckets",
            self.buckets.len()
        );

        match self.find_slot(bucket, key) {
            Some(slot) => Entry::Occupied(OccupiedEntry {
                table: self,
                bucket,
                slot,
            }),
            None => Entry::Vacant(VacantEntry {
                table: self,
                bucket,
                hasher,
            }),
        }
    }

    /// Removes `key` from the chain at `bucket`, returning the stored pair.
    pub fn remove(&mut self, bucket: usize, key: &str) -> Option<(String, V)> {
        let slot = self.find_slot(bucket, key)?;
        Some(self.remove_slot(bucket, slot))
    }

    /// Removes every entry and resets the bucket array to the initial bucket
    /// count. Does nothing if the table is already empty, so a table that
    /// grew and was then emptied by removals keeps its larger array.
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        self.reset();
    }

    /// Iterates over all entries, buckets in ascending order and each chain
    /// from head to tail.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            table: self,
            bucket_index: 0,
            cursor: None,
        }
    }

    /// Iterates over the chain stored at `index`, head first.
    ///
    /// Yields nothing for an unoccupied or out-of-range bucket.
    pub fn bucket(&self, index: usize) -> Bucket<'_, V> {
        Bucket {
            table: self,
            cursor: self.buckets.get(index).copied().flatten().map(|c| c.head),
        }
    }

    /// Removes every entry, yielding them in [`iter`](Self::iter) order.
    ///
    /// The table is left as after [`clear`](Self::clear).
    pub fn drain(&mut self) -> Drain<V> {
        if self.is_empty() {
            return Drain {
                inner: Vec::new().into_iter(),
            };
        }

        let order = self.iter_slots().collect::<Vec<_>>();
        let mut nodes = core::mem::take(&mut self.slots)
            .into_iter()
            .map(|slot| match slot {
                Slot::Occupied(node) => Some(node),
                Slot::Vacant { .. } => None,
            })
            .collect::<Vec<_>>();
        let drained = order
            .into_iter()
            .filter_map(|slot| nodes[slot].take())
            .map(|node| (node.key, node.value))
            .collect::<Vec<_>>();

        self.reset();
        Drain {
            inner: drained.into_iter(),
        }
    }

    /// Computes the chain length histogram.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> ChainHistogram {
        let mut counts = vec![0usize; 1];
        for chain in self.buckets.iter() {
            let len = chain.map_or(0, |c| c.len);
            if len >= counts.len() {
                counts.resize(len + 1, 0);
            }
            counts[len] += 1;
        }
        ChainHistogram { counts }
    }

    /// Returns utilization statistics for debugging and tuning.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        let entries = self.len();
        DebugStats {
            entries,
            bucket_count: self.buckets.len(),
            occupied_buckets: self.occupied,
            longest_chain: self.buckets.iter().flatten().map(|c| c.len).max().unwrap_or(0),
            load_factor: self.occupied as f64 / self.buckets.len() as f64,
            mean_chain_length: if self.occupied == 0 {
                0.0
            } else {
                entries as f64 / self.occupied as f64
            },
            arena_slots: self.slots.len(),
        }
    }

    fn node(&self, slot: usize) -> &Node<V> {
        match &self.slots[slot] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links to vacant slot {slot}"),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<V> {
        match &mut self.slots[slot] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links to vacant slot {slot}"),
        }
    }

    fn find_slot(&self, bucket: usize, key: &str) -> Option<usize> {
        let chain = self.buckets.get(bucket).copied().flatten()?;
        let mut cursor = Some(chain.head);
        while let Some(slot) = cursor {
            let node = self.node(slot);
            if node.key == key {
                return Some(slot);
            }
            cursor = node.next;
        }
        None
    }

    fn iter_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().flatten().flat_map(move |chain| {
            core::iter::successors(Some(chain.head), move |&slot| self.node(slot).next)
        })
    }

    fn allocate(&mut self, node: Node<V>) -> usize {
        match self.free_head {
            Some(slot) => {
                self.free_head = match &self.slots[slot] {
                    Slot::Vacant { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!("free list points at occupied slot {slot}"),
                };
                self.slots[slot] = Slot::Occupied(node);
                slot
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Node<V> {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match core::mem::replace(&mut self.slots[slot], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(slot);
                node
            }
            Slot::Vacant { .. } => unreachable!("released vacant slot {slot}"),
        }
    }

    /// Appends the node at `slot` to the tail of the chain at `bucket`.
    fn link_tail(&mut self, bucket: usize, slot: usize) {
        let current = self.buckets[bucket];
        match current {
            Some(mut chain) => {
                self.node_mut(chain.tail).next = Some(slot);
                let node = self.node_mut(slot);
                node.prev = Some(chain.tail);
                node.next = None;
                chain.tail = slot;
                chain.len += 1;
                self.buckets[bucket] = Some(chain);
            }
            None => {
                let node = self.node_mut(slot);
                node.prev = None;
                node.next = None;
                self.buckets[bucket] = Some(Chain {
                    head: slot,
                    tail: slot,
                    len: 1,
                });
                self.occupied += 1;
            }
        }
    }

    /// Appends a whole detached chain to the chain at `bucket`.
    fn splice_tail(&mut self, bucket: usize, chain: Chain) {
        let current = self.buckets[bucket];
        match current {
            Some(mut existing) => {
                self.node_mut(existing.tail).next = Some(chain.head);
                self.node_mut(chain.head).prev = Some(existing.tail);
                existing.tail = chain.tail;
                existing.len += chain.len;
                self.buckets[bucket] = Some(existing);
            }
            None => {
                self.buckets[bucket] = Some(chain);
                self.occupied += 1;
            }
        }
    }

    fn unlink(&mut self, bucket: usize, slot: usize) {
        let current = self.buckets[bucket];
        let Some(mut chain) = current else {
            unreachable!("unlinking slot {slot} from empty bucket {bucket}");
        };

        chain.len -= 1;
        if chain.len == 0 {
            self.buckets[bucket] = None;
            self.occupied -= 1;
            return;
        }

        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };

        match (prev, next) {
            (None, Some(next)) => {
                self.node_mut(next).prev = None;
                chain.head = next;
            }
            (Some(prev), None) => {
                self.node_mut(prev).next = None;
                chain.tail = prev;
            }
            (Some(prev), Some(next)) => {
                self.node_mut(prev).next = Some(next);
                self.node_mut(next).prev = Some(prev);
            }
            (None, None) => unreachable!("detached node in a chain of {} entries", chain.len + 1),
        }
        self.buckets[bucket] = Some(chain);
    }

    fn remove_slot(&mut self, bucket: usize, slot: usize) -> (String, V) {
        self.unlink(bucket, slot);
        let node = self.release(slot);
        if self.occupied == 0 {
            self.slots.clear();
            self.free_head = None;
        }
        (node.key, node.value)
    }

    fn reset(&mut self) {
        log::trace!(
            "resetting {} buckets to {}",
            self.buckets.len(),
            self.config.initial_buckets
        );
        self.buckets = vec![None; self.config.initial_buckets];
        self.slots.clear();
        self.free_head = None;
        self.occupied = 0;
    }

    #[inline]
    fn maybe_grow<H: BucketHasher>(&mut self, hasher: &H) {
        if self.occupied as f64 / self.buckets.len() as f64 >= self.config.load_factor {
            self.grow(hasher);
        }
    }

    #[cold]
    fn grow<H: BucketHasher>(&mut self, hasher: &H) {
        let old_count = self.buckets.len();
        let Some(new_count) = old_count.checked_mul(2) else {
            log::warn!("bucket array of {old_count} buckets cannot double, skipping growth");
            return;
        };

        let old_buckets = core::mem::replace(&mut self.buckets, vec![None; new_count]);
        self.occupied = 0;

        match self.config.rehash {
            RehashMode::PerEntry => {
                for chain in old_buckets.into_iter().flatten() {
                    let mut cursor = Some(chain.head);
                    while let Some(slot) = cursor {
                        cursor = self.node(slot).next;
                        let bucket = hasher.bucket_index(&self.node(slot).key, new_count);
                        debug_assert!(bucket < new_count);
                        self.link_tail(bucket, slot);
                    }
                }
            }
            RehashMode::WholeChain => {
                for chain in old_buckets.into_iter().flatten() {
                    let bucket = hasher.bucket_index(&self.node(chain.head).key, new_count);
                    debug_assert!(bucket < new_count);
                    self.splice_tail(bucket, chain);
                }
            }
        }

        log::debug!(
            "grew bucket array from {old_count} to {new_count} ({:?}, {} buckets occupied)",
            self.config.rehash,
            self.occupied
        );
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V, H> {
    /// The key is not present in the chain
    Vacant(VacantEntry<'a, V, H>),
    /// The key is present in the chain
    Occupied(OccupiedEntry<'a, V>),
}

/// A view into a vacant entry in the hash table, created by [`entry`] when
/// the key is absent from its chain.
///
/// [`entry`]: HashTable::entry
pub struct VacantEntry<'a, V, H> {
    table: &'a mut HashTable<V>,
    bucket: usize,
    hasher: &'a H,
}

impl<'a, V, H> VacantEntry<'a, V, H>
where
    H: BucketHasher,
{
    /// Returns the bucket the entry will be appended to.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Appends `(key, value)` to the tail of the chain and returns a mutable
    /// reference to the value.
    ///
    /// `key` must be the key the entry was looked up with. If the insertion
    /// pushes the occupied-bucket ratio to the load factor, the table grows
    /// before this returns.
    pub fn insert(self, key: String, value: V) -> &'a mut V {
        let VacantEntry {
            table,
            bucket,
            hasher,
        } = self;

        if table.buckets[bucket].is_none() {
            log::trace!("starting chain in bucket {bucket}");
        }

        let slot = table.allocate(Node {
            key,
            value,
            prev: None,
            next: None,
        });
        table.link_tail(bucket, slot);
        table.maybe_grow(hasher);

        &mut table.node_mut(slot).value
    }
}

/// A view into an occupied entry in the hash table, created by [`entry`]
/// when the key is present in its chain.
///
/// [`entry`]: HashTable::entry
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    bucket: usize,
    slot: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets the stored key.
    pub fn key(&self) -> &str {
        &self.table.node(self.slot).key
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.table.node(self.slot).value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.node_mut(self.slot).value
    }

    /// Converts the entry into a mutable reference to the value with the
    /// table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { table, slot, .. } = self;
        &mut table.node_mut(slot).value
    }

    /// Unlinks the entry from its chain and returns the stored pair.
    pub fn remove(self) -> (String, V) {
        self.table.remove_slot(self.bucket, self.slot)
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    table: &'a HashTable<V>,
    bucket_index: usize,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.cursor {
                let node = self.table.node(slot);
                self.cursor = node.next;
                return Some((node.key.as_str(), &node.value));
            }

            let chain = *self.table.buckets.get(self.bucket_index)?;
            self.bucket_index += 1;
            self.cursor = chain.map(|c| c.head);
        }
    }
}

/// An iterator over a single chain.
///
/// This struct is created by the [`bucket`] method on [`HashTable`].
///
/// [`bucket`]: HashTable::bucket
pub struct Bucket<'a, V> {
    table: &'a HashTable<V>,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Bucket<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.table.node(self.cursor?);
        self.cursor = node.next;
        Some((node.key.as_str(), &node.value))
    }
}

/// A draining iterator over the entries of a [`HashTable`], created by the
/// [`drain`] method.
///
/// The table is already empty by the time this is returned; dropping it
/// early drops the remaining entries.
///
/// [`drain`]: HashTable::drain
pub struct Drain<V> {
    inner: vec::IntoIter<(String, V)>,
}

impl<V> Iterator for Drain<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Drain<V> {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;
    use crate::hasher::Polynomial31;

    fn insert<V, H: BucketHasher>(table: &mut HashTable<V>, hasher: &H, key: &str, value: V) {
        let bucket = hasher.bucket_index(key, table.bucket_count());
        match table.entry(bucket, key, hasher) {
            Entry::Vacant(entry) => {
                entry.insert(key.to_string(), value);
            }
            Entry::Occupied(mut entry) => {
                *entry.get_mut() = value;
            }
        }
    }

    fn lookup<'t, V, H: BucketHasher>(
        table: &'t HashTable<V>,
        hasher: &H,
        key: &str,
    ) -> Option<&'t V> {
        let bucket = hasher.bucket_index(key, table.bucket_count());
        table.find(bucket, key).map(|(_, v)| v)
    }

    fn chain_keys<V>(table: &HashTable<V>, index: usize) -> Vec<&str> {
        table.bucket(index).map(|(k, _)| k).collect()
    }

    #[test]
    fn insert_and_find() {
        let mut table = HashTable::default();
        for (i, key) in ["a", "ab", "abcde", "hello", "world"].iter().enumerate() {
            insert(&mut table, &Polynomial31, key, i);
            assert_eq!(lookup(&table, &Polynomial31, key), Some(&i), "{:#?}", table);
        }
        assert_eq!(table.len(), 5);
        assert_eq!(lookup(&table, &Polynomial31, "missing"), None);
    }

    #[test]
    fn colliding_keys_chain_in_insertion_order() {
        let mut table = HashTable::default();
        insert(&mut table, &Polynomial31, "a", 1);
        insert(&mut table, &Polynomial31, "ab", 2);
        insert(&mut table, &Polynomial31, "pa", 3);

        assert_eq!(table.occupied_buckets(), 1);
        assert_eq!(chain_keys(&table, 1), vec!["a", "ab", "pa"]);
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let mut table = HashTable::default();
        insert(&mut table, &Polynomial31, "a", 1);

        let bucket = Polynomial31.bucket_index("a", table.bucket_count());
        match table.entry(bucket, "a", &Polynomial31) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), "a");
                assert_eq!(entry.get(), &1);
                *entry.get_mut() = 10;
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }
        assert_eq!(table.len(), 1);
        assert_eq!(lookup(&table, &Polynomial31, "a"), Some(&10));
    }

    #[test]
    fn explicit_collision() {
        let zero = |_: &str, _: usize| 0usize;
        let mut table = HashTable::default();
        for k in 0..65 {
            insert(&mut table, &zero, &k.to_string(), k);
        }

        assert_eq!(table.len(), 65);
        assert_eq!(table.occupied_buckets(), 1);
        assert_eq!(table.bucket_count(), 16);
        for k in 0..65 {
            assert_eq!(lookup(&table, &zero, &k.to_string()), Some(&k), "{:#?}", table);
        }
    }

    #[test]
    fn remove_head_middle_and_tail() {
        let zero = |_: &str, _: usize| 0usize;
        let mut table = HashTable::default();
        for key in ["a", "b", "c", "d", "e"] {
            insert(&mut table, &zero, key, key.to_string());
        }

        assert_eq!(table.remove(0, "a"), Some(("a".to_string(), "a".to_string())));
        assert_eq!(chain_keys(&table, 0), vec!["b", "c", "d", "e"]);

        assert_eq!(table.remove(0, "c").map(|(k, _)| k), Some("c".to_string()));
        assert_eq!(chain_keys(&table, 0), vec!["b", "d", "e"]);

        assert_eq!(table.remove(0, "e").map(|(k, _)| k), Some("e".to_string()));
        assert_eq!(chain_keys(&table, 0), vec!["b", "d"]);

        assert_eq!(table.remove(0, "e"), None);
        assert_eq!(table.len(), 2);

        // Appending after a tail removal must link from the new tail.
        insert(&mut table, &zero, "f", "f".to_string());
        assert_eq!(chain_keys(&table, 0), vec!["b", "d", "f"]);
    }

    #[test]
    fn removing_last_entry_empties_bucket() {
        let mut table = HashTable::default();
        insert(&mut table, &Polynomial31, "abcde", 5);
        assert_eq!(table.occupied_buckets(), 1);

        assert!(table.remove(3, "abcde").is_some());
        assert_eq!(table.occupied_buckets(), 0);
        assert!(table.is_empty());
        assert_eq!(table.bucket(3).count(), 0);
    }

    #[test]
    fn freed_slots_are_reused() {
        let zero = |_: &str, _: usize| 0usize;
        let mut table = HashTable::default();
        for key in ["a", "b", "c"] {
            insert(&mut table, &zero, key, 0);
        }
        table.remove(0, "b");
        insert(&mut table, &zero, "d", 0);

        assert_eq!(table.slots.len(), 3);
        assert_eq!(chain_keys(&table, 0), vec!["a", "c", "d"]);
    }

    #[test]
    fn remove_out_of_range_bucket_is_none() {
        let mut table: HashTable<i32> = HashTable::default();
        assert_eq!(table.remove(1000, "a"), None);
        assert_eq!(table.find(1000, "a"), None);
        assert_eq!(table.bucket(1000).count(), 0);
    }

    #[test]
    fn grows_when_load_factor_reached() {
        let mut table = HashTable::default();
        for code in 48u8..60 {
            let key = (code as char).to_string();
            insert(&mut table, &Polynomial31, &key, code);
            if code < 59 {
                assert_eq!(table.bucket_count(), 16);
            }
        }

        // The twelfth distinct bucket makes 12/16 = 0.75 occupied.
        assert_eq!(table.bucket_count(), 32);
        assert_eq!(table.occupied_buckets(), 12);
        assert_eq!(table.len(), 12);
        for code in 48u8..60 {
            let key = (code as char).to_string();
            assert_eq!(chain_keys(&table, code as usize % 32), vec![key.as_str()]);
        }
    }

    #[test]
    fn chain_extension_does_not_grow() {
        let zero = |_: &str, _: usize| 0usize;
        let config = Config::default().initial_buckets(2).load_factor(0.75);
        let mut table = HashTable::new(config).unwrap();
        for k in 0..10 {
            insert(&mut table, &zero, &k.to_string(), k);
        }
        assert_eq!(table.bucket_count(), 2);
    }

    #[test]
    fn new_rejects_invalid_config() {
        for config in [
            Config::default().initial_buckets(0),
            Config::default().load_factor(0.0),
            Config::default().load_factor(f64::NAN),
        ] {
            let result = HashTable::<i32>::new(config);
            assert!(
                matches!(result, Err(crate::Error::InvalidConfig(_))),
                "{:#?}",
                result
            );
        }

        let table = HashTable::<i32>::new(Config::default().initial_buckets(3)).unwrap();
        assert_eq!(table.bucket_count(), 3);
    }

    #[test]
    fn per_entry_rehash_disperses_chains() {
        let config = Config::default()
            .initial_buckets(4)
            .rehash(RehashMode::PerEntry);
        let mut table = HashTable::new(config).unwrap();

        // 'a' (97) and 'e' (101) share bucket 1 of 4.
        insert(&mut table, &Polynomial31, "a", 1);
        insert(&mut table, &Polynomial31, "e", 2);
        insert(&mut table, &Polynomial31, "b", 3);
        assert_eq!(table.bucket_count(), 4);
        insert(&mut table, &Polynomial31, "c", 4);

        assert_eq!(table.bucket_count(), 8);
        assert_eq!(table.occupied_buckets(), 4);
        assert_eq!(chain_keys(&table, 1), vec!["a"]);
        assert_eq!(chain_keys(&table, 5), vec!["e"]);
        for (key, value) in [("a", 1), ("e", 2), ("b", 3), ("c", 4)] {
            assert_eq!(lookup(&table, &Polynomial31, key), Some(&value));
        }
    }

    #[test]
    fn per_entry_rehash_keeps_relative_order() {
        // Hash on the first byte only so the chain survives growth intact.
        let first = |key: &str, n: usize| key.as_bytes()[0] as usize % n;
        let config = Config::default().initial_buckets(2).load_factor(1.0);
        let mut table = HashTable::new(config).unwrap();

        for key in ["a1", "a2", "a3"] {
            insert(&mut table, &first, key, ());
        }
        assert_eq!(table.bucket_count(), 2);
        insert(&mut table, &first, "b1", ());

        assert_eq!(table.bucket_count(), 4);
        assert_eq!(chain_keys(&table, 97 % 4), vec!["a1", "a2", "a3"]);
        assert_eq!(chain_keys(&table, 98 % 4), vec!["b1"]);
    }

    #[test]
    fn whole_chain_rehash_strands_later_entries() {
        let config = Config::default()
            .initial_buckets(4)
            .rehash(RehashMode::WholeChain);
        let mut table = HashTable::new(config).unwrap();

        insert(&mut table, &Polynomial31, "a", 1);
        insert(&mut table, &Polynomial31, "e", 2);
        insert(&mut table, &Polynomial31, "b", 3);
        insert(&mut table, &Polynomial31, "c", 4);

        assert_eq!(table.bucket_count(), 8);
        assert_eq!(table.occupied_buckets(), 3);
        // The chain moved as a unit to the head key's new bucket.
        assert_eq!(chain_keys(&table, 1), vec!["a", "e"]);

        // 'e' now hashes to bucket 5 and can no longer be found...
        assert_eq!(Polynomial31.bucket_index("e", 8), 5);
        assert_eq!(lookup(&table, &Polynomial31, "e"), None);
        // ...but it is neither lost nor duplicated.
        assert_eq!(table.len(), 4);
        assert_eq!(table.iter().filter(|(k, _)| *k == "e").count(), 1);
    }

    #[test]
    fn whole_chain_rehash_merges_chains_landing_together() {
        // Everything lands in bucket 0 once the table has grown.
        let hasher = |key: &str, n: usize| if n > 2 { 0 } else { key.len() % n };
        let config = Config::default()
            .initial_buckets(2)
            .load_factor(1.0)
            .rehash(RehashMode::WholeChain);
        let mut table = HashTable::new(config).unwrap();

        insert(&mut table, &hasher, "aa", 1);
        insert(&mut table, &hasher, "bb", 2);
        insert(&mut table, &hasher, "c", 3);

        assert_eq!(table.bucket_count(), 4);
        assert_eq!(table.occupied_buckets(), 1);
        assert_eq!(chain_keys(&table, 0), vec!["aa", "bb", "c"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn iter_visits_buckets_in_order() {
        let mut table = HashTable::default();
        // Buckets: "c" -> 3, "a" -> 1, "ab" -> 1.
        insert(&mut table, &Polynomial31, "c", 3);
        insert(&mut table, &Polynomial31, "a", 1);
        insert(&mut table, &Polynomial31, "ab", 2);

        let collected = table.iter().map(|(k, v)| (k, *v)).collect::<Vec<_>>();
        assert_eq!(collected, vec![("a", 1), ("ab", 2), ("c", 3)]);
    }

    #[test]
    fn clear_resets_to_initial_buckets() {
        let mut table = HashTable::default();
        for code in 48u8..=60 {
            insert(&mut table, &Polynomial31, &(code as char).to_string(), code);
        }
        assert_eq!(table.bucket_count(), 32);

        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.bucket_count(), 16);
        assert_eq!(table.occupied_buckets(), 0);
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn clear_on_empty_keeps_bucket_count() {
        let mut table = HashTable::default();
        for code in 48u8..=60 {
            insert(&mut table, &Polynomial31, &(code as char).to_string(), code);
        }
        for code in 48u8..=60 {
            let key = (code as char).to_string();
            let bucket = Polynomial31.bucket_index(&key, table.bucket_count());
            assert!(table.remove(bucket, &key).is_some());
        }

        table.clear();
        assert_eq!(table.bucket_count(), 32);
    }

    #[test]
    fn drain_yields_iteration_order_and_resets() {
        let mut table = HashTable::default();
        for code in 48u8..=60 {
            insert(&mut table, &Polynomial31, &(code as char).to_string(), code);
        }
        let expected = table
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<Vec<_>>();

        let drain = table.drain();
        assert_eq!(drain.len(), 13);
        assert_eq!(drain.collect::<Vec<_>>(), expected);
        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), 16);
    }

    #[test]
    fn drain_skips_freed_slots() {
        let zero = |_: &str, _: usize| 0usize;
        let mut table = HashTable::default();
        for key in ["a", "b", "c"] {
            insert(&mut table, &zero, key, key.len());
        }
        table.remove(0, "b");

        let drained = table.drain().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(drained, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_clone() {
        let mut original = HashTable::default();
        for (key, value) in [("hello", 1), ("world", 2), ("rust", 3)] {
            insert(&mut original, &Polynomial31, key, value);
        }

        let cloned = original.clone();
        insert(&mut original, &Polynomial31, "hello", 999);

        assert_eq!(lookup(&original, &Polynomial31, "hello"), Some(&999));
        assert_eq!(lookup(&cloned, &Polynomial31, "hello"), Some(&1));
        assert_eq!(cloned.len(), 3);
    }

    #[test]
    fn occupied_entry_remove() {
        let mut table = HashTable::default();
        insert(&mut table, &Polynomial31, "a", 1);
        insert(&mut table, &Polynomial31, "ab", 2);

        match table.entry(1, "a", &Polynomial31) {
            Entry::Occupied(entry) => {
                assert_eq!(entry.remove(), ("a".to_string(), 1));
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }
        assert_eq!(chain_keys(&table, 1), vec!["ab"]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn entry_out_of_range_panics() {
        let mut table: HashTable<i32> = HashTable::default();
        let _ = table.entry(16, "a", &Polynomial31);
    }

    #[cfg(feature = "stats")]
    #[test]
    fn chain_statistics() {
        let mut table = HashTable::default();
        insert(&mut table, &Polynomial31, "a", 1);
        insert(&mut table, &Polynomial31, "ab", 2);
        insert(&mut table, &Polynomial31, "c", 3);

        let histogram = table.chain_histogram();
        assert_eq!(histogram.counts(), &[14, 1, 1]);
        assert_eq!(histogram.longest(), 2);

        let stats = table.debug_stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.occupied_buckets, 2);
        assert_eq!(stats.longest_chain, 2);
        assert_eq!(stats.load_factor, 2.0 / 16.0);
        assert_eq!(stats.mean_chain_length, 1.5);
    }
}
