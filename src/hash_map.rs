use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table::Bucket;
use crate::hash_table::Drain;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::hash_table::Iter;
use crate::hasher::BucketHasher;
use crate::hasher::Polynomial31;

/// A string-keyed hash map using separate chaining.
///
/// `HashMap<V, H>` stores values under non-empty string keys. Keys are
/// spread over a bucket array by a [`BucketHasher`] `H` (by default the
/// base-31 [`Polynomial31`]); keys landing in the same bucket form a chain
/// kept in insertion order. Once the share of occupied buckets reaches the
/// configured load factor (0.75 by default) the bucket array doubles and
/// entries are relocated.
///
/// Iteration visits buckets in ascending index order and each chain in
/// insertion order. That order is stable for a fixed history of operations,
/// but it is not sorted and changes when the table grows.
///
/// # Examples
///
/// ```rust
/// use chain_map::HashMap;
///
/// let mut map = HashMap::new();
/// map.set("a", "first").unwrap();
/// map.set("ab", "second").unwrap();
///
/// assert_eq!(map.get("ab"), Some(("ab", &"second")));
/// assert!(map.has("a"));
/// assert_eq!(map.keys(), ["a", "ab"]);
///
/// assert!(map.remove("a"));
/// assert!(!map.remove("a"));
/// assert_eq!(map.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashMap<V, H = Polynomial31> {
    table: HashTable<V>,
    hasher: H,
}

impl<V, H> Debug for HashMap<V, H>
where
    V: Debug,
    H: BucketHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V, H> PartialEq for HashMap<V, H>
where
    V: PartialEq,
    H: BucketHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, value)| other.contains_pair(key, value))
            && other.iter().all(|(key, value)| self.contains_pair(key, value))
    }
}

impl<V> HashMap<V, Polynomial31> {
    /// Creates an empty map with 16 buckets, a 0.75 load factor and the
    /// [`Polynomial31`] hasher.
    pub fn new() -> Self {
        Self::with_hasher(Polynomial31)
    }

    /// Creates an empty map from `config` using the [`Polynomial31`] hasher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails
    /// [`Config::validate`].
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_config_and_hasher(config, Polynomial31)
    }
}

impl<V, H> HashMap<V, H>
where
    H: BucketHasher,
{
    /// Creates an empty map with the default configuration and the given
    /// hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    /// use chain_map::hasher::FoldBucketHasher;
    ///
    /// let mut map = HashMap::with_hasher(FoldBucketHasher::with_seed(7));
    /// map.set("key", 1).unwrap();
    /// assert_eq!(map.get("key"), Some(("key", &1)));
    /// ```
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            table: HashTable::default(),
            hasher,
        }
    }

    /// Creates an empty map from `config` using the given hasher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails
    /// [`Config::validate`].
    pub fn with_config_and_hasher(config: Config, hasher: H) -> Result<Self> {
        Ok(Self {
            table: HashTable::new(config)?,
            hasher,
        })
    }

    /// Returns the configuration the map was created with.
    pub fn config(&self) -> &Config {
        self.table.config()
    }

    /// Returns a reference to the map's hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns the bucket `key` currently hashes to.
    ///
    /// The index depends on the current bucket count, so the same key may
    /// hash differently after the map grows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if `key` is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::Error;
    /// use chain_map::HashMap;
    ///
    /// let map: HashMap<()> = HashMap::new();
    /// assert_eq!(map.hash("a"), Ok(1));
    /// assert_eq!(map.hash("ab"), Ok(1));
    /// assert_eq!(map.hash("abcde"), Ok(3));
    /// assert_eq!(map.hash(""), Err(Error::InvalidKey));
    /// ```
    pub fn hash(&self, key: &str) -> Result<usize> {
        self.bucket_for(key).ok_or(Error::InvalidKey)
    }

    /// Inserts `value` under `key`.
    ///
    /// If the key is already present its value is replaced in place and the
    /// old value is returned; the map does not grow. Otherwise the pair is
    /// appended to the tail of its bucket's chain, which may grow the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if `key` is empty. The map is left
    /// untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::Error;
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.set("a", "old"), Ok(None));
    /// assert_eq!(map.set("a", "new"), Ok(Some("old")));
    /// assert_eq!(map.set("", "never"), Err(Error::InvalidKey));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn set(&mut self, key: &str, value: V) -> Result<Option<V>> {
        let bucket = self.hash(key)?;
        match self.table.entry(bucket, key, &self.hasher) {
            TableEntry::Occupied(mut entry) => {
                Ok(Some(core::mem::replace(entry.get_mut(), value)))
            }
            TableEntry::Vacant(entry) => {
                entry.insert(String::from(key), value);
                Ok(None)
            }
        }
    }

    /// Returns the stored key and value for `key`, or `None` if it is absent.
    ///
    /// An empty key is never present, so it yields `None` rather than
    /// [`Error::InvalidKey`]. Only operations that would hash or store the
    /// key ([`hash`](Self::hash), [`set`](Self::set), [`entry`](Self::entry))
    /// reject it.
    pub fn get(&self, key: &str) -> Option<(&str, &V)> {
        let bucket = self.bucket_for(key)?;
        self.table.find(bucket, key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("count", 1).unwrap();
    /// if let Some(count) = map.get_mut("count") {
    ///     *count += 1;
    /// }
    /// assert_eq!(map.get("count"), Some(("count", &2)));
    /// ```
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let bucket = self.bucket_for(key)?;
        self.table.find_mut(bucket, key)
    }

    /// Returns `true` if `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning `true` if it was present and `false` if the
    /// map was left unchanged.
    ///
    /// An empty key is never present, so removing it returns `false` rather
    /// than [`Error::InvalidKey`].
    pub fn remove(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &str) -> Option<(String, V)> {
        let bucket = self.bucket_for(key)?;
        self.table.remove(bucket, key)
    }

    /// Gets the given key's entry for in-place manipulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if `key` is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut words: HashMap<usize> = HashMap::new();
    /// for word in "the cat saw the dog".split(' ') {
    ///     *words.entry(word).unwrap().or_insert(0) += 1;
    /// }
    /// assert_eq!(words.get("the"), Some(("the", &2)));
    /// assert_eq!(words.get("cat"), Some(("cat", &1)));
    /// ```
    pub fn entry(&mut self, key: impl Into<String>) -> Result<Entry<'_, V, H>> {
        let key = key.into();
        let bucket = self.hash(&key)?;
        let entry = self.table.entry(bucket, &key, &self.hasher);
        Ok(match entry {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        })
    }

    /// Returns the number of stored keys.
    ///
    /// This walks the bucket array and sums chain lengths, so it costs
    /// O(bucket count).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map holds no keys.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Removes every entry and shrinks the bucket array back to its initial
    /// size.
    ///
    /// Calling this on an empty map does nothing, including leaving a grown
    /// bucket array as it is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// for code in b'0'..=b'<' {
    ///     let key = (code as char).to_string();
    ///     map.set(&key, code).unwrap();
    /// }
    /// assert_eq!(map.bucket_count(), 32);
    ///
    /// map.clear();
    /// assert_eq!(map.len(), 0);
    /// assert_eq!(map.bucket_count(), 16);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns every key, in iteration order.
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Returns every value, in iteration order.
    pub fn values(&self) -> Vec<&V> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Returns every key/value pair, in iteration order.
    ///
    /// `entries()[i] == (keys()[i], values()[i])` for every `i`.
    pub fn entries(&self) -> Vec<(&str, &V)> {
        self.iter().collect()
    }

    /// Returns a lazy iterator over the key/value pairs, in the same order as
    /// [`entries`](Self::entries).
    pub fn iter(&self) -> Iter<'_, V> {
        self.table.iter()
    }

    /// Removes every entry, yielding owned pairs in iteration order.
    ///
    /// The map is left as after [`clear`](Self::clear).
    pub fn drain(&mut self) -> Drain<V> {
        self.table.drain()
    }

    /// Returns the current length of the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the number of buckets holding at least one key.
    pub fn occupied_buckets(&self) -> usize {
        self.table.occupied_buckets()
    }

    /// Returns occupied buckets divided by bucket count.
    pub fn load_factor(&self) -> f64 {
        self.occupied_buckets() as f64 / self.bucket_count() as f64
    }

    /// Iterates over the chain stored in bucket `index`, head first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.set("a", 1).unwrap();
    /// map.set("ab", 2).unwrap();
    ///
    /// let chain: Vec<_> = map.bucket(map.hash("a").unwrap()).collect();
    /// assert_eq!(chain, [("a", &1), ("ab", &2)]);
    /// ```
    pub fn bucket(&self, index: usize) -> Bucket<'_, V> {
        self.table.bucket(index)
    }

    /// Computes the chain length histogram.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> crate::hash_table::ChainHistogram {
        self.table.chain_histogram()
    }

    /// Returns bucket and chain utilization statistics.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Checks for a stored `(key, value)` pair. Falls back to a full scan
    /// because whole-chain growth can leave pairs outside their bucket.
    fn contains_pair(&self, key: &str, value: &V) -> bool
    where
        V: PartialEq,
    {
        if self.get(key).is_some_and(|(_, v)| v == value) {
            return true;
        }
        self.iter().any(|(k, v)| k == key && v == value)
    }

    fn bucket_for(&self, key: &str) -> Option<usize> {
        if key.is_empty() {
            return None;
        }
        Some(self.hasher.bucket_index(key, self.table.bucket_count()))
    }
}

impl<V, H> Default for HashMap<V, H>
where
    H: BucketHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<'a, V, H> IntoIterator for &'a HashMap<V, H>
where
    H: BucketHasher,
{
    type IntoIter = Iter<'a, V>;
    type Item = (&'a str, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, V, H> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, V, H>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V, H> Entry<'a, V, H>
where
    H: BucketHasher,
{
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &str {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, V, H> Entry<'a, V, H>
where
    V: Default,
    H: BucketHasher,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, V, H> {
    entry: crate::hash_table::VacantEntry<'a, V, H>,
    key: String,
}

impl<'a, V, H> VacantEntry<'a, V, H>
where
    H: BucketHasher,
{
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> String {
        self.key
    }

    /// Appends the pair to its chain and returns a mutable reference to the
    /// value. The map may grow as a result.
    pub fn insert(self, value: V) -> &'a mut V {
        self.entry.insert(self.key, value)
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, V> {
    entry: crate::hash_table::OccupiedEntry<'a, V>,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &str {
        self.entry.key()
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.entry.get()
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.entry.get_mut()
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        self.entry.into_mut()
    }

    /// Replaces the value in the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.entry.get_mut(), value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (String, V) {
        self.entry.remove()
    }
}
