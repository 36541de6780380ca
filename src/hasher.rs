use crate::error::Error;
use crate::error::Result;

/// Multiplier of the polynomial rolling hash.
pub const POLYNOMIAL_BASE: u128 = 31;

/// Maps a key to a bucket index for a given bucket count.
///
/// Implementations are only called with non-empty keys and a `bucket_count`
/// of at least 1, and must return an index in `0..bucket_count`. The result
/// must be a pure function of `key` and `bucket_count`; the table relies on
/// this to find entries again and to relocate them when it grows.
///
/// Any `Fn(&str, usize) -> usize` closure is a `BucketHasher`, which is
/// convenient for forcing collisions:
///
/// ```rust
/// use chain_map::HashMap;
///
/// let mut map = HashMap::with_hasher(|_: &str, _: usize| 0usize);
/// map.set("a", 1).unwrap();
/// map.set("b", 2).unwrap();
/// assert_eq!(map.occupied_buckets(), 1);
/// assert_eq!(map.bucket(0).count(), 2);
/// ```
pub trait BucketHasher {
    /// Returns the bucket `key` belongs to in an array of `bucket_count`
    /// buckets.
    fn bucket_index(&self, key: &str, bucket_count: usize) -> usize;
}

impl<F> BucketHasher for F
where
    F: Fn(&str, usize) -> usize,
{
    fn bucket_index(&self, key: &str, bucket_count: usize) -> usize {
        self(key, bucket_count)
    }
}

/// Base-31 polynomial rolling hash over UTF-16 code units.
///
/// The running value is reduced modulo the bucket count after every code
/// unit (`h = (31 * h + unit) % bucket_count`), not once at the end, so it
/// stays below the bucket count no matter how long the key is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Polynomial31;

impl BucketHasher for Polynomial31 {
    #[inline]
    fn bucket_index(&self, key: &str, bucket_count: usize) -> usize {
        let modulus = bucket_count as u128;
        key.encode_utf16()
            .fold(0u128, |hash, unit| {
                (POLYNOMIAL_BASE * hash + u128::from(unit)) % modulus
            }) as usize
    }
}

/// Hashes `key` into `0..bucket_count` with [`Polynomial31`].
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] if `key` is empty.
///
/// # Panics
///
/// Panics if `bucket_count` is zero.
///
/// # Examples
///
/// ```rust
/// use chain_map::Error;
/// use chain_map::hasher::hash;
///
/// assert_eq!(hash("a", 16), Ok(1));
/// assert_eq!(hash("abcde", 16), Ok(3));
/// assert_eq!(hash("", 16), Err(Error::InvalidKey));
/// ```
pub fn hash(key: &str, bucket_count: usize) -> Result<usize> {
    assert!(bucket_count > 0, "bucket count must be non-zero");
    if key.is_empty() {
        return Err(Error::InvalidKey);
    }
    Ok(Polynomial31.bucket_index(key, bucket_count))
}

/// A [`BucketHasher`] backed by foldhash, reducing the 64-bit hash modulo the
/// bucket count.
///
/// Disperses keys far better than [`Polynomial31`] for large tables. The seed
/// is fixed at construction, so indices stay stable for the lifetime of the
/// map.
#[cfg(feature = "foldhash")]
#[derive(Debug, Clone)]
pub struct FoldBucketHasher {
    state: foldhash::fast::FixedState,
}

#[cfg(feature = "foldhash")]
impl FoldBucketHasher {
    /// Creates a hasher with an explicit seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: foldhash::fast::FixedState::with_seed(seed),
        }
    }
}

#[cfg(feature = "foldhash")]
impl Default for FoldBucketHasher {
    fn default() -> Self {
        Self {
            state: foldhash::fast::FixedState::default(),
        }
    }
}

#[cfg(feature = "foldhash")]
impl BucketHasher for FoldBucketHasher {
    #[inline]
    fn bucket_index(&self, key: &str, bucket_count: usize) -> usize {
        use core::hash::BuildHasher;

        (self.state.hash_one(key) % bucket_count as u64) as usize
    }
}
