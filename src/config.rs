use crate::error::Error;
use crate::error::Result;

/// Number of buckets a freshly created (or cleared) table starts with.
pub const DEFAULT_INITIAL_BUCKETS: usize = 16;

/// Ratio of occupied buckets to total buckets at which the table grows.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// How existing entries are relocated when the bucket array doubles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RehashMode {
    /// Every entry is rehashed against the new bucket count and appended to
    /// the tail of its new bucket. Old buckets are visited in ascending order,
    /// so entries that share a bucket keep their relative order.
    #[default]
    PerEntry,
    /// Each chain is moved unsplit to the bucket its head key hashes to under
    /// the new bucket count.
    ///
    /// Entries behind the head keep their old neighbours even when their own
    /// hash now points elsewhere, which makes them unreachable through
    /// lookups while still being counted and iterated.
    WholeChain,
}

/// Construction parameters for a [`HashMap`](crate::HashMap).
///
/// # Examples
///
/// ```rust
/// use chain_map::Config;
/// use chain_map::HashMap;
/// use chain_map::RehashMode;
///
/// let config = Config::default()
///     .initial_buckets(4)
///     .rehash(RehashMode::PerEntry);
/// let map: HashMap<u32> = HashMap::with_config(config).unwrap();
/// assert_eq!(map.bucket_count(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub(crate) initial_buckets: usize,
    pub(crate) load_factor: f64,
    pub(crate) rehash: RehashMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
            load_factor: DEFAULT_LOAD_FACTOR,
            rehash: RehashMode::default(),
        }
    }
}

impl Config {
    /// Sets the bucket count used on creation and after [`clear`].
    ///
    /// [`clear`]: crate::HashMap::clear
    pub fn initial_buckets(mut self, initial_buckets: usize) -> Self {
        self.initial_buckets = initial_buckets;
        self
    }

    /// Sets the occupied-bucket ratio that triggers growth.
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the relocation strategy used on growth.
    pub fn rehash(mut self, rehash: RehashMode) -> Self {
        self.rehash = rehash;
        self
    }

    /// Returns the configured initial bucket count.
    pub fn get_initial_buckets(&self) -> usize {
        self.initial_buckets
    }

    /// Returns the configured growth threshold.
    pub fn get_load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the configured relocation strategy.
    pub fn get_rehash(&self) -> RehashMode {
        self.rehash
    }

    /// Checks that the configuration describes a usable table.
    pub fn validate(&self) -> Result<()> {
        if self.initial_buckets == 0 {
            return Err(Error::InvalidConfig("initial bucket count must be at least 1"));
        }
        // Also rejects NaN.
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(Error::InvalidConfig("load factor must be in (0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.get_initial_buckets(), 16);
        assert_eq!(config.get_load_factor(), 0.75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_rehash_is_per_entry() {
        assert_eq!(RehashMode::default(), RehashMode::PerEntry);
        assert_eq!(Config::default().get_rehash(), RehashMode::PerEntry);
    }

    #[test]
    fn rejects_zero_buckets() {
        let config = Config::default().initial_buckets(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_load_factors() {
        for load_factor in [0.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            let config = Config::default().load_factor(load_factor);
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{load_factor} should be rejected"
            );
        }

        assert!(Config::default().load_factor(1.0).validate().is_ok());
        assert!(Config::default().load_factor(0.01).validate().is_ok());
    }
}
