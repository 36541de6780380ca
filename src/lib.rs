#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Table construction parameters and the growth relocation strategy.
pub mod config;

/// The crate's error type.
pub mod error;

/// A string-keyed map using separate chaining.
///
/// This module provides a `HashMap` that wraps the `HashTable`, hashes keys
/// with a configurable [`BucketHasher`] and exposes a key-value interface on
/// top of it.
pub mod hash_map;

/// Bucket-indexed chain storage.
///
/// The `HashTable` stores entries in per-bucket chains and leaves choosing
/// the bucket to the caller. It owns growth and relocation.
pub mod hash_table;

/// Mapping keys to bucket indices.
pub mod hasher;

pub use config::Config;
pub use config::RehashMode;
pub use error::Error;
pub use error::Result;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_table::HashTable;
pub use hasher::BucketHasher;
#[cfg(feature = "foldhash")]
pub use hasher::FoldBucketHasher;
pub use hasher::Polynomial31;
