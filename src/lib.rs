#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod error;

pub mod hash_table;

/// A hash set built on the Robin Hood [`HashTable`].
///
/// This module provides a `HashSet` that wraps the `HashTable` and supplies
/// hashing through a configurable `BuildHasher` and equality through `Eq`.
pub mod hash_set;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when a [`HashSet`] is created without an
        /// explicit one.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when a [`HashSet`] is created without an
        /// explicit one.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder hasher builder for builds without `std` or `foldhash`.
        ///
        /// It has no values, so sets must be created with
        /// [`HashSet::with_hasher`] and a hasher of your choice.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}

        #[allow(deprecated)]
        impl core::hash::BuildHasher for DefaultHashBuilder {
            type Hasher = core::hash::SipHasher;

            fn build_hasher(&self) -> Self::Hasher {
                match *self {}
            }
        }
    }
}

pub use error::TryReserveError;
pub use hash_set::HashSet;
pub use hash_table::Cursor;
pub use hash_table::HashTable;
