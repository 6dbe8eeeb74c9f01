//! Error types for the fallible allocation paths.

/// The error returned by [`HashTable::try_reserve`], [`HashTable::try_entry`]
/// and [`HashSet::try_insert`] when the slot array cannot be grown.
///
/// Duplicate inserts and removals of absent values are never errors; they are
/// reported through return values instead.
///
/// [`HashTable::try_reserve`]: crate::HashTable::try_reserve
/// [`HashTable::try_entry`]: crate::HashTable::try_entry
/// [`HashSet::try_insert`]: crate::HashSet::try_insert
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TryReserveError {
    /// The number of slots needed to hold the requested elements does not fit
    /// in a `usize`.
    #[error("capacity overflow: the required slot count does not fit in usize")]
    CapacityOverflow,

    /// The allocator refused to provide memory for the new slot array.
    #[error("memory allocation for the slot array failed")]
    AllocError(#[from] alloc::collections::TryReserveError),
}
