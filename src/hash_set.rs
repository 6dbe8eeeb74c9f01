use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::error::TryReserveError;
use crate::hash_table::Cursor;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;

/// A set of unique values kept in a Robin Hood [`HashTable`].
///
/// Values are hashed with the set's `BuildHasher` and compared with `Eq`.
/// Inserting a value equal to one already stored is a no-op; use
/// [`replace`](Self::replace) to swap the stored value out.
///
/// # Performance Characteristics
///
/// - **Memory**: one tag byte and one distance byte per slot, plus `T`. At
///   the default density no more than 7 of every 8 slots are occupied.
/// - **Lookups**: a search for an absent value gives up as soon as it reaches
///   a value sitting closer to its own ideal slot than the search is.
/// - **Removal**: backward shifting, so heavy insert/remove churn does not
///   slow later lookups down.
#[derive(Clone)]
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: HashTable<T>,
    hash_builder: S,
}

impl<T, S> PartialEq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> Debug for HashSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.table.iter()).finish()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty set that hashes with `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::hash::RandomState;
    ///
    /// use robin_hash::hash_set::HashSet;
    ///
    /// let mut words = HashSet::with_hasher(RandomState::new());
    /// words.insert("robin");
    /// assert!(words.contains(&"robin"));
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty set that hashes with `hash_builder` and holds
    /// `capacity` values before its first growth.
    ///
    /// The slot count is a power of two, so [`capacity`](Self::capacity) may
    /// come out larger than asked for.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// The hasher builder this set hashes with.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Number of values stored.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the set stores nothing.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// How many values fit before the next growth.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Drops every value and returns the set to the slot count it was created
    /// with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<u32> = HashSet::new();
    /// let fresh = set.capacity();
    /// set.extend(0..1000);
    /// assert!(set.capacity() > fresh);
    ///
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert_eq!(set.capacity(), fresh);
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Rehashes into the smallest slot array that still holds every value.
    pub fn shrink_to_fit(&mut self) {
        let hash_builder = &self.hash_builder;
        self.table.shrink_to_fit(|v| hash_builder.hash_one(v));
    }

    /// Grows up front so that `additional` more values fit.
    ///
    /// # Panics
    ///
    /// Panics if the slot count would overflow `usize`.
    pub fn reserve(&mut self, additional: usize) {
        let hash_builder = &self.hash_builder;
        self.table.reserve(additional, |v| hash_builder.hash_one(v));
    }

    /// Fallible [`reserve`](Self::reserve). The set is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    /// use robin_hash::TryReserveError;
    ///
    /// let mut set: HashSet<u32> = HashSet::new();
    /// assert!(set.try_reserve(10).is_ok());
    /// assert_eq!(set.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow));
    /// # }
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let hash_builder = &self.hash_builder;
        self.table
            .try_reserve(additional, |v| hash_builder.hash_one(v))
    }

    /// Stores `value` unless an equal value is already present.
    ///
    /// Returns `true` when `value` was stored. When an equal value was
    /// already present, `value` is dropped, the stored one is kept and the
    /// table is not grown.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<u32> = HashSet::new();
    /// assert!(set.insert(3));
    /// assert!(!set.insert(3));
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        let hash = self.hash_builder.hash_one(&value);
        let hash_builder = &self.hash_builder;
        match self
            .table
            .entry(hash, |v| *v == value, |v| hash_builder.hash_one(v))
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// [`insert`](Self::insert) that reports growth failure instead of
    /// panicking or aborting. On error `value` is dropped and the set is
    /// unchanged.
    pub fn try_insert(&mut self, value: T) -> Result<bool, TryReserveError> {
        let hash = self.hash_builder.hash_one(&value);
        let hash_builder = &self.hash_builder;
        match self
            .table
            .try_entry(hash, |v| *v == value, |v| hash_builder.hash_one(v))?
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    /// Whether a value equal to `value` is stored.
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Erases the value equal to `value`. Returns whether one was stored.
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Stores `value`, handing back the equal value it displaced, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<String> = HashSet::new();
    /// assert_eq!(set.replace("a".to_string()), None);
    /// assert_eq!(set.replace("a".to_string()), Some("a".to_string()));
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        let hash_builder = &self.hash_builder;
        match self
            .table
            .entry(hash, |v| *v == value, |v| hash_builder.hash_one(v))
        {
            Entry::Occupied(mut stored) => Some(core::mem::replace(stored.get_mut(), value)),
            Entry::Vacant(slot) => {
                slot.insert(value);
                None
            }
        }
    }

    /// Erases the value equal to `value` and returns it.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value)
    }

    /// The stored value equal to `value`, if any.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// A [`Cursor`] at the stored value equal to `value`, if any.
    ///
    /// The cursor is good until the set is next modified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let set: HashSet<u32> = (10..20).collect();
    /// let at = set.find(&12).unwrap();
    /// assert_eq!(set.get_at(at), Some(&12));
    /// assert_eq!(set.find(&30), None);
    /// # }
    /// ```
    pub fn find(&self, value: &T) -> Option<Cursor> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find_cursor(hash, |v| v == value)
    }

    /// Cursor at the first stored value, or [`end`](Self::end) when empty.
    pub fn begin(&self) -> Cursor {
        self.table.begin()
    }

    /// The past-the-end cursor.
    pub fn end(&self) -> Cursor {
        self.table.end()
    }

    /// The cursor after `cursor`, or [`end`](Self::end).
    ///
    /// See [`HashTable::advance`] for how stale cursors are handled.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.table.advance(cursor)
    }

    /// The value under `cursor`; `None` at the end position.
    pub fn get_at(&self, cursor: Cursor) -> Option<&T> {
        self.table.get(cursor)
    }

    /// Iterates over the stored values in slot order, which callers should
    /// treat as unspecified.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Moves every value out of the set. The set keeps its slot array.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Erases every value for which `keep` returns `false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<u32> = (0..100).collect();
    /// set.retain(|&n| n % 10 == 0);
    /// assert_eq!(set.len(), 10);
    /// assert!(set.contains(&40));
    /// assert!(!set.contains(&41));
    /// # }
    /// ```
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.table.retain(|v| keep(&*v));
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty set with a default-constructed hasher builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty set with a default-constructed hasher builder, sized
    /// for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S> Default for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowing iterator returned by [`HashSet::iter`].
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Draining iterator returned by [`HashSet::drain`].
pub struct Drain<'a, T> {
    inner: crate::hash_table::Drain<'a, T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

/// Owning iterator over a [`HashSet`].
pub struct IntoIter<T> {
    inner: crate::hash_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T, S> IntoIterator for HashSet<T, S> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S> Extend<&'a T> for HashSet<T, S>
where
    T: Hash + Eq + Copy + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}
