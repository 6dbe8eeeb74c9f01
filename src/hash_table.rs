//! The raw Robin Hood hash table.
//!
//! [`HashTable`] stores values of type `V` in a single power-of-two array of
//! slots using open addressing with linear probing. Collisions are resolved
//! with Robin Hood displacement: a value that has travelled further from its
//! ideal slot takes the slot from a value that is closer to home. Removal uses
//! backward shifting, so the table never holds tombstones.
//!
//! The table knows nothing about how values are hashed or compared. Every
//! operation takes the precomputed hash and an equality predicate, and the
//! operations that may grow the table also take a function that rehashes a
//! stored value. [`HashSet`](crate::HashSet) is the convenience wrapper that
//! supplies these from a `BuildHasher` and `Eq`.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

use crate::error::TryReserveError;

/// Number of slots a freshly constructed table starts with, and the floor
/// for every resize.
pub const INIT_SLOTS: usize = 8;

cfg_if::cfg_if! {
    if #[cfg(feature = "density-ninety-three-point-seven-five")] {
        /// The table holds at most `slots - slots / 2^LOAD_FACTOR_SHIFT`
        /// values.
        const LOAD_FACTOR_SHIFT: u32 = 4;
    } else if #[cfg(feature = "density-eighty-seven-point-five")] {
        /// The table holds at most `slots - slots / 2^LOAD_FACTOR_SHIFT`
        /// values.
        const LOAD_FACTOR_SHIFT: u32 = 3;
    } else if #[cfg(feature = "density-seventy-five")] {
        /// The table holds at most `slots - slots / 2^LOAD_FACTOR_SHIFT`
        /// values.
        const LOAD_FACTOR_SHIFT: u32 = 2;
    } else {
        /// The table holds at most `slots - slots / 2^LOAD_FACTOR_SHIFT`
        /// values.
        const LOAD_FACTOR_SHIFT: u32 = 3;
    }
}

/// Maximum number of values a table with `slots` slots may hold. At least one
/// slot always stays empty so every probe terminates.
#[inline(always)]
fn max_load(slots: usize) -> usize {
    slots - (slots >> LOAD_FACTOR_SHIFT).max(1)
}

/// Smallest power-of-two slot count (at least [`INIT_SLOTS`]) able to hold
/// `capacity` values.
#[inline]
fn slots_for(capacity: usize) -> Option<usize> {
    let mut slots = INIT_SLOTS;
    while max_load(slots) < capacity {
        slots = slots.checked_mul(2)?;
    }
    Some(slots)
}

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

/// A process-unique identifier stamped into every cursor a table hands out.
fn next_table_id() -> u64 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

#[cold]
#[inline(never)]
fn probe_overflow() -> ! {
    panic!(
        "probe sequence longer than {} slots; the hash function maps too many values to one slot",
        u8::MAX
    )
}

fn alloc_slots<V>(count: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(count);
    slots.resize_with(count, Slot::default);
    slots
}

fn try_alloc_slots<V>(count: usize) -> Result<Vec<Slot<V>>, TryReserveError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(count)?;
    slots.resize_with(count, Slot::default);
    Ok(slots)
}

/// One entry of the slot array.
///
/// `distance` is how many slots past its ideal slot the value sits, so `0`
/// means the value is home.
#[derive(Clone)]
enum Slot<V> {
    Empty,
    Full { distance: u8, value: V },
}

impl<V> Default for Slot<V> {
    #[inline(always)]
    fn default() -> Self {
        Slot::Empty
    }
}

impl<V> Slot<V> {
    #[inline(always)]
    fn is_full(&self) -> bool {
        matches!(self, Slot::Full { .. })
    }

    #[inline(always)]
    fn value(&self) -> Option<&V> {
        match self {
            Slot::Full { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    #[inline(always)]
    fn occupied(&self) -> &V {
        match self {
            Slot::Full { value, .. } => value,
            Slot::Empty => unreachable!("slot is empty"),
        }
    }

    #[inline(always)]
    fn occupied_mut(&mut self) -> &mut V {
        match self {
            Slot::Full { value, .. } => value,
            Slot::Empty => unreachable!("slot is empty"),
        }
    }
}

/// A detached position in a [`HashTable`].
///
/// Cursors do not borrow the table. Each one remembers which table made it
/// and the generation that table was in. Every insert, removal, growth or
/// clear starts a new generation, and a clone is a different table from its
/// source. Handing a stale or foreign cursor to a table panics in debug
/// builds; release builds treat it as the end position. Use
/// [`HashTable::is_current`] to test a cursor without either outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    index: usize,
    table: u64,
    generation: u64,
}

impl Cursor {
    /// The slot index this cursor points at. Equal to the slot count for the
    /// end position.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Probe length distribution of a table.
///
/// `buckets[d]` is the number of values sitting `d` slots past their ideal
/// slot.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// Count of values per probe distance.
    pub buckets: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// The longest probe distance present, or `None` for an empty table.
    pub fn max_distance(&self) -> Option<usize> {
        self.buckets.iter().rposition(|&count| count != 0)
    }

    /// Average probe distance over all values.
    pub fn mean_distance(&self) -> f64 {
        let total: usize = self.buckets.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self
            .buckets
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();
        weighted as f64 / total as f64
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.buckets.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "probe histogram ({} entries):",
            self.buckets.iter().sum::<usize>()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                0 => None,
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                _ => Some('▉'),
            };
            if let Some(ch) = partial {
                bar.push(ch);
            }
            bar
        };

        for (distance, &count) in self.buckets.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// Utilization statistics for a table.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of values currently in the table
    pub populated: usize,
    /// Maximum number of values before the table grows
    pub capacity: usize,
    /// Total number of slots allocated
    pub total_slots: usize,
    /// Load factor (populated / total_slots)
    pub load_factor: f64,
    /// Longest probe distance of any value
    pub max_distance: usize,
    /// Average probe distance
    pub mean_distance: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
    /// Memory in bytes held by empty slots
    pub wasted_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% of slots)",
            self.populated,
            self.total_slots,
            self.load_factor * 100.0
        );
        println!("Capacity before growth: {}", self.capacity);
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_distance, self.mean_distance
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// An open-addressing hash table using Robin Hood hashing.
///
/// `HashTable<V>` stores values of type `V` and provides amortized O(1)
/// insertion, lookup, and removal. Like the raw tables found in other hashing
/// crates, it requires you to provide the hash value and an equality predicate
/// for each operation, plus a rehash function for the operations that may grow
/// the table.
///
/// ## Performance Characteristics
///
/// - **Memory**: one tag byte and one distance byte per slot, plus the size of
///   `V` (subject to padding). Hashes are not stored.
/// - **Probing**: values that have probed further displace values that are
///   closer to home, which keeps the variance of probe lengths low. Lookups
///   for absent values stop as soon as they meet a value closer to home than
///   the probe itself.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use robin_hash::hash_table::Entry;
/// # use robin_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::with_capacity(100);
/// let hash = hash_id(123);
///
/// match table.entry(hash, |p: &Person| p.id == 123, |p| hash_id(p.id)) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// assert_eq!(table.len(), 1);
/// ```
pub struct HashTable<V> {
    slots: Vec<Slot<V>>,
    populated: usize,
    initial_slots: usize,
    id: u64,
    generation: u64,
}

impl<V: Clone> Clone for HashTable<V> {
    /// The clone gets its own identity, so cursors taken from `self` are
    /// rejected by it.
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            populated: self.populated,
            initial_slots: self.initial_slots,
            id: next_table_id(),
            generation: 0,
        }
    }
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        f.debug_struct("HashTable")
            .field(
                "distances",
                &self
                    .slots
                    .chunks(16)
                    .map(|chunk| {
                        chunk
                            .iter()
                            .map(|slot| match slot {
                                Slot::Empty => "..".to_string(),
                                Slot::Full { distance, .. } => format!("{distance:02}"),
                            })
                            .collect::<Vec<String>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("capacity", &self.capacity())
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`INIT_SLOTS`] slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// # use robin_hash::hash_table::INIT_SLOTS;
    /// #
    /// let table: HashTable<u64> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert_eq!(table.slot_count(), INIT_SLOTS);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a table able to hold at least `capacity` values without
    /// growing.
    ///
    /// The slot count is the smallest power of two, no smaller than
    /// [`INIT_SLOTS`], whose load bound admits `capacity` values.
    /// [`clear`](Self::clear) returns the table to this slot count.
    ///
    /// # Panics
    ///
    /// Panics if the required slot count overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// assert!(table.slot_count().is_power_of_two());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = slots_for(capacity).unwrap_or_else(|| capacity_overflow());
        Self {
            slots: alloc_slots(slots),
            populated: 0,
            initial_slots: slots,
            id: next_table_id(),
            generation: 0,
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline(always)]
    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns the number of values in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    ///
    /// table.entry(1, |&n: &u64| n == 1, |&n| n).or_insert(1);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of values the table can hold before it grows.
    pub fn capacity(&self) -> usize {
        max_load(self.slots.len())
    }

    /// Returns the number of slots currently allocated. Always a power of two.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Walks the probe sequence of `hash` looking for a value accepted by
    /// `eq`.
    ///
    /// The walk stops at the first empty slot or at the first resident that is
    /// closer to its ideal slot than the probe is to `hash`'s. No match can
    /// sit past either.
    #[inline]
    fn search(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        if self.populated == 0 {
            return None;
        }

        let mask = self.mask();
        let mut index = hash as usize & mask;
        for distance in 0..=u8::MAX {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Full {
                    distance: resident,
                    value,
                } => {
                    if *resident < distance {
                        return None;
                    }
                    if *resident == distance && eq(value) {
                        return Some(index);
                    }
                }
            }
            index = (index + 1) & mask;
        }

        None
    }

    /// Follows the displacement chain `place` would take for `hash` without
    /// moving anything, and panics if any carried value would end up more than
    /// `u8::MAX` slots from home.
    fn check_chain(slots: &[Slot<V>], hash: u64) {
        let mask = slots.len() - 1;
        let mut index = hash as usize & mask;
        let mut distance = 0u8;

        while let Slot::Full {
            distance: resident, ..
        } = &slots[index]
        {
            if *resident <= distance {
                distance = *resident;
            }
            index = (index + 1) & mask;
            distance = distance
                .checked_add(1)
                .unwrap_or_else(|| probe_overflow());
        }
    }

    /// Places a value known to be absent from `slots`, returning the slot it
    /// lands in.
    ///
    /// The incoming value walks forward from its ideal slot. Whenever it meets
    /// a resident that is no further from home than itself, the two swap and
    /// the evicted resident carries on walking.
    ///
    /// The chain is checked before the first swap, so an overlong chain
    /// panics with `slots` untouched.
    fn place(slots: &mut [Slot<V>], hash: u64, value: V) -> usize {
        Self::check_chain(slots, hash);

        let mask = slots.len() - 1;
        let mut index = hash as usize & mask;
        let mut distance = 0u8;
        let mut carried = value;
        let mut landed = None;

        loop {
            match &mut slots[index] {
                Slot::Full {
                    distance: resident,
                    value: resident_value,
                } => {
                    if *resident <= distance {
                        mem::swap(resident, &mut distance);
                        mem::swap(resident_value, &mut carried);
                        landed.get_or_insert(index);
                    }
                }
                empty => {
                    *empty = Slot::Full {
                        distance,
                        value: carried,
                    };
                    return landed.unwrap_or(index);
                }
            }

            index = (index + 1) & mask;
            distance += 1;
        }
    }

    /// Removes the value at `index` and shifts the rest of its cluster back
    /// by one slot.
    fn remove_at(&mut self, index: usize) -> V {
        let mask = self.mask();
        let removed = mem::take(&mut self.slots[index]);

        let mut hole = index;
        loop {
            let next = (hole + 1) & mask;
            match &mut self.slots[next] {
                Slot::Full { distance, .. } if *distance > 0 => *distance -= 1,
                _ => break,
            }
            self.slots.swap(hole, next);
            hole = next;
        }

        self.populated -= 1;
        self.bump_generation();

        match removed {
            Slot::Full { value, .. } => value,
            Slot::Empty => unreachable!("removed an empty slot"),
        }
    }

    /// Moves every value into `slots`, which must be empty and large enough,
    /// and drops the old slot array.
    fn rehash_into(&mut self, slots: Vec<Slot<V>>, hasher: impl Fn(&V) -> u64) {
        debug_assert!(max_load(slots.len()) >= self.populated);

        #[cfg(feature = "logging")]
        log::debug!(
            "rehashing {} values from {} to {} slots",
            self.populated,
            self.slots.len(),
            slots.len()
        );

        let old = mem::replace(&mut self.slots, slots);
        for slot in old {
            if let Slot::Full { value, .. } = slot {
                let hash = hasher(&value);
                Self::place(&mut self.slots, hash, value);
            }
        }
        self.bump_generation();
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self, hasher: impl Fn(&V) -> u64) {
        let slots = self
            .slots
            .len()
            .checked_mul(2)
            .unwrap_or_else(|| capacity_overflow());
        self.rehash_into(alloc_slots(slots), hasher);
    }

    #[cold]
    #[inline(never)]
    fn try_grow(&mut self, hasher: impl Fn(&V) -> u64) -> Result<(), TryReserveError> {
        let slots = self
            .slots
            .len()
            .checked_mul(2)
            .ok_or(TryReserveError::CapacityOverflow)?;
        self.rehash_into(try_alloc_slots(slots)?, hasher);
        Ok(())
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Values are yielded in slot order, which depends on their hashes and on
    /// the insertion history. Treat the order as unspecified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..4u64 {
    ///     table.entry(n, |&v: &u64| v == n, |&v| v).or_insert(n);
    /// }
    ///
    /// let mut values: Vec<u64> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [0, 1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator that removes and yields all values from the table.
    ///
    /// After the iterator is dropped the table is empty and keeps its slot
    /// count. Values not consumed are dropped.
    pub fn drain(&mut self) -> Drain<'_, V> {
        self.bump_generation();
        Drain {
            table: self,
            index: 0,
        }
    }

    /// Removes all values and returns the table to the slot count it was
    /// constructed with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..100u64 {
    ///     table.entry(n, |&v: &u64| v == n, |&v| v).or_insert(n);
    /// }
    /// assert!(table.slot_count() > 8);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.slot_count(), 8);
    /// ```
    pub fn clear(&mut self) {
        #[cfg(feature = "logging")]
        log::trace!(
            "clearing {} values, resetting to {} slots",
            self.populated,
            self.initial_slots
        );

        if self.slots.len() == self.initial_slots {
            self.slots.fill_with(Slot::default);
        } else {
            self.slots = alloc_slots(self.initial_slots);
        }
        self.populated = 0;
        self.bump_generation();
    }

    /// Reserves room for at least `additional` more values without growing.
    ///
    /// `hasher` must return the same hash that was used to insert each value.
    ///
    /// # Panics
    ///
    /// Panics if the required slot count overflows `usize`.
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&V) -> u64) {
        let required = self
            .populated
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());
        if required > self.capacity() {
            let slots = slots_for(required).unwrap_or_else(|| capacity_overflow());
            self.rehash_into(alloc_slots(slots), hasher);
        }
    }

    /// Tries to reserve room for at least `additional` more values, reporting
    /// overflow and allocation failure instead of panicking or aborting.
    ///
    /// On error the table is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// # use robin_hash::TryReserveError;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// assert!(table.try_reserve(100, |&v| v).is_ok());
    /// assert!(table.capacity() >= 100);
    ///
    /// assert_eq!(
    ///     table.try_reserve(usize::MAX, |&v| v),
    ///     Err(TryReserveError::CapacityOverflow)
    /// );
    /// ```
    pub fn try_reserve(
        &mut self,
        additional: usize,
        hasher: impl Fn(&V) -> u64,
    ) -> Result<(), TryReserveError> {
        let required = self
            .populated
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow)?;
        if required > self.capacity() {
            let slots = slots_for(required).ok_or(TryReserveError::CapacityOverflow)?;
            self.rehash_into(try_alloc_slots(slots)?, hasher);
        }
        Ok(())
    }

    /// Shrinks the slot array as far as the current values allow, never below
    /// [`INIT_SLOTS`].
    pub fn shrink_to_fit(&mut self, hasher: impl Fn(&V) -> u64) {
        let slots = slots_for(self.populated).unwrap_or(self.slots.len());
        if slots < self.slots.len() {
            #[cfg(feature = "logging")]
            log::trace!("shrinking from {} to {} slots", self.slots.len(), slots);

            self.rehash_into(alloc_slots(slots), hasher);
        }
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table
    ///     .entry(hash_u64(42), |&n: &u64| n == 42, |&n| hash_u64(n))
    ///     .or_insert(42);
    ///
    /// assert_eq!(table.find(hash_u64(42), |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(hash_u64(99), |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        self.search(hash, eq)
            .map(|index| self.slots[index].occupied())
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    ///
    /// The caller must not change the value in a way that changes its hash or
    /// its equality with other stored values.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.search(hash, eq)?;
        Some(self.slots[index].occupied_mut())
    }

    /// Finds a value and returns a [`Cursor`] to its slot.
    pub fn find_cursor(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<Cursor> {
        self.search(hash, eq).map(|index| self.cursor_at(index))
    }

    /// Removes and returns a value from the table, shifting the values that
    /// probed past it back towards their ideal slots.
    ///
    /// Removing an absent value returns `None` and leaves the table
    /// untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(42, |&n: &u64| n == 42, |&n| n).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(99, |&n| n == 99), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.search(hash, eq)?;
        Some(self.remove_at(index))
    }

    /// Keeps only the values for which `f` returns `true`.
    ///
    /// Each value is visited exactly once, in an unspecified order.
    pub fn retain(&mut self, mut f: impl FnMut(&mut V) -> bool) {
        if self.populated == 0 {
            return;
        }

        // Start from an empty slot: backward shifts never cross it, so values
        // only ever move into the slot being examined, never into one already
        // visited.
        let Some(start) = self.slots.iter().position(|slot| !slot.is_full()) else {
            return;
        };

        let mask = self.mask();
        let mut index = start;
        let mut visited = 0;
        while visited < self.slots.len() {
            let keep = match &mut self.slots[index] {
                Slot::Empty => true,
                Slot::Full { value, .. } => f(value),
            };
            if keep {
                index = (index + 1) & mask;
                visited += 1;
            } else {
                self.remove_at(index);
            }
        }
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// If no value matches and the table is at its load bound, the table
    /// grows first, using `hasher` to rehash the stored values. The returned
    /// [`VacantEntry`] can therefore always insert without growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::Entry;
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<(u64, &str)> = HashTable::new();
    ///
    /// match table.entry(7, |&(k, _)| k == 7, |&(k, _)| k) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((7, "seven"));
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         entry.get_mut().1 = "updated";
    ///     }
    /// }
    ///
    /// assert_eq!(table.find(7, |&(k, _)| k == 7), Some(&(7, "seven")));
    /// ```
    pub fn entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> Entry<'_, V> {
        if let Some(index) = self.search(hash, eq) {
            return Entry::Occupied(OccupiedEntry { table: self, index });
        }

        if self.populated >= self.capacity() {
            self.grow(hasher);
        }

        Entry::Vacant(VacantEntry { table: self, hash })
    }

    /// Like [`entry`](Self::entry), but reports growth failure instead of
    /// panicking or aborting.
    pub fn try_entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> Result<Entry<'_, V>, TryReserveError> {
        if let Some(index) = self.search(hash, eq) {
            return Ok(Entry::Occupied(OccupiedEntry { table: self, index }));
        }

        if self.populated >= self.capacity() {
            self.try_grow(hasher)?;
        }

        Ok(Entry::Vacant(VacantEntry { table: self, hash }))
    }

    /// Returns `true` if `cursor` was made by this table and the table has
    /// not been modified since.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(1, |&n: &u64| n == 1, |&n| n).or_insert(1);
    /// let cursor = table.begin();
    /// assert!(table.is_current(cursor));
    ///
    /// let copy = table.clone();
    /// assert!(!copy.is_current(cursor));
    ///
    /// table.entry(2, |&n| n == 2, |&n| n).or_insert(2);
    /// assert!(!table.is_current(cursor));
    /// ```
    pub fn is_current(&self, cursor: Cursor) -> bool {
        cursor.table == self.id && cursor.generation == self.generation
    }

    fn check_cursor(&self, cursor: Cursor) -> bool {
        if self.is_current(cursor) {
            return true;
        }
        if cfg!(debug_assertions) {
            if cursor.table != self.id {
                panic!(
                    "cursor from table {} used with table {}",
                    cursor.table, self.id
                );
            }
            panic!(
                "cursor from generation {} used after the table moved to generation {}",
                cursor.generation, self.generation
            );
        }
        false
    }

    #[inline]
    fn cursor_at(&self, index: usize) -> Cursor {
        Cursor {
            index,
            table: self.id,
            generation: self.generation,
        }
    }

    fn cursor_from(&self, start: usize) -> Cursor {
        let index = self.slots[start..]
            .iter()
            .position(Slot::is_full)
            .map_or(self.slots.len(), |offset| start + offset);
        self.cursor_at(index)
    }

    /// Returns a cursor to the first occupied slot, or [`end`](Self::end) if
    /// the table is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..3u64 {
    ///     table.entry(n, |&v: &u64| v == n, |&v| v).or_insert(n);
    /// }
    ///
    /// let mut seen = 0;
    /// let mut cursor = table.begin();
    /// while cursor != table.end() {
    ///     assert!(table.get(cursor).is_some());
    ///     seen += 1;
    ///     cursor = table.advance(cursor);
    /// }
    /// assert_eq!(seen, 3);
    /// ```
    pub fn begin(&self) -> Cursor {
        self.cursor_from(0)
    }

    /// Returns the one-past-the-last cursor.
    pub fn end(&self) -> Cursor {
        self.cursor_at(self.slots.len())
    }

    /// Moves `cursor` to the next occupied slot, or to [`end`](Self::end).
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `cursor` came from another table or the
    /// table was modified since `cursor` was created.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        if !self.check_cursor(cursor) || cursor.index >= self.slots.len() {
            return self.end();
        }
        self.cursor_from(cursor.index + 1)
    }

    /// Returns the value under `cursor`, or `None` at the end position.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `cursor` came from another table or the
    /// table was modified since `cursor` was created.
    pub fn get(&self, cursor: Cursor) -> Option<&V> {
        if !self.check_cursor(cursor) {
            return None;
        }
        self.slots.get(cursor.index).and_then(Slot::value)
    }

    /// Computes the probe length histogram of the current table.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut buckets = Vec::new();
        for slot in &self.slots {
            if let Slot::Full { distance, .. } = slot {
                let distance = *distance as usize;
                if buckets.len() <= distance {
                    buckets.resize(distance + 1, 0);
                }
                buckets[distance] += 1;
            }
        }
        ProbeHistogram { buckets }
    }

    /// Returns utilization statistics for the current table.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.probe_histogram();
        let slot_size = core::mem::size_of::<Slot<V>>();
        let total_slots = self.slots.len();

        DebugStats {
            populated: self.populated,
            capacity: self.capacity(),
            total_slots,
            load_factor: self.populated as f64 / total_slots as f64,
            max_distance: histogram.max_distance().unwrap_or(0),
            mean_distance: histogram.mean_distance(),
            total_bytes: total_slots * slot_size,
            wasted_bytes: (total_slots - self.populated) * slot_size,
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// No stored value matched the predicate.
    Vacant(VacantEntry<'a, V>),
    /// A stored value matched the predicate.
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the stored value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the stored value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to the stored value if the entry is occupied.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the stored value.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

/// A vacant entry, ready to receive a value.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts `value` with the entry's hash and returns a mutable reference
    /// to it.
    ///
    /// The value must match the predicate the entry was looked up with;
    /// otherwise the table may end up holding duplicates.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        debug_assert!(table.populated < table.capacity());

        let index = HashTable::place(&mut table.slots, self.hash, value);
        table.populated += 1;
        table.bump_generation();

        table.slots[index].occupied_mut()
    }
}

/// An occupied entry, holding a reference to the matching value.
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Returns a reference to the stored value.
    pub fn get(&self) -> &V {
        self.table.slots[self.index].occupied()
    }

    /// Returns a mutable reference to the stored value.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.slots[self.index].occupied_mut()
    }

    /// Converts the entry into a mutable reference bound to the table's
    /// lifetime.
    pub fn into_mut(self) -> &'a mut V {
        self.table.slots[self.index].occupied_mut()
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> V {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the values of a [`HashTable`], in slot order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Full { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`]. It yields
/// owned values and leaves the table empty when dropped.
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<V> Drop for Drain<'_, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        while self.table.populated > 0 && self.index < self.table.slots.len() {
            let slot = mem::take(&mut self.table.slots[self.index]);
            self.index += 1;
            if let Slot::Full { value, .. } = slot {
                self.table.populated -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}

impl<V> FusedIterator for Drain<'_, V> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V> {
    slots: alloc::vec::IntoIter<Slot<V>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Full { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> FusedIterator for IntoIter<V> {}

impl<V> IntoIterator for HashTable<V> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.populated,
            slots: self.slots.into_iter(),
        }
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<V: Debug> HashTable<V> {
    /// Checks the structural invariants over the raw slot array: every value
    /// is reachable from its ideal slot through full slots, every resident
    /// passed on the way is at least as far from home as the walk was, and
    /// the population count matches.
    pub(crate) fn assert_invariants(&self, hasher: impl Fn(&V) -> u64) {
        let mask = self.mask();
        let mut full = 0;

        for (index, slot) in self.slots.iter().enumerate() {
            let Slot::Full { distance, value } = slot else {
                continue;
            };
            full += 1;

            let home = hasher(value) as usize & mask;
            assert_eq!(
                (home + *distance as usize) & mask,
                index,
                "value {value:?} at {index} has wrong distance {distance}"
            );

            for step in 0..*distance as usize {
                match &self.slots[(home + step) & mask] {
                    Slot::Empty => panic!("gap in the run of {value:?} at step {step}"),
                    Slot::Full {
                        distance: resident, ..
                    } => assert!(
                        *resident as usize >= step,
                        "robin hood order broken for {value:?} at step {step}"
                    ),
                }
            }
        }

        assert_eq!(full, self.populated);
        assert!(self.populated <= self.capacity());
        assert!(self.slots.len().is_power_of_two());
    }
}
