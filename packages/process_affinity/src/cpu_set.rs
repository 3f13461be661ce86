use std::fmt::{self, Display};
use std::iter::FusedIterator;

use thiserror::Error;

/// Identifies a specific logical processor.
///
/// This will match the numeric identifier used by standard tooling of the operating system
/// (e.g. the numbers shown by `taskset` or `/proc/cpuinfo`).
pub type CpuIndex = u32;

/// The maximum number of processors a [`CpuSet`] can describe.
///
/// This mirrors the capacity of the fixed-size affinity mask used by the operating system APIs
/// (`CPU_SETSIZE` on Linux). Indices at or above this value can never be members of a set.
pub const MAX_CPU_COUNT: usize = CPU_CAPACITY as usize;

const CPU_CAPACITY: CpuIndex = 1024;

const BITS_PER_WORD: usize = u64::BITS as usize;
const WORD_COUNT: usize = MAX_CPU_COUNT.div_ceil(BITS_PER_WORD);

/// A processor index was outside the range that was acceptable for the operation.
///
/// The limit is either the structural capacity of a [`CpuSet`] ([`MAX_CPU_COUNT`]) or, when
/// applying a set to a process, the number of processors the host currently reports.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error(
    "CPU index {index} is out of range, valid indices are 0 to {}",
    self.limit.saturating_sub(1)
)]
pub struct InvalidCpuIndex {
    index: i64,
    limit: usize,
}

impl InvalidCpuIndex {
    pub(crate) const fn new(index: i64, limit: usize) -> Self {
        Self { index, limit }
    }

    /// The offending index, exactly as supplied by the caller.
    #[must_use]
    pub fn index(&self) -> i64 {
        self.index
    }

    /// The exclusive upper bound that the index violated.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// A set of processors, used both as a requested affinity mask and as the result of reading the
/// affinity mask of a process.
///
/// Members are unique and always below [`MAX_CPU_COUNT`]. Iteration yields members in ascending
/// order and every call to [`iter()`][Self::iter] starts a fresh traversal.
///
/// # Example
///
/// ```
/// use process_affinity::CpuSet;
///
/// let cpus = CpuSet::from_indices([3, 1, 2, 3, 0, 8]).unwrap();
///
/// assert_eq!(cpus.len(), 5);
/// assert!(cpus.contains(1));
/// assert_eq!(cpus.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 8]);
/// assert_eq!(cpus.to_string(), "0-3,8");
/// ```
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct CpuSet {
    words: [u64; WORD_COUNT],
}

impl CpuSet {
    /// Creates a set with no members.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            words: [0; WORD_COUNT],
        }
    }

    /// Creates a set containing every processor index in `0..cpu_count`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCpuIndex`] if `cpu_count` exceeds [`MAX_CPU_COUNT`].
    pub fn all(cpu_count: usize) -> Result<Self, InvalidCpuIndex> {
        if cpu_count > MAX_CPU_COUNT {
            // The highest index the caller asked for is the one that does not fit.
            let highest = i64::try_from(cpu_count.saturating_sub(1)).unwrap_or(i64::MAX);

            return Err(InvalidCpuIndex::new(highest, MAX_CPU_COUNT));
        }

        let mut set = Self::empty();

        for (word_index, word) in set.words.iter_mut().enumerate() {
            let word_start = word_index.saturating_mul(BITS_PER_WORD);
            let bits_in_word = cpu_count.saturating_sub(word_start).min(BITS_PER_WORD);

            *word = match bits_in_word {
                0 => 0,
                BITS_PER_WORD => u64::MAX,
                // Guarded above: 0 < bits_in_word < 64.
                partial => u64::MAX >> BITS_PER_WORD.wrapping_sub(partial),
            };
        }

        Ok(set)
    }

    /// Creates a set containing exactly the distinct indices in `indices`.
    ///
    /// Duplicates are collapsed and the order of the input is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCpuIndex`] for the first index that is negative or not below
    /// [`MAX_CPU_COUNT`]. No set is returned in that case, even if earlier indices were valid.
    pub fn from_indices<I>(indices: I) -> Result<Self, InvalidCpuIndex>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        let mut set = Self::empty();

        for index in indices {
            set.insert(index)?;
        }

        Ok(set)
    }

    /// Builds a set by asking `is_member` about every representable index.
    pub(crate) fn from_predicate(mut is_member: impl FnMut(CpuIndex) -> bool) -> Self {
        let mut set = Self::empty();

        for cpu in (0..CPU_CAPACITY).filter(|cpu| is_member(*cpu)) {
            set.set_bit(cpu);
        }

        set
    }

    /// Adds a processor to the set. Adding an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCpuIndex`] if `cpu` is negative or not below [`MAX_CPU_COUNT`]. The set
    /// is not modified in that case.
    pub fn insert(&mut self, cpu: impl Into<i64>) -> Result<(), InvalidCpuIndex> {
        let cpu = cpu.into();

        let index = CpuIndex::try_from(cpu)
            .ok()
            .filter(|index| *index < CPU_CAPACITY)
            .ok_or_else(|| InvalidCpuIndex::new(cpu, MAX_CPU_COUNT))?;

        self.set_bit(index);

        Ok(())
    }

    /// Whether the set contains the processor with the given index.
    #[must_use]
    pub fn contains(&self, cpu: CpuIndex) -> bool {
        let (word, mask) = locate(cpu);

        self.words.get(word).is_some_and(|bits| bits & mask != 0)
    }

    /// The number of processors in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// The lowest processor index in the set, if any.
    #[must_use]
    pub fn first(&self) -> Option<CpuIndex> {
        self.iter().next()
    }

    /// Iterates over the members of the set in ascending order.
    #[must_use]
    pub fn iter(&self) -> CpuSetIter {
        CpuSetIter {
            remaining: self.words,
            word_index: 0,
        }
    }

    /// The caller guarantees that `cpu` is below `CPU_CAPACITY`.
    fn set_bit(&mut self, cpu: CpuIndex) {
        let (word, mask) = locate(cpu);

        if let Some(bits) = self.words.get_mut(word) {
            *bits |= mask;
        }
    }
}

/// Maps a processor index to its word and bit mask within the set.
///
/// Indices at or above `CPU_CAPACITY` map to a word beyond the end of the set.
const fn locate(cpu: CpuIndex) -> (usize, u64) {
    (
        cpu.div_euclid(u64::BITS) as usize,
        1_u64.wrapping_shl(cpu.rem_euclid(u64::BITS)),
    )
}

impl Default for CpuSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Display for CpuSet {
    /// Formats the set in the cpulist format (e.g. `0-3,8`) used by Linux tooling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&cpulist::emit(self.iter()))
    }
}

impl IntoIterator for CpuSet {
    type Item = CpuIndex;
    type IntoIter = CpuSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &CpuSet {
    type Item = CpuIndex;
    type IntoIter = CpuSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the members of a [`CpuSet`].
///
/// The iterator owns a snapshot of the set, so the set it was created from is not borrowed.
#[derive(Clone, Debug)]
pub struct CpuSetIter {
    remaining: [u64; WORD_COUNT],
    word_index: usize,
}

impl Iterator for CpuSetIter {
    type Item = CpuIndex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(word) = self.remaining.get_mut(self.word_index) {
            if *word != 0 {
                let bit = word.trailing_zeros();

                // Clear the lowest set bit.
                *word &= word.wrapping_sub(1);

                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::arithmetic_side_effects,
                    reason = "result is below MAX_CPU_COUNT, which fits in CpuIndex"
                )]
                let cpu = (self.word_index * BITS_PER_WORD) as CpuIndex + bit;

                return Some(cpu);
            }

            self.word_index = self.word_index.wrapping_add(1);
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .remaining
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum();

        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CpuSetIter {}

impl FusedIterator for CpuSetIter {}
