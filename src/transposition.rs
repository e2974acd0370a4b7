//! Implements the [Transposition Table]: a fixed-capacity cache of search
//! results keyed by 64-bit position fingerprints.
//!
//! The table is a 4-way set-associative hash structure: every fingerprint
//! owns exactly one [`BUCKET_SIZE`]-record bucket and collisions are resolved
//! by the replacement policy, never by probing other buckets. Replacement
//! prefers evicting records untouched by recent search invocations
//! ("generations") and, among equally stale records, the shallowest ones.
//!
//! Mate-range scores are stored in a ply-adjusted encoding. [`store`] applies
//! [`value_to_table`] internally; the caller must apply [`value_from_table`]
//! to a probed value before using it as a search result. See the function
//! docs for the exact contract.
//!
//! [`store`]: TranspositionTable::store
//! [Transposition Table]: https://www.chessprogramming.org/Transposition_Table

use std::cmp::Reverse;

use itertools::Itertools;

use crate::core::{Key, Move};
use crate::evaluation::{Value, MATED_THRESHOLD, MATE_THRESHOLD, MAX_EVAL, MIN_EVAL};

/// Search depth in plies.
pub type Depth = u8;

/// Distance from the root of the current search, in plies.
pub type Ply = u8;

/// Deepest search the numeric contract supports. Deeper searches would push
/// ply-adjusted mate scores out of the reserved band.
pub const MAX_DEPTH: Depth = 128;

/// Exclusive upper bound on [`Ply`] values passed to the table.
pub const MAX_PLY: Ply = 128;

/// Records per bucket. All records of a bucket share the same hash slot and
/// may hold different keys simultaneously.
pub const BUCKET_SIZE: usize = 4;

/// Default bucket count: the closest power of two to the reference sizing of
/// 500 000 buckets (2 million records).
pub const DEFAULT_BUCKETS: usize = 1 << 19;

/// Describes what kind of search window produced a stored value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// The value is an upper bound: the search failed low against alpha, the
    /// true value is ≤ the stored one.
    Upper = 0,
    /// The value is a lower bound: the search failed high against beta, the
    /// true value is ≥ the stored one.
    Lower,
    /// The value is the minimax value of the position: the window was not
    /// pruned in either direction.
    Exact,
}

/// Read-only view of a cached record returned by a successful probe.
///
/// `value` is in the table's ply-adjusted encoding; apply [`value_from_table`]
/// before using it as a search result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Search depth at which the value was established. The record is only
    /// trustworthy for searches of depth ≤ this value.
    pub depth: Depth,
    /// Cached score in storage encoding.
    pub value: Value,
    /// Best move found for the position, if one was ever supplied. The move
    /// must be legality-checked by the caller: bucket collisions can attach
    /// a move from a different position to this key.
    pub best_move: Option<Move>,
    /// Window classification of `value`.
    pub bound: Bound,
}

impl Entry {
    /// Decides whether this cached record can short-circuit a fresh search
    /// against the window `(alpha, beta)`.
    ///
    /// An upper bound is usable iff `value <= alpha`, a lower bound iff
    /// `value >= beta`. An exact value is usable iff it lies outside the
    /// window on either side; an exact value strictly inside `(alpha, beta)`
    /// is reported as not usable. That last rule is intentional: relaxing it
    /// changes what the surrounding search explores.
    #[must_use]
    pub fn cuts(&self, alpha: Value, beta: Value) -> bool {
        match self.bound {
            Bound::Upper => self.value <= alpha,
            Bound::Lower => self.value >= beta,
            Bound::Exact => self.value <= alpha || self.value >= beta,
        }
    }
}

/// One cached fact about a position. Records are overwritten in place by
/// [`TranspositionTable::store`] and never deleted individually.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Record {
    key: Key,
    value: Value,
    best_move: Option<Move>,
    depth: Depth,
    generation: u8,
    bound: Bound,
}

impl Record {
    /// The empty-slot sentinel: key 0 with all other fields zeroed. This
    /// makes a legitimately computed fingerprint of exactly 0
    /// indistinguishable from an empty slot; astronomically unlikely, and
    /// accepted rather than spending a bit per record on an occupied flag.
    const EMPTY: Self = Self {
        key: 0,
        value: 0,
        best_move: None,
        depth: 0,
        generation: 0,
        bound: Bound::Upper,
    };

    const fn is_empty(&self) -> bool {
        self.key == 0
    }
}

#[derive(Copy, Clone)]
struct Bucket {
    records: [Record; BUCKET_SIZE],
}

impl Bucket {
    const EMPTY: Self = Self {
        records: [Record::EMPTY; BUCKET_SIZE],
    };
}

/// Fixed-capacity transposition table.
///
/// The bucket array is allocated once at construction and never resized;
/// bucket count × [`BUCKET_SIZE`] is the static capacity ceiling. The table
/// has a single owner: the search routine both reads and writes it, so no
/// synchronization is needed and every operation completes in a small
/// constant number of steps.
///
/// The intended call pattern per search invocation:
///
/// ```
/// use ttable::transposition::{value_from_table, Bound, TranspositionTable};
///
/// let mut table = TranspositionTable::new(1 << 10);
/// table.advance_generation();
/// // Inside the search, before expanding a node:
/// let (key, depth, ply) = (0x42, 3, 5);
/// if let Some(entry) = table.probe(key, depth) {
///     if entry.cuts(-100, 100) {
///         let _score = value_from_table(entry.value, ply);
///         // ...short-circuit the node...
///     }
/// }
/// // After computing the node's result:
/// table.store(key, depth, 17, ply, Bound::Exact, None);
/// ```
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    /// Wrapping counter identifying the current search invocation. Freshness
    /// comparisons are relative (circular distance), so wraparound does not
    /// invert the eviction order.
    generation: u8,
}

impl TranspositionTable {
    /// Creates a table with at least `buckets` buckets, rounded up to the
    /// next power of two so that bucket selection is a mask instead of a
    /// division.
    #[must_use]
    pub fn new(buckets: usize) -> Self {
        let buckets = buckets.next_power_of_two();
        Self {
            buckets: vec![Bucket::EMPTY; buckets],
            generation: 0,
        }
    }

    /// Maximum number of records the table can ever hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len() * BUCKET_SIZE
    }

    /// Current search-invocation counter. Only relative comparisons against
    /// record tags are meaningful.
    #[must_use]
    pub const fn generation(&self) -> u8 {
        self.generation
    }

    /// Marks the start of a new search invocation: every record written
    /// before this call becomes eligible for eviction ahead of records the
    /// new invocation touches. Call once per search (e.g. once per root
    /// iteration), before any [`TranspositionTable::store`] for it.
    pub fn advance_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Clears every record and resets the generation counter. This is a new
    /// game boundary, not a per-move operation.
    pub fn reset(&mut self) {
        self.buckets.fill(Bucket::EMPTY);
        self.generation = 0;
    }

    /// Looks up a record with this exact `key` established at depth ≥
    /// `min_depth`.
    ///
    /// A hit refreshes the record's generation, protecting it from near-term
    /// eviction. A key match with insufficient depth is a miss: depth
    /// sufficiency is part of the lookup, not something the caller may infer
    /// from the key matching.
    pub fn probe(&mut self, key: Key, min_depth: Depth) -> Option<Entry> {
        debug_assert!(min_depth <= MAX_DEPTH);

        let generation = self.generation;
        let index = self.bucket_index(key);
        let record = self.buckets[index]
            .records
            .iter_mut()
            .find(|record| record.key == key)?;
        if record.depth < min_depth {
            return None;
        }
        record.generation = generation;
        Some(Entry {
            depth: record.depth,
            value: record.value,
            best_move: record.best_move,
            bound: record.bound,
        })
    }

    /// Caches a search result for `key`.
    ///
    /// `value` is the search-space score at `ply` plies from the root; it is
    /// converted with [`value_to_table`] before being written. If the bucket
    /// already holds this key the record is overwritten in place; otherwise
    /// the victim is the record minimizing `(generation, depth)` — stalest
    /// invocation first, shallowest depth as the tie-break.
    ///
    /// A `best_move` of `None` leaves the move already stored in the target
    /// record untouched, so bound-only results (e.g. a beta cutoff with no
    /// single best move) do not clobber a known best move for the position.
    pub fn store(
        &mut self,
        key: Key,
        depth: Depth,
        value: Value,
        ply: Ply,
        bound: Bound,
        best_move: Option<Move>,
    ) {
        debug_assert!(depth <= MAX_DEPTH);
        debug_assert!((MIN_EVAL..=MAX_EVAL).contains(&value));
        debug_assert!(ply < MAX_PLY);

        let generation = self.generation;
        let index = self.bucket_index(key);
        let records = &mut self.buckets[index].records;

        let target = records
            .iter()
            .position(|record| record.key == key)
            .unwrap_or_else(|| {
                records
                    .iter()
                    .position_min_by_key(|record| {
                        // Stalest generation first (circular distance to stay
                        // correct across counter wraparound), then shallowest
                        // depth. Empty slots have generation 0 and depth 0,
                        // so they are consumed before anything is evicted.
                        (
                            Reverse(generation.wrapping_sub(record.generation)),
                            record.depth,
                        )
                    })
                    .expect("bucket is never empty")
            });

        let record = &mut records[target];
        record.key = key;
        record.value = value_to_table(value, ply);
        record.depth = depth;
        record.generation = generation;
        record.bound = bound;
        if best_move.is_some() {
            record.best_move = best_move;
        }
    }

    /// Occupancy of the table in permille, estimated from a fixed sample of
    /// buckets the way engines report `hashfull` over UCI.
    #[must_use]
    pub fn hashfull(&self) -> usize {
        let sample = self.buckets.len().min(1000);
        let occupied: usize = self.buckets[..sample]
            .iter()
            .map(|bucket| {
                bucket
                    .records
                    .iter()
                    .filter(|record| !record.is_empty())
                    .count()
            })
            .sum();
        occupied * 1000 / (sample * BUCKET_SIZE)
    }

    fn bucket_index(&self, key: Key) -> usize {
        // The bucket count is a power of two, so the modulo is a mask.
        (key as usize) & (self.buckets.len() - 1)
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

/// Converts a search-space score into the table's storage encoding.
///
/// Mate-range scores mean "forced mate in N plies from *here*", so storing
/// them verbatim would make them wrong when reused at a different distance
/// from the root. Offsetting by `ply` makes the stored score root-relative.
/// Ordinary scores are unchanged.
#[must_use]
pub fn value_to_table(value: Value, ply: Ply) -> Value {
    if value > MATE_THRESHOLD {
        value + Value::from(ply)
    } else if value < MATED_THRESHOLD {
        value - Value::from(ply)
    } else {
        value
    }
}

/// Exact inverse of [`value_to_table`]: converts a stored score back into the
/// search space at `ply` plies from the root.
///
/// The table does not apply this automatically; the caller must do it to
/// every mate-range value pulled out of the cache.
#[must_use]
pub fn value_from_table(value: Value, ply: Ply) -> Value {
    if value > MATE_THRESHOLD {
        value - Value::from(ply)
    } else if value < MATED_THRESHOLD {
        value + Value::from(ply)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // Keys congruent modulo the bucket count land in the same bucket.
    fn colliding_keys(table: &TranspositionTable, count: usize) -> Vec<Key> {
        let buckets = table.capacity() / BUCKET_SIZE;
        (0..count).map(|i| (1 + i * buckets) as Key).collect()
    }

    #[test]
    fn rounds_up_to_power_of_two() {
        assert_eq!(TranspositionTable::new(500_000).capacity() / BUCKET_SIZE, 1 << 19);
        assert_eq!(TranspositionTable::new(4).capacity(), 4 * BUCKET_SIZE);
        assert_eq!(TranspositionTable::new(1).capacity(), BUCKET_SIZE);
    }

    #[test]
    fn probe_empty_table() {
        let mut table = TranspositionTable::new(16);
        assert_eq!(table.probe(0xDEAD_BEEF, 0), None);
    }

    #[test]
    fn store_then_probe() {
        let mut table = TranspositionTable::new(16);
        table.store(0xDEAD_BEEF, 3, 42, 0, Bound::Exact, None);

        let entry = table.probe(0xDEAD_BEEF, 3).expect("stored above");
        assert_eq!(entry.depth, 3);
        assert_eq!(entry.value, 42);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, None);
    }

    #[test]
    fn same_key_overwrites_in_place() {
        let mut table = TranspositionTable::new(4);
        let keys = colliding_keys(&table, 2);

        table.store(keys[0], 3, 10, 0, Bound::Exact, None);
        table.store(keys[0], 2, 20, 0, Bound::Lower, None);
        // The shallower store replaced the record rather than occupying a
        // second slot, so the other key still finds room without eviction.
        table.store(keys[1], 1, 30, 0, Bound::Exact, None);

        let entry = table.probe(keys[0], 0).expect("key is present");
        assert_eq!(entry.depth, 2);
        assert_eq!(entry.value, 20);
        assert_eq!(entry.bound, Bound::Lower);
        assert!(table.probe(keys[1], 0).is_some());
    }

    #[test]
    fn empty_slots_consumed_before_eviction() {
        let mut table = TranspositionTable::new(4);
        let keys = colliding_keys(&table, BUCKET_SIZE);

        table.advance_generation();
        for (i, &key) in keys.iter().enumerate() {
            table.store(key, (i + 1) as Depth, 0, 0, Bound::Exact, None);
        }
        for &key in &keys {
            assert!(table.probe(key, 0).is_some(), "no key should be evicted");
        }
    }

    #[test]
    fn eviction_prefers_stale_then_shallow() {
        let mut table = TranspositionTable::new(4);
        let keys = colliding_keys(&table, BUCKET_SIZE + 2);

        for (i, &key) in keys[..BUCKET_SIZE].iter().enumerate() {
            table.store(key, (i + 1) as Depth, 0, 0, Bound::Exact, None);
        }
        table.advance_generation();

        // The 5th key evicts the stale depth-1 record.
        table.store(keys[4], 5, 0, 0, Bound::Exact, None);
        assert_eq!(table.probe(keys[0], 0), None);
        assert!(table.probe(keys[1], 0).is_some());

        // Probing keys[1] refreshed its generation, so the next eviction
        // falls on the shallowest record of the stale generation: depth 3.
        table.store(keys[5], 6, 0, 0, Bound::Exact, None);
        assert_eq!(table.probe(keys[2], 0), None);
        assert!(table.probe(keys[1], 0).is_some());
        assert!(table.probe(keys[3], 0).is_some());
        assert!(table.probe(keys[4], 0).is_some());
        assert!(table.probe(keys[5], 0).is_some());
    }

    #[test]
    fn generation_wraparound_keeps_relative_order() {
        let mut table = TranspositionTable::new(4);
        let keys = colliding_keys(&table, BUCKET_SIZE + 1);

        // Wrap the u8 counter almost all the way around.
        for _ in 0..255 {
            table.advance_generation();
        }
        assert_eq!(table.generation(), 255);
        table.store(keys[0], 7, 0, 0, Bound::Exact, None);

        // Two more advances wrap past 0. The record written at generation
        // 255 must still look *older* than ones written now.
        table.advance_generation();
        table.advance_generation();
        assert_eq!(table.generation(), 1);
        for (i, &key) in keys[1..BUCKET_SIZE].iter().enumerate() {
            table.store(key, (i + 1) as Depth, 0, 0, Bound::Exact, None);
        }
        table.store(keys[4], 1, 0, 0, Bound::Exact, None);

        assert_eq!(
            table.probe(keys[0], 0),
            None,
            "pre-wrap record should be the eviction victim"
        );
        assert!(table.probe(keys[4], 0).is_some());
    }

    #[test]
    fn hashfull_estimates_occupancy() {
        let mut table = TranspositionTable::new(16);
        assert_eq!(table.hashfull(), 0);

        // Keys 1..=64 fill every slot of all 16 buckets.
        for i in 0..table.capacity() {
            table.store((1 + i) as Key, 1, 0, 0, Bound::Exact, None);
        }
        assert_eq!(table.hashfull(), 1000);

        table.reset();
        assert_eq!(table.hashfull(), 0);
    }

    #[test]
    fn advance_generation_wraps() {
        let mut table = TranspositionTable::new(1);
        for _ in 0..=255 {
            table.advance_generation();
        }
        assert_eq!(table.generation(), 0);
    }
}
