#![no_main]
use libfuzzer_sys::fuzz_target;
use ttable::evaluation::{MAX_EVAL, MIN_EVAL};
use ttable::transposition::{value_from_table, value_to_table, MAX_PLY};
use ttable::{Bound, TranspositionTable};

// Replays an arbitrary probe/store/advance sequence on a tiny table (so that
// buckets overflow quickly) and checks that a store is immediately visible
// and that mate-score renormalization round-trips.
fuzz_target!(|data: &[u8]| {
    let mut table = TranspositionTable::new(8);
    for chunk in data.chunks_exact(8) {
        let key = u64::from(chunk[1]) + 1;
        let depth = chunk[2] % 65;
        let ply = chunk[3] % MAX_PLY;
        let value = i32::from(i16::from_le_bytes([chunk[4], chunk[5]])).clamp(MIN_EVAL, MAX_EVAL);
        let bound = match chunk[6] % 3 {
            0 => Bound::Upper,
            1 => Bound::Lower,
            _ => Bound::Exact,
        };

        match chunk[0] % 3 {
            0 => table.advance_generation(),
            1 => {
                table.store(key, depth, value, ply, bound, None);
                let entry = table
                    .probe(key, depth)
                    .expect("a store must be immediately visible at its own depth");
                assert_eq!(entry.value, value_to_table(value, ply));
                assert_eq!(value_from_table(entry.value, ply), value);
                assert_eq!(entry.bound, bound);
            }
            _ => {
                if let Some(entry) = table.probe(key, depth) {
                    assert!(entry.depth >= depth);
                }
            }
        }
    }
});
