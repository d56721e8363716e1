use std::{collections::BTreeSet, ops::Range};

use postings::AlignedVec;
use rand::{distributions::Uniform, prelude::Distribution, seq::SliceRandom, thread_rng};

/// Sorted set of `cardinality` values drawn uniformly from `range`, in a
/// buffer aligned for every kernel.
pub fn uniform_sorted_set(range: Range<u32>, cardinality: usize) -> AlignedVec {
    let rng = &mut thread_rng();

    let density = cardinality as f64 / range.len() as f64;
    if density < 0.01 {
        let dist = Uniform::from(range);

        let mut set: BTreeSet<u32> = BTreeSet::new();
        while set.len() < cardinality {
            set.insert(dist.sample(rng));
        }
        set.into_iter().collect()
    } else {
        let mut everything: Vec<u32> = range.collect();
        everything.shuffle(rng);
        everything.truncate(cardinality);
        everything.sort_unstable();
        AlignedVec::from(everything.as_slice())
    }
}
