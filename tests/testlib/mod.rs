pub mod properties;

use postings::{AlignedVec, Isa, Kernel};
use quickcheck::{Arbitrary, Gen};

// Arbitrary Set //
/// Sorted, duplicate-free and 32-byte aligned, so every kernel accepts it.
#[derive(Debug, Clone)]
pub struct SortedSet(AlignedVec);

impl SortedSet {
    pub fn from_unsorted(mut vec: Vec<u32>) -> Self {
        vec.sort_unstable();
        vec.dedup();
        Self(AlignedVec::from(vec.as_slice()))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u32>> for SortedSet {
    fn from(value: Vec<u32>) -> Self {
        Self::from_unsorted(value)
    }
}

impl Arbitrary for SortedSet {
    fn arbitrary(g: &mut Gen) -> Self {
        Self::from_unsorted(Vec::<u32>::arbitrary(g))
    }
}

impl AsRef<[u32]> for SortedSet {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

// Arbitrary Kernel //
#[derive(Debug, Clone, Copy)]
pub struct ArbitraryKernel(pub Kernel);

impl Arbitrary for ArbitraryKernel {
    fn arbitrary(g: &mut Gen) -> Self {
        ArbitraryKernel(*g.choose(&Kernel::ALL).unwrap())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArbitraryIsa(pub Isa);

impl Arbitrary for ArbitraryIsa {
    fn arbitrary(g: &mut Gen) -> Self {
        ArbitraryIsa(*g.choose(&Isa::ALL).unwrap())
    }
}

// Arbitrary Pair of Sets //
#[derive(Debug, Clone)]
pub struct SimilarSetPair(pub SortedSet, pub SortedSet);

impl Arbitrary for SimilarSetPair {
    fn arbitrary(g: &mut Gen) -> Self {
        let shared: Vec<u32> = Vec::arbitrary(g);

        let mut left = Vec::arbitrary(g);
        let mut right = Vec::arbitrary(g);
        left.extend(&shared);
        right.extend(&shared);

        SimilarSetPair(left.into(), right.into())
    }
}

/// Values drawn from a narrow range, so many elements share their low bytes
/// and a large share of each set is common.
#[derive(Debug, Clone)]
pub struct DenseSetPair(pub SortedSet, pub SortedSet);

impl Arbitrary for DenseSetPair {
    fn arbitrary(g: &mut Gen) -> Self {
        let range = (u32::arbitrary(g) % 4096) + 16;
        let dense = |g: &mut Gen| -> Vec<u32> {
            let len = usize::arbitrary(g) % 600;
            (0..len).map(|_| u32::arbitrary(g) % range).collect()
        };
        let left = dense(g);
        let right = dense(g);
        DenseSetPair(left.into(), right.into())
    }
}

#[derive(Debug, Clone)]
pub struct SkewedSetPair {
    pub small: SortedSet,
    pub large: SortedSet,
}

impl Arbitrary for SkewedSetPair {
    fn arbitrary(g: &mut Gen) -> Self {
        let small_size = (usize::arbitrary(g) % 128) + 1;
        let large_size = (usize::arbitrary(g) % 8192) + 128;
        let amount_shared = usize::arbitrary(g) % small_size;

        let shared: Vec<u32> = vec_of_len(amount_shared, g);

        let mut small = vec_of_len(small_size - amount_shared, g);
        let mut large = vec_of_len(large_size - amount_shared, g);
        small.extend(&shared);
        large.extend(&shared);

        SkewedSetPair {
            small: small.into(),
            large: large.into(),
        }
    }
}

fn vec_of_len(len: usize, g: &mut Gen) -> Vec<u32> {
    let mut result: Vec<u32> = Vec::with_capacity(len);
    while result.len() < len {
        let add: Vec<u32> = Vec::arbitrary(g);
        result.extend(&add);
        result.truncate(len);
    }
    result
}
