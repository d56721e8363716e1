//! Two-set intersection of sorted, duplicate-free `u32` slices.
//!
//! Every kernel takes the two sets and a [`BlockVisitor`] which receives the
//! intersection in ascending order. Kernels with a vector body have an `_on`
//! form taking the [`Isa`] to run on; the plain form uses [`Isa::detect`].

mod galloping;
mod merge;
pub mod planner;
mod qfilter;
mod shuffling;
mod simd_galloping;

pub use self::{
    galloping::{binary_search, gallop, gallop_by, gallop_gt, gallop_gt_by, galloping},
    merge::{merge_from, scalar_merge},
    planner::{Planner, PlannerError},
    qfilter::{qfilter_b4, qfilter_b4_on, qfilter_v2, qfilter_v2_on},
    shuffling::{
        shuffling_b4, shuffling_b4_on,
        shuffling_b8, shuffling_b8_on,
        shuffling_vec256, shuffling_vec256_on,
    },
    simd_galloping::{simd_galloping, simd_galloping_on},
};

use crate::{
    instructions::Isa,
    visitor::{BlockVisitor, Counter, SliceWriter, VecWriter},
};

pub type Intersect2<V> = fn(a: &[u32], b: &[u32], visitor: &mut V);

/// A two-set intersection kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    ScalarMerge,
    Galloping,
    SimdGalloping,
    QFilter,
    QFilterV2,
    ShufflingB4,
    ShufflingB8,
    ShufflingVec256,
}

impl Kernel {
    pub const ALL: [Kernel; 8] = [
        Kernel::ScalarMerge,
        Kernel::Galloping,
        Kernel::SimdGalloping,
        Kernel::QFilter,
        Kernel::QFilterV2,
        Kernel::ShufflingB4,
        Kernel::ShufflingB8,
        Kernel::ShufflingVec256,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kernel::ScalarMerge     => "scalar_merge",
            Kernel::Galloping       => "galloping",
            Kernel::SimdGalloping   => "simd_galloping",
            Kernel::QFilter         => "qfilter",
            Kernel::QFilterV2       => "qfilter_v2",
            Kernel::ShufflingB4     => "shuffling_b4",
            Kernel::ShufflingB8     => "shuffling_b8",
            Kernel::ShufflingVec256 => "shuffling_vec256",
        }
    }

    pub fn from_name(name: &str) -> Option<Kernel> {
        Self::ALL.into_iter().find(|kernel| kernel.name() == name)
    }

    /// Elements consumed per block. Shorter tails go to the scalar merge.
    pub fn block_width(self) -> usize {
        match self {
            Kernel::ScalarMerge | Kernel::Galloping => 1,
            Kernel::SimdGalloping
            | Kernel::QFilter
            | Kernel::QFilterV2
            | Kernel::ShufflingB4 => 4,
            Kernel::ShufflingB8 | Kernel::ShufflingVec256 => 8,
        }
    }

    /// Byte alignment both inputs must start on.
    pub fn alignment(self) -> usize {
        match self {
            Kernel::QFilterV2 => 16,
            Kernel::ShufflingVec256 => 32,
            _ => std::mem::align_of::<u32>(),
        }
    }

    /// Galloping kernels walk `set_a` and search `set_b`, so `set_a` should
    /// be the smaller set.
    pub fn run<V: BlockVisitor>(self, isa: Isa, set_a: &[u32], set_b: &[u32], visitor: &mut V) {
        match self {
            Kernel::ScalarMerge     => scalar_merge(set_a, set_b, visitor),
            Kernel::Galloping       => galloping(set_a, set_b, visitor),
            Kernel::SimdGalloping   => simd_galloping_on(isa, set_a, set_b, visitor),
            Kernel::QFilter         => qfilter_b4_on(isa, set_a, set_b, visitor),
            Kernel::QFilterV2       => qfilter_v2_on(isa, set_a, set_b, visitor),
            Kernel::ShufflingB4     => shuffling_b4_on(isa, set_a, set_b, visitor),
            Kernel::ShufflingB8     => shuffling_b8_on(isa, set_a, set_b, visitor),
            Kernel::ShufflingVec256 => shuffling_vec256_on(isa, set_a, set_b, visitor),
        }
    }

    /// Writes the intersection to the front of `out` and returns its size.
    /// Panics if `out` is too short.
    pub fn intersect(self, set_a: &[u32], set_b: &[u32], out: &mut [u32]) -> usize {
        let mut writer = SliceWriter::from(out);
        self.run(Isa::detect(), set_a, set_b, &mut writer);
        writer.position()
    }

    /// Size of the intersection. Nothing is written.
    pub fn count(self, set_a: &[u32], set_b: &[u32]) -> usize {
        let mut counter = Counter::new();
        self.run(Isa::detect(), set_a, set_b, &mut counter);
        counter.count()
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn run_2set(
    set_a: &[u32],
    set_b: &[u32],
    intersect: Intersect2<VecWriter<u32>>) -> Vec<u32>
{
    let mut writer = VecWriter::with_capacity(set_a.len().min(set_b.len()));
    intersect(set_a, set_b, &mut writer);
    writer.into()
}

pub fn run_2set_c(
    set_a: &[u32],
    set_b: &[u32],
    intersect: Intersect2<Counter>) -> usize
{
    let mut counter = Counter::new();
    intersect(set_a, set_b, &mut counter);
    counter.count()
}

/// Panics unless `set` starts on the boundary `kernel` loads from. Sets
/// shorter than one block are never loaded by a vector, so they are exempt.
#[inline]
pub(crate) fn assert_aligned(set: &[u32], kernel: Kernel) {
    if set.len() >= kernel.block_width() {
        assert!(
            set.as_ptr() as usize % kernel.alignment() == 0,
            "set must start on a {}-byte boundary", kernel.alignment()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlignedVec;

    #[test]
    fn names_round_trip() {
        for kernel in Kernel::ALL {
            assert_eq!(Kernel::from_name(kernel.name()), Some(kernel));
        }
        assert_eq!(Kernel::from_name("bmiss"), None);
    }

    #[test]
    fn buffer_form() {
        let set_a: AlignedVec = [1, 2, 3, 4].into_iter().collect();
        let set_b: AlignedVec = [2, 4, 6, 8].into_iter().collect();

        for kernel in Kernel::ALL {
            let mut out = [0u32; 4];
            assert_eq!(kernel.intersect(&set_a, &set_b, &mut out), 2, "{}", kernel);
            assert_eq!(&out[..2], &[2, 4]);
            assert_eq!(out[2..], [0, 0]);
            assert_eq!(kernel.count(&set_a, &set_b), 2);
        }
    }

    #[test]
    fn alignment_checked_per_kernel() {
        let set: AlignedVec = (0..64).collect();
        for kernel in Kernel::ALL {
            assert_aligned(&set, kernel);
            // shorter than one block is never loaded
            assert_aligned(&set[1..kernel.block_width()], kernel);
            if kernel.alignment() == std::mem::align_of::<u32>() {
                assert_aligned(&set[1..], kernel);
            }
        }
    }

    #[test]
    #[should_panic(expected = "32-byte boundary")]
    fn vec256_block_is_checked() {
        let set: AlignedVec = (0..64).collect();
        assert_aligned(&set[4..12], Kernel::ShufflingVec256);
    }

    #[test]
    #[should_panic(expected = "16-byte boundary")]
    fn qfilter_v2_rejects_misaligned() {
        let set: AlignedVec = (0..16).collect();
        Kernel::QFilterV2.count(&set[1..9], &set[..8]);
    }
}
