//! QFilter block intersection.
//!
//! Shuo Han, Lei Zou, and Jeffrey Xu Yu. 2018. Speeding Up Set Intersections in
//! Graph Algorithms using SIMD Instructions. In Proceedings of the 2018
//! International Conference on Management of Data (SIGMOD '18).
//! https://doi.org/10.1145/3183713.3196924
//!
//! Each pair of 4-element blocks is first compared on one byte per element.
//! Pairs without any candidate are dropped after a single byte compare; pairs
//! where every element has at most one candidate need a single permuted
//! element compare instead of four rotations.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::__m128i;

use crate::{
    instructions::{prefetch_nta, prefetch_t0, Isa, Lanes4, Vector4},
    intersect::{assert_aligned, merge_from, Kernel},
    tables::{self, ByteVerdict, LookupTables, BYTE_CHECK_GROUP_A, BYTE_CHECK_GROUP_B},
    visitor::BlockVisitor,
};

const W: usize = 4;

/// QFilter with byte-group escalation. Inputs may have any alignment.
pub fn qfilter_b4<V>(set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    qfilter_b4_on(Isa::detect(), set_a, set_b, visitor)
}

pub fn qfilter_b4_on<V>(isa: Isa, set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    let tables = tables::global();
    match isa.supported() {
        #[cfg(target_arch = "x86_64")]
        Isa::Ssse3 | Isa::Avx2 => unsafe { qfilter_b4_ssse3(tables, set_a, set_b, visitor) },
        _ => unsafe { qfilter_b4_impl::<Lanes4, V>(tables, set_a, set_b, visitor) },
    }
}

/// QFilter keeping the current blocks in registers and checking only the
/// lowest byte of each element. Both inputs must start on a 16-byte boundary
/// (see [`crate::AlignedVec`]); elements past each slice's length are never
/// read.
pub fn qfilter_v2<V>(set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    qfilter_v2_on(Isa::detect(), set_a, set_b, visitor)
}

pub fn qfilter_v2_on<V>(isa: Isa, set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    assert_aligned(set_a, Kernel::QFilterV2);
    assert_aligned(set_b, Kernel::QFilterV2);

    let tables = tables::global();
    match isa.supported() {
        #[cfg(target_arch = "x86_64")]
        Isa::Ssse3 | Isa::Avx2 => unsafe { qfilter_v2_ssse3(tables, set_a, set_b, visitor) },
        _ => unsafe { qfilter_v2_impl::<Lanes4, V>(tables, set_a, set_b, visitor) },
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn qfilter_b4_ssse3<V: BlockVisitor>(
    tables: &LookupTables, set_a: &[u32], set_b: &[u32], visitor: &mut V)
{
    qfilter_b4_impl::<__m128i, V>(tables, set_a, set_b, visitor)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn qfilter_v2_ssse3<V: BlockVisitor>(
    tables: &LookupTables, set_a: &[u32], set_b: &[u32], visitor: &mut V)
{
    qfilter_v2_impl::<__m128i, V>(tables, set_a, set_b, visitor)
}

/// Mask of A/B lane pairs agreeing on byte `group`: bit `4*i + j` compares
/// A lane `i` with B lane `j`.
#[inline(always)]
unsafe fn byte_check<S: Vector4>(v_a: S, v_b: S, group: usize) -> u16 {
    v_a.shuffle_bytes(&BYTE_CHECK_GROUP_A[group])
        .byte_eq_mask(v_b.shuffle_bytes(&BYTE_CHECK_GROUP_B[group]))
}

#[inline(always)]
unsafe fn qfilter_b4_impl<S, V>(
    tables: &LookupTables,
    set_a: &[u32],
    set_b: &[u32],
    visitor: &mut V)
where
    S: Vector4,
    V: BlockVisitor,
{
    let st_a = (set_a.len() / W) * W;
    let st_b = (set_b.len() / W) * W;

    let mut i_a: usize = 0;
    let mut i_b: usize = 0;
    while i_a < st_a && i_b < st_b {
        let v_a = S::load(&set_a[i_a..]);
        let v_b = S::load(&set_b[i_b..]);

        let a_max = set_a[i_a + W - 1];
        let b_max = set_b[i_b + W - 1];
        if a_max <= b_max {
            i_a += W;
            prefetch_nta(set_a, i_a);
        }
        if b_max <= a_max {
            i_b += W;
            prefetch_nta(set_b, i_b);
        }

        let mut byte_mask = byte_check(v_a, v_b, 0);
        let mut verdict = tables.byte_verdict(byte_mask);
        let mut group = 1;
        while verdict == ByteVerdict::Ambiguous && group < 4 {
            byte_mask &= byte_check(v_a, v_b, group);
            verdict = tables.byte_verdict(byte_mask);
            group += 1;
        }

        let mask = match verdict {
            ByteVerdict::NoMatch => continue,
            ByteVerdict::Align(order) => {
                v_a.eq_mask(v_b.shuffle_bytes(tables.match_shuffle(order)))
            }
            // Only reachable when a block repeats a value.
            ByteVerdict::Ambiguous => v_a.rotated_eq_mask(v_b),
        };
        visitor.visit_vector4(tables, v_a, mask);
    }

    merge_from(set_a, set_b, (i_a, i_b), visitor);
}

#[inline(always)]
unsafe fn qfilter_v2_impl<S, V>(
    tables: &LookupTables,
    set_a: &[u32],
    set_b: &[u32],
    visitor: &mut V)
where
    S: Vector4,
    V: BlockVisitor,
{
    let st_a = (set_a.len() / W) * W;
    let st_b = (set_b.len() / W) * W;

    let mut i_a: usize = 0;
    let mut i_b: usize = 0;
    if i_a < st_a && i_b < st_b {
        let mut v_a = S::load_aligned(set_a);
        let mut v_b = S::load_aligned(set_b);
        let mut group_a = v_a.shuffle_bytes(&BYTE_CHECK_GROUP_A[0]);
        let mut group_b = v_b.shuffle_bytes(&BYTE_CHECK_GROUP_B[0]);

        loop {
            match tables.byte_verdict(group_a.byte_eq_mask(group_b)) {
                ByteVerdict::NoMatch => (),
                ByteVerdict::Align(order) => {
                    let mask = v_a.eq_mask(v_b.shuffle_bytes(tables.match_shuffle(order)));
                    visitor.visit_vector4(tables, v_a, mask);
                }
                ByteVerdict::Ambiguous => {
                    visitor.visit_vector4(tables, v_a, v_a.rotated_eq_mask(v_b));
                }
            }

            let a_max = set_a[i_a + W - 1];
            let b_max = set_b[i_b + W - 1];
            if a_max <= b_max {
                i_a += W;
                if i_a == st_a {
                    break;
                }
                v_a = S::load_aligned(&set_a[i_a..]);
                group_a = v_a.shuffle_bytes(&BYTE_CHECK_GROUP_A[0]);
                prefetch_t0(set_a, i_a + 16);
            }
            if b_max <= a_max {
                i_b += W;
                if i_b == st_b {
                    break;
                }
                v_b = S::load_aligned(&set_b[i_b..]);
                group_b = v_b.shuffle_bytes(&BYTE_CHECK_GROUP_B[0]);
                prefetch_t0(set_b, i_b + 16);
            }
        }
    }

    merge_from(set_a, set_b, (i_a, i_b), visitor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{visitor::{Counter, VecWriter}, AlignedVec};

    fn run_b4(isa: Isa, set_a: &[u32], set_b: &[u32]) -> Vec<u32> {
        let mut writer: VecWriter<u32> = VecWriter::new();
        qfilter_b4_on(isa, set_a, set_b, &mut writer);
        writer.into()
    }

    fn run_v2(isa: Isa, set_a: &[u32], set_b: &[u32]) -> Vec<u32> {
        let mut writer: VecWriter<u32> = VecWriter::new();
        qfilter_v2_on(isa, set_a, set_b, &mut writer);
        writer.into()
    }

    #[test]
    fn shared_low_bytes() {
        // every element has low byte 0x01, so the first byte group never
        // separates them
        let set_a: AlignedVec = (0..12).map(|i| (i << 8) | 1).collect();
        let set_b: AlignedVec = (0..12).map(|i| (i << 9) | 1).collect();
        let expected: Vec<u32> = (0..6).map(|i| (i << 9) | 1).collect();

        for isa in Isa::ALL {
            assert_eq!(run_b4(isa, &set_a, &set_b), expected);
            assert_eq!(run_v2(isa, &set_a, &set_b), expected);
        }
    }

    #[test]
    fn high_bytes_differ() {
        let set_a: AlignedVec = [1, 0x0100_0002, 3_000_000_000, 3_000_000_001].into_iter().collect();
        let set_b: AlignedVec = [2, 0x0100_0001, 0x0100_0002, 3_000_000_001].into_iter().collect();

        for isa in Isa::ALL {
            assert_eq!(run_b4(isa, &set_a, &set_b), vec![0x0100_0002, 3_000_000_001]);
            assert_eq!(run_v2(isa, &set_a, &set_b), vec![0x0100_0002, 3_000_000_001]);
        }
    }

    #[test]
    fn count_only() {
        let set_a: AlignedVec = (0..100).map(|i| i * 3).collect();
        let set_b: AlignedVec = (0..100).map(|i| i * 5).collect();

        for isa in Isa::ALL {
            let mut counter = Counter::new();
            qfilter_b4_on(isa, &set_a, &set_b, &mut counter);
            assert_eq!(counter.count(), 20);

            let mut counter = Counter::new();
            qfilter_v2_on(isa, &set_a, &set_b, &mut counter);
            assert_eq!(counter.count(), 20);
        }
    }

    #[test]
    fn v2_reads_only_logical_length() {
        let mut set_a = AlignedVec::zeroed(5);
        set_a.copy_from_slice(&[1, 2, 3, 4, 5]);
        let set_b: AlignedVec = (1..=8).collect();
        assert_eq!(run_v2(Isa::detect(), &set_a, &set_b), vec![1, 2, 3, 4, 5]);
    }
}
