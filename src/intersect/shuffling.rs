//! SIMD Shuffling set intersection algorithm - Ilya Katsov 2012
//! https://highlyscalable.wordpress.com/2012/06/05/fast-intersection-sorted-lists-sse/
//!
//! Each block of A is compared against every rotation of the current block of
//! B, and the block with the smaller maximum is advanced.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{__m128i, __m256i};

use crate::{
    instructions::{prefetch_nta, Isa, Lanes4, Lanes8, Vector4, Vector8},
    intersect::{assert_aligned, merge_from, Kernel},
    tables::{self, LookupTables},
    visitor::BlockVisitor,
};

pub fn shuffling_b4<V>(set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    shuffling_b4_on(Isa::detect(), set_a, set_b, visitor)
}

pub fn shuffling_b4_on<V>(isa: Isa, set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    let tables = tables::global();
    match isa.supported() {
        #[cfg(target_arch = "x86_64")]
        Isa::Ssse3 | Isa::Avx2 => unsafe { shuffling_b4_ssse3(tables, set_a, set_b, visitor) },
        _ => unsafe { shuffling_b4_impl::<Lanes4, V>(tables, set_a, set_b, visitor) },
    }
}

/// Two 4-element blocks per side, advancing by 8.
pub fn shuffling_b8<V>(set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    shuffling_b8_on(Isa::detect(), set_a, set_b, visitor)
}

pub fn shuffling_b8_on<V>(isa: Isa, set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    let tables = tables::global();
    match isa.supported() {
        #[cfg(target_arch = "x86_64")]
        Isa::Ssse3 | Isa::Avx2 => unsafe { shuffling_b8_ssse3(tables, set_a, set_b, visitor) },
        _ => unsafe { shuffling_b8_impl::<Lanes4, V>(tables, set_a, set_b, visitor) },
    }
}

/// One 8-element block per side. Both inputs must start on a 32-byte
/// boundary (see [`crate::AlignedVec`]). Without AVX2 the 8-lane vectors are
/// emulated.
pub fn shuffling_vec256<V>(set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    shuffling_vec256_on(Isa::detect(), set_a, set_b, visitor)
}

pub fn shuffling_vec256_on<V>(isa: Isa, set_a: &[u32], set_b: &[u32], visitor: &mut V)
where
    V: BlockVisitor,
{
    assert_aligned(set_a, Kernel::ShufflingVec256);
    assert_aligned(set_b, Kernel::ShufflingVec256);

    let tables = tables::global();
    match isa.supported() {
        #[cfg(target_arch = "x86_64")]
        Isa::Avx2 => unsafe { shuffling_vec256_avx2(tables, set_a, set_b, visitor) },
        _ => unsafe { shuffling_vec256_impl::<Lanes8, V>(tables, set_a, set_b, visitor) },
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn shuffling_b4_ssse3<V: BlockVisitor>(
    tables: &LookupTables, set_a: &[u32], set_b: &[u32], visitor: &mut V)
{
    shuffling_b4_impl::<__m128i, V>(tables, set_a, set_b, visitor)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn shuffling_b8_ssse3<V: BlockVisitor>(
    tables: &LookupTables, set_a: &[u32], set_b: &[u32], visitor: &mut V)
{
    shuffling_b8_impl::<__m128i, V>(tables, set_a, set_b, visitor)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn shuffling_vec256_avx2<V: BlockVisitor>(
    tables: &LookupTables, set_a: &[u32], set_b: &[u32], visitor: &mut V)
{
    shuffling_vec256_impl::<__m256i, V>(tables, set_a, set_b, visitor)
}

/// Advances the side with the smaller block maximum, or both on a tie.
#[inline(always)]
fn advance<const W: usize>(set_a: &[u32], set_b: &[u32], i_a: &mut usize, i_b: &mut usize) {
    let a_max = set_a[*i_a + W - 1];
    let b_max = set_b[*i_b + W - 1];
    if a_max <= b_max {
        *i_a += W;
        prefetch_nta(set_a, *i_a);
    }
    if b_max <= a_max {
        *i_b += W;
        prefetch_nta(set_b, *i_b);
    }
}

#[inline(always)]
unsafe fn shuffling_b4_impl<S, V>(
    tables: &LookupTables,
    set_a: &[u32],
    set_b: &[u32],
    visitor: &mut V)
where
    S: Vector4,
    V: BlockVisitor,
{
    const W: usize = 4;

    let st_a = (set_a.len() / W) * W;
    let st_b = (set_b.len() / W) * W;

    let mut i_a: usize = 0;
    let mut i_b: usize = 0;
    while i_a < st_a && i_b < st_b {
        let v_a = S::load(&set_a[i_a..]);
        let v_b = S::load(&set_b[i_b..]);
        advance::<W>(set_a, set_b, &mut i_a, &mut i_b);

        visitor.visit_vector4(tables, v_a, v_a.rotated_eq_mask(v_b));
    }

    merge_from(set_a, set_b, (i_a, i_b), visitor);
}

#[inline(always)]
unsafe fn shuffling_b8_impl<S, V>(
    tables: &LookupTables,
    set_a: &[u32],
    set_b: &[u32],
    visitor: &mut V)
where
    S: Vector4,
    V: BlockVisitor,
{
    const W: usize = 8;

    let st_a = (set_a.len() / W) * W;
    let st_b = (set_b.len() / W) * W;

    let mut i_a: usize = 0;
    let mut i_b: usize = 0;
    while i_a < st_a && i_b < st_b {
        let v_a0 = S::load(&set_a[i_a..]);
        let v_a1 = S::load(&set_a[i_a + 4..]);
        let v_b0 = S::load(&set_b[i_b..]);
        let v_b1 = S::load(&set_b[i_b + 4..]);
        advance::<W>(set_a, set_b, &mut i_a, &mut i_b);

        let mask_x = v_a0.rotated_eq_mask(v_b0) | v_a0.rotated_eq_mask(v_b1);
        let mask_y = v_a1.rotated_eq_mask(v_b0) | v_a1.rotated_eq_mask(v_b1);
        visitor.visit_vector4(tables, v_a0, mask_x);
        visitor.visit_vector4(tables, v_a1, mask_y);
    }

    merge_from(set_a, set_b, (i_a, i_b), visitor);
}

#[inline(always)]
unsafe fn shuffling_vec256_impl<S, V>(
    tables: &LookupTables,
    set_a: &[u32],
    set_b: &[u32],
    visitor: &mut V)
where
    S: Vector8,
    V: BlockVisitor,
{
    const W: usize = 8;

    let st_a = (set_a.len() / W) * W;
    let st_b = (set_b.len() / W) * W;

    let mut i_a: usize = 0;
    let mut i_b: usize = 0;
    while i_a < st_a && i_b < st_b {
        let v_a = S::load_aligned(&set_a[i_a..]);
        let v_b = S::load_aligned(&set_b[i_b..]);
        advance::<W>(set_a, set_b, &mut i_a, &mut i_b);

        visitor.visit_vector8(tables, v_a, v_a.rotated_eq_mask(v_b));
    }

    merge_from(set_a, set_b, (i_a, i_b), visitor);
}
