#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::__m128i;

use crate::{
    instructions::{Isa, Lanes4, Vector4},
    intersect::merge_from,
    visitor::Visitor,
};

const W: usize = 4;

/// Galloping over 4-element blocks of `large`, for inputs of very different
/// sizes.
///
/// For each element of `small`, doubles the block offset in `large` until a
/// block maximum reaches the target, binary searches that interval for the
/// first such block, and compares the target against the whole block. Blocks
/// are only ever skipped forwards. Whatever remains is merged.
pub fn simd_galloping<V>(small: &[u32], large: &[u32], visitor: &mut V)
where
    V: Visitor<u32>,
{
    simd_galloping_on(Isa::detect(), small, large, visitor)
}

pub fn simd_galloping_on<V>(isa: Isa, small: &[u32], large: &[u32], visitor: &mut V)
where
    V: Visitor<u32>,
{
    match isa.supported() {
        // SSE2 is part of the x86_64 baseline.
        #[cfg(target_arch = "x86_64")]
        Isa::Ssse3 | Isa::Avx2 => unsafe {
            simd_galloping_impl::<__m128i, V>(small, large, visitor)
        },
        _ => unsafe { simd_galloping_impl::<Lanes4, V>(small, large, visitor) },
    }
}

#[inline(always)]
unsafe fn simd_galloping_impl<S, V>(small: &[u32], large: &[u32], visitor: &mut V)
where
    S: Vector4,
    V: Visitor<u32>,
{
    // last full block ends here
    let st_large = large.len() - large.len() % W;

    let mut i_small = 0;
    let mut i_large = 0;

    if st_large > 0 {
        while i_small < small.len() {
            let target = small[i_small];

            let mut r = 1;
            while i_large + W * r < st_large && target > large[i_large + W * r + W - 1] {
                r <<= 1;
            }

            let mut upper = if i_large + W * r < st_large {
                r
            } else {
                (st_large - i_large - W) / W
            };
            if large[i_large + W * upper + W - 1] < target {
                break;
            }

            let mut lower = r >> 1;
            while lower < upper {
                let mid = (lower + upper) >> 1;
                if large[i_large + W * mid + W - 1] >= target {
                    upper = mid;
                } else {
                    lower = mid + 1;
                }
            }
            i_large += W * lower;

            let block = S::load(&large[i_large..]);
            if block.eq_mask(S::splat(target)) != 0 {
                visitor.visit(target);
            }
            i_small += 1;
        }
    }

    merge_from(small, large, (i_small, i_large), visitor);
}
