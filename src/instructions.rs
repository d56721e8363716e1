//! Fixed-width vector boundary used by the block kernels.
//!
//! Lane convention, shared by every backend: lane `i` of a loaded vector holds
//! element `i` of the source slice, bytes within a lane are little-endian, and
//! bit `i` of a lane mask refers to lane `i`. Byte masks follow the same rule
//! with byte `k` at bit `k`.
//!
//! The x86 implementations are `#[inline(always)]` so that they are compiled
//! with the target features of the kernel entry point that instantiates them.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use lazy_static::lazy_static;

/// Instruction set a kernel runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Isa {
    /// Lane-emulated vectors, available everywhere.
    Portable,
    /// 128-bit vectors with `pshufb`.
    Ssse3,
    /// 256-bit vectors.
    Avx2,
}

lazy_static! {
    static ref DETECTED: Isa = detect_isa();
}

impl Isa {
    pub const ALL: [Isa; 3] = [Isa::Portable, Isa::Ssse3, Isa::Avx2];

    /// Best instruction set of the running CPU. Always `Portable` when the
    /// `simd` feature is disabled.
    #[inline]
    pub fn detect() -> Isa {
        *DETECTED
    }

    /// Clamps `self` to what the running CPU supports.
    #[inline]
    pub fn supported(self) -> Isa {
        self.min(Self::detect())
    }

    pub fn name(self) -> &'static str {
        match self {
            Isa::Portable => "portable",
            Isa::Ssse3 => "ssse3",
            Isa::Avx2 => "avx2",
        }
    }

    pub fn from_name(name: &str) -> Option<Isa> {
        Self::ALL.into_iter().find(|isa| isa.name() == name)
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn detect_isa() -> Isa {
    if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3") {
        Isa::Avx2
    } else if is_x86_feature_detected!("ssse3") {
        Isa::Ssse3
    } else {
        Isa::Portable
    }
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
fn detect_isa() -> Isa {
    Isa::Portable
}

/// A vector of four `u32` lanes.
///
/// # Safety
/// Implementations may use instructions that need CPU support. Callers must
/// only use an implementation on a CPU that has it.
pub trait Vector4: Copy {
    /// Loads `src[..4]`.
    unsafe fn load(src: &[u32]) -> Self;
    /// Loads `src[..4]`, which must start on a 16-byte boundary.
    unsafe fn load_aligned(src: &[u32]) -> Self;
    unsafe fn splat(value: u32) -> Self;
    /// Bit `i` is set when lane `i` of both vectors is equal.
    unsafe fn eq_mask(self, other: Self) -> u8;
    /// Bit `i` is set when lane `i` of `self` equals any lane of `other`.
    unsafe fn rotated_eq_mask(self, other: Self) -> u8;
    /// Byte `k` of the result is byte `pattern[k]` of `self`, or zero when
    /// the high bit of `pattern[k]` is set.
    unsafe fn shuffle_bytes(self, pattern: &[u8; 16]) -> Self;
    /// Bit `k` is set when byte `k` of both vectors is equal.
    unsafe fn byte_eq_mask(self, other: Self) -> u16;
    unsafe fn store(self, out: &mut [u32; 4]);
}

/// A vector of eight `u32` lanes.
///
/// # Safety
/// See [`Vector4`].
pub trait Vector8: Copy {
    unsafe fn load(src: &[u32]) -> Self;
    /// Loads `src[..8]`, which must start on a 32-byte boundary.
    unsafe fn load_aligned(src: &[u32]) -> Self;
    /// Bit `i` is set when lane `i` of `self` equals any lane of `other`.
    unsafe fn rotated_eq_mask(self, other: Self) -> u8;
    /// Lane `i` of the result is lane `indices[i]` of `self`.
    unsafe fn permute(self, indices: &[u32; 8]) -> Self;
    unsafe fn store(self, out: &mut [u32; 8]);
}

// Lane immediates for `_mm_shuffle_epi32` / `_mm256_permute_ps`, two bits
// per destination lane, lane 0 lowest.
/// Lanes `[1, 2, 3, 0]`.
#[cfg(target_arch = "x86_64")]
const ROTATE_1: i32 = 0b00_11_10_01;
/// Lanes `[3, 0, 1, 2]`.
#[cfg(target_arch = "x86_64")]
const ROTATE_2: i32 = 0b10_01_00_11;
/// Lanes `[2, 3, 0, 1]`.
#[cfg(target_arch = "x86_64")]
const ROTATE_3: i32 = 0b01_00_11_10;

#[cfg(target_arch = "x86_64")]
impl Vector4 for __m128i {
    #[inline(always)]
    unsafe fn load(src: &[u32]) -> Self {
        debug_assert!(src.len() >= 4);
        _mm_loadu_si128(src.as_ptr() as *const __m128i)
    }

    #[inline(always)]
    unsafe fn load_aligned(src: &[u32]) -> Self {
        debug_assert!(src.len() >= 4);
        debug_assert!(src.as_ptr() as usize % 16 == 0);
        _mm_load_si128(src.as_ptr() as *const __m128i)
    }

    #[inline(always)]
    unsafe fn splat(value: u32) -> Self {
        _mm_set1_epi32(value as i32)
    }

    #[inline(always)]
    unsafe fn eq_mask(self, other: Self) -> u8 {
        _mm_movemask_ps(_mm_castsi128_ps(_mm_cmpeq_epi32(self, other))) as u8
    }

    #[inline(always)]
    unsafe fn rotated_eq_mask(self, other: Self) -> u8 {
        let cmp0 = _mm_cmpeq_epi32(self, other);
        let cmp1 = _mm_cmpeq_epi32(self, _mm_shuffle_epi32::<ROTATE_1>(other));
        let cmp2 = _mm_cmpeq_epi32(self, _mm_shuffle_epi32::<ROTATE_2>(other));
        let cmp3 = _mm_cmpeq_epi32(self, _mm_shuffle_epi32::<ROTATE_3>(other));
        let cmp = _mm_or_si128(_mm_or_si128(cmp0, cmp1), _mm_or_si128(cmp2, cmp3));
        _mm_movemask_ps(_mm_castsi128_ps(cmp)) as u8
    }

    #[inline(always)]
    unsafe fn shuffle_bytes(self, pattern: &[u8; 16]) -> Self {
        _mm_shuffle_epi8(self, _mm_loadu_si128(pattern.as_ptr() as *const __m128i))
    }

    #[inline(always)]
    unsafe fn byte_eq_mask(self, other: Self) -> u16 {
        _mm_movemask_epi8(_mm_cmpeq_epi8(self, other)) as u16
    }

    #[inline(always)]
    unsafe fn store(self, out: &mut [u32; 4]) {
        _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, self)
    }
}

#[cfg(target_arch = "x86_64")]
impl Vector8 for __m256i {
    #[inline(always)]
    unsafe fn load(src: &[u32]) -> Self {
        debug_assert!(src.len() >= 8);
        _mm256_loadu_si256(src.as_ptr() as *const __m256i)
    }

    #[inline(always)]
    unsafe fn load_aligned(src: &[u32]) -> Self {
        debug_assert!(src.len() >= 8);
        debug_assert!(src.as_ptr() as usize % 32 == 0);
        _mm256_load_si256(src.as_ptr() as *const __m256i)
    }

    #[inline(always)]
    unsafe fn rotated_eq_mask(self, other: Self) -> u8 {
        let b = _mm256_castsi256_ps(other);
        // in-lane rotations of each 128-bit half
        let rot1 = _mm256_castps_si256(_mm256_permute_ps::<ROTATE_1>(b));
        let rot2 = _mm256_castps_si256(_mm256_permute_ps::<ROTATE_2>(b));
        let rot3 = _mm256_castps_si256(_mm256_permute_ps::<ROTATE_3>(b));
        // halves swapped, then the same rotations
        let swap = _mm256_permute2f128_ps::<1>(b, b);
        let rot4 = _mm256_castps_si256(swap);
        let rot5 = _mm256_castps_si256(_mm256_permute_ps::<ROTATE_1>(swap));
        let rot6 = _mm256_castps_si256(_mm256_permute_ps::<ROTATE_2>(swap));
        let rot7 = _mm256_castps_si256(_mm256_permute_ps::<ROTATE_3>(swap));

        let cmp = _mm256_or_si256(
            _mm256_or_si256(
                _mm256_or_si256(_mm256_cmpeq_epi32(self, other), _mm256_cmpeq_epi32(self, rot1)),
                _mm256_or_si256(_mm256_cmpeq_epi32(self, rot2), _mm256_cmpeq_epi32(self, rot3)),
            ),
            _mm256_or_si256(
                _mm256_or_si256(_mm256_cmpeq_epi32(self, rot4), _mm256_cmpeq_epi32(self, rot5)),
                _mm256_or_si256(_mm256_cmpeq_epi32(self, rot6), _mm256_cmpeq_epi32(self, rot7)),
            ),
        );
        _mm256_movemask_ps(_mm256_castsi256_ps(cmp)) as u8
    }

    #[inline(always)]
    unsafe fn permute(self, indices: &[u32; 8]) -> Self {
        _mm256_permutevar8x32_epi32(self, _mm256_loadu_si256(indices.as_ptr() as *const __m256i))
    }

    #[inline(always)]
    unsafe fn store(self, out: &mut [u32; 8]) {
        _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, self)
    }
}

/// Portable four-lane vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lanes4(pub [u32; 4]);

/// Portable eight-lane vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lanes8(pub [u32; 8]);

impl Vector4 for Lanes4 {
    #[inline(always)]
    unsafe fn load(src: &[u32]) -> Self {
        let mut lanes = [0; 4];
        lanes.copy_from_slice(&src[..4]);
        Lanes4(lanes)
    }

    #[inline(always)]
    unsafe fn load_aligned(src: &[u32]) -> Self {
        debug_assert!(src.as_ptr() as usize % 16 == 0);
        Self::load(src)
    }

    #[inline(always)]
    unsafe fn splat(value: u32) -> Self {
        Lanes4([value; 4])
    }

    #[inline(always)]
    unsafe fn eq_mask(self, other: Self) -> u8 {
        let mut mask = 0;
        for i in 0..4 {
            mask |= ((self.0[i] == other.0[i]) as u8) << i;
        }
        mask
    }

    #[inline(always)]
    unsafe fn rotated_eq_mask(self, other: Self) -> u8 {
        let mut mask = 0;
        for (i, a) in self.0.iter().enumerate() {
            mask |= (other.0.contains(a) as u8) << i;
        }
        mask
    }

    #[inline(always)]
    unsafe fn shuffle_bytes(self, pattern: &[u8; 16]) -> Self {
        let bytes = lanes_to_bytes(self.0);
        let mut out = [0u8; 16];
        for (o, &p) in out.iter_mut().zip(pattern) {
            if p & 0x80 == 0 {
                *o = bytes[(p & 0x0f) as usize];
            }
        }
        Lanes4(bytes_to_lanes(out))
    }

    #[inline(always)]
    unsafe fn byte_eq_mask(self, other: Self) -> u16 {
        let a = lanes_to_bytes(self.0);
        let b = lanes_to_bytes(other.0);
        let mut mask = 0;
        for k in 0..16 {
            mask |= ((a[k] == b[k]) as u16) << k;
        }
        mask
    }

    #[inline(always)]
    unsafe fn store(self, out: &mut [u32; 4]) {
        *out = self.0;
    }
}

impl Vector8 for Lanes8 {
    #[inline(always)]
    unsafe fn load(src: &[u32]) -> Self {
        let mut lanes = [0; 8];
        lanes.copy_from_slice(&src[..8]);
        Lanes8(lanes)
    }

    #[inline(always)]
    unsafe fn load_aligned(src: &[u32]) -> Self {
        debug_assert!(src.as_ptr() as usize % 32 == 0);
        Self::load(src)
    }

    #[inline(always)]
    unsafe fn rotated_eq_mask(self, other: Self) -> u8 {
        let mut mask = 0;
        for (i, a) in self.0.iter().enumerate() {
            mask |= (other.0.contains(a) as u8) << i;
        }
        mask
    }

    #[inline(always)]
    unsafe fn permute(self, indices: &[u32; 8]) -> Self {
        let mut lanes = [0; 8];
        for (lane, &index) in lanes.iter_mut().zip(indices) {
            *lane = self.0[(index & 7) as usize];
        }
        Lanes8(lanes)
    }

    #[inline(always)]
    unsafe fn store(self, out: &mut [u32; 8]) {
        *out = self.0;
    }
}

#[inline(always)]
fn lanes_to_bytes(lanes: [u32; 4]) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    for (chunk, lane) in bytes.chunks_exact_mut(4).zip(lanes) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
    bytes
}

#[inline(always)]
fn bytes_to_lanes(bytes: [u8; 16]) -> [u32; 4] {
    let mut lanes = [0u32; 4];
    for (lane, chunk) in lanes.iter_mut().zip(bytes.chunks_exact(4)) {
        *lane = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    lanes
}

/// Hints that `set[index..]` will be read once soon.
#[inline(always)]
pub fn prefetch_nta(set: &[u32], index: usize) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    unsafe {
        // Prefetching never faults, so the address need not be in bounds.
        _mm_prefetch::<_MM_HINT_NTA>(set.as_ptr().wrapping_add(index) as *const i8);
    }
    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    let _ = (set, index);
}

/// Hints that `set[index..]` will be read soon, into every cache level.
#[inline(always)]
pub fn prefetch_t0(set: &[u32], index: usize) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    unsafe {
        _mm_prefetch::<_MM_HINT_T0>(set.as_ptr().wrapping_add(index) as *const i8);
    }
    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    let _ = (set, index);
}
