//! Lookup tables shared by the block kernels.
//!
//! The byte-check dictionary, the match-shuffle dictionary and the group
//! orders follow QFilter:
//!
//! Shuo Han, Lei Zou, and Jeffrey Xu Yu. 2018. Speeding Up Set Intersections in
//! Graph Algorithms using SIMD Instructions. In Proceedings of the 2018
//! International Conference on Management of Data (SIGMOD '18).
//! https://doi.org/10.1145/3183713.3196924
//!
//! The 8-lane compaction table is the shuffling dictionary from tetzank,
//! https://github.com/tetzank/SIMDSetOperations

use lazy_static::lazy_static;

/// Number of distinct 16-bit byte-check masks.
pub const BYTE_CHECK_ENTRIES: usize = 1 << 16;

/// Byte in a shuffle pattern that clears the destination byte.
pub const ZERO_BYTE: u8 = 0x80;

/// Group `g` replicates byte `g` of each A lane four times, so output byte
/// `4*i + j` holds byte `g` of A lane `i`.
pub const BYTE_CHECK_GROUP_A: [[u8; 16]; 4] = [
    [0, 0, 0, 0, 4, 4, 4, 4, 8, 8, 8, 8, 12, 12, 12, 12],
    [1, 1, 1, 1, 5, 5, 5, 5, 9, 9, 9, 9, 13, 13, 13, 13],
    [2, 2, 2, 2, 6, 6, 6, 6, 10, 10, 10, 10, 14, 14, 14, 14],
    [3, 3, 3, 3, 7, 7, 7, 7, 11, 11, 11, 11, 15, 15, 15, 15],
];

/// Group `g` lists byte `g` of the four B lanes, repeated four times, so
/// output byte `4*i + j` holds byte `g` of B lane `j`.
pub const BYTE_CHECK_GROUP_B: [[u8; 16]; 4] = [
    [0, 4, 8, 12, 0, 4, 8, 12, 0, 4, 8, 12, 0, 4, 8, 12],
    [1, 5, 9, 13, 1, 5, 9, 13, 1, 5, 9, 13, 1, 5, 9, 13],
    [2, 6, 10, 14, 2, 6, 10, 14, 2, 6, 10, 14, 2, 6, 10, 14],
    [3, 7, 11, 15, 3, 7, 11, 15, 3, 7, 11, 15, 3, 7, 11, 15],
];

/// Classification of a pair of 4-element blocks after comparing one or more
/// byte groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteVerdict {
    /// No lane of A agrees with any lane of B on the checked bytes.
    NoMatch,
    /// Some lane of A agrees with two or more lanes of B.
    Ambiguous,
    /// Each lane of A agrees with at most one lane of B. The payload indexes
    /// the match-shuffle dictionary: bits `2*i..2*i+2` name the B lane to
    /// move into lane `i`.
    Align(u8),
}

lazy_static! {
    static ref TABLES: LookupTables = LookupTables::build();
}

/// Process-wide tables, built on first use.
#[inline]
pub fn global() -> &'static LookupTables {
    &TABLES
}

#[derive(PartialEq, Eq)]
pub struct LookupTables {
    compact4: [[u8; 16]; 16],
    compact8: [[u32; 8]; 256],
    match_shuffle: [[u8; 16]; 256],
    byte_check: Box<[ByteVerdict; BYTE_CHECK_ENTRIES]>,
}

impl LookupTables {
    pub fn build() -> Self {
        Self {
            compact4: build_compact4(),
            compact8: build_compact8(),
            match_shuffle: build_match_shuffle(),
            byte_check: build_byte_check(),
        }
    }

    /// Byte shuffle packing the 32-bit lanes set in `mask` (low 4 bits) to
    /// the front. Unused bytes are cleared.
    #[inline]
    pub fn compact4(&self, mask: u8) -> &[u8; 16] {
        &self.compact4[(mask & 0xf) as usize]
    }

    /// Lane permutation packing the lanes set in `mask` to the front.
    #[inline]
    pub fn compact8(&self, mask: u8) -> &[u32; 8] {
        &self.compact8[mask as usize]
    }

    #[inline]
    pub fn match_shuffle(&self, order: u8) -> &[u8; 16] {
        &self.match_shuffle[order as usize]
    }

    #[inline]
    pub fn byte_verdict(&self, mask: u16) -> ByteVerdict {
        self.byte_check[mask as usize]
    }
}

fn build_compact4() -> [[u8; 16]; 16] {
    let mut table = [[ZERO_BYTE; 16]; 16];

    for (mask, pattern) in table.iter_mut().enumerate() {
        let mut count = 0;
        for lane in 0..4u8 {
            if mask & (1 << lane) != 0 {
                for byte in 0..4u8 {
                    pattern[count * 4 + byte as usize] = lane * 4 + byte;
                }
                count += 1;
            }
        }
    }
    table
}

fn build_compact8() -> [[u32; 8]; 256] {
    let mut table = [[0u32; 8]; 256];

    for (mask, indices) in table.iter_mut().enumerate() {
        let mut count = 0;
        let mut rest = 7;
        for lane in 0..8u32 {
            if mask & (1 << lane) != 0 {
                // move all set lanes to the beginning
                indices[count] = lane;
                count += 1;
            } else {
                // and the rest to the end
                indices[rest] = lane;
                rest = rest.saturating_sub(1);
            }
        }
    }
    table
}

fn build_match_shuffle() -> [[u8; 16]; 256] {
    let mut table = [[0u8; 16]; 256];

    for (order, pattern) in table.iter_mut().enumerate() {
        for lane in 0..4 {
            let source = ((order >> (lane * 2)) & 0b11) as u8;
            for byte in 0..4u8 {
                pattern[lane * 4 + byte as usize] = source * 4 + byte;
            }
        }
    }
    table
}

fn build_byte_check() -> Box<[ByteVerdict; BYTE_CHECK_ENTRIES]> {
    let verdicts: Vec<ByteVerdict> = (0..BYTE_CHECK_ENTRIES)
        .map(|mask| byte_check_verdict(mask as u16))
        .collect();

    match verdicts.into_boxed_slice().try_into() {
        Ok(table) => table,
        Err(_) => unreachable!("byte check table has {} entries", BYTE_CHECK_ENTRIES),
    }
}

/// Each nibble of `mask` is the comparison of one A lane against all four B
/// lanes.
fn byte_check_verdict(mask: u16) -> ByteVerdict {
    let codes = [
        mask & 0xf,
        (mask >> 4) & 0xf,
        (mask >> 8) & 0xf,
        (mask >> 12) & 0xf,
    ];

    if codes.iter().any(|c| c.count_ones() > 1) {
        return ByteVerdict::Ambiguous;
    }
    if codes.iter().all(|&c| c == 0) {
        return ByteVerdict::NoMatch;
    }

    let mut order = 0u8;
    for (lane, &code) in codes.iter().enumerate() {
        // Lanes without a candidate keep their own position; the final
        // equality test rejects them anyway.
        let source = if code == 0 {
            lane as u8
        } else {
            code.trailing_zeros() as u8
        };
        order |= source << (lane * 2);
    }
    ByteVerdict::Align(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shuffle_bytes(lanes: [u32; 4], pattern: &[u8; 16]) -> [u32; 4] {
        let mut bytes = [0u8; 16];
        for (i, lane) in lanes.iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&lane.to_le_bytes());
        }
        let mut out = [0u8; 16];
        for (o, &p) in out.iter_mut().zip(pattern) {
            *o = if p & 0x80 != 0 { 0 } else { bytes[(p & 0xf) as usize] };
        }
        let mut result = [0u32; 4];
        for (i, r) in result.iter_mut().enumerate() {
            *r = u32::from_le_bytes([out[i * 4], out[i * 4 + 1], out[i * 4 + 2], out[i * 4 + 3]]);
        }
        result
    }

    #[test]
    fn build_is_deterministic() {
        assert!(LookupTables::build() == LookupTables::build());
        assert!(*global() == LookupTables::build());
    }

    #[test]
    fn compact4_packs_selected_lanes() {
        let tables = global();
        let lanes = [11, 22, 33, 44];

        for mask in 0..16u8 {
            let expected: Vec<u32> = (0..4)
                .filter(|lane| mask & (1 << lane) != 0)
                .map(|lane| lanes[lane])
                .collect();

            let packed = shuffle_bytes(lanes, tables.compact4(mask));
            let count = mask.count_ones() as usize;
            assert_eq!(&packed[..count], expected.as_slice());
            assert!(packed[count..].iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn compact8_packs_selected_lanes() {
        let tables = global();

        for mask in 0..=255u8 {
            let indices = tables.compact8(mask);
            let count = mask.count_ones() as usize;

            let expected: Vec<u32> = (0..8).filter(|lane| mask & (1 << lane) != 0).collect();
            assert_eq!(&indices[..count], expected.as_slice());

            let mut rest: Vec<u32> = (0..8).filter(|lane| mask & (1 << lane) == 0).collect();
            rest.reverse();
            assert_eq!(&indices[count..], rest.as_slice());
        }
    }

    #[test]
    fn match_shuffle_moves_named_lanes() {
        let tables = global();
        let lanes = [0x0102_0304, 0x1112_1314, 0x2122_2324, 0x3132_3334];

        for order in 0..=255u8 {
            let shuffled = shuffle_bytes(lanes, tables.match_shuffle(order));
            for lane in 0..4 {
                let source = ((order >> (lane * 2)) & 0b11) as usize;
                assert_eq!(shuffled[lane], lanes[source]);
            }
        }
    }

    #[test]
    fn byte_check_matches_brute_force() {
        let tables = global();

        for mask in 0..=u16::MAX {
            let codes: Vec<u16> = (0..4).map(|lane| (mask >> (lane * 4)) & 0xf).collect();

            match tables.byte_verdict(mask) {
                ByteVerdict::NoMatch => assert_eq!(mask, 0),
                ByteVerdict::Ambiguous => {
                    assert!(codes.iter().any(|c| c.count_ones() >= 2))
                }
                ByteVerdict::Align(order) => {
                    for (lane, &code) in codes.iter().enumerate() {
                        assert!(code.count_ones() <= 1);
                        let source = (order >> (lane * 2)) & 0b11;
                        if code != 0 {
                            assert_eq!(code, 1 << source);
                        } else {
                            assert_eq!(source as usize, lane);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn byte_check_examples() {
        let tables = global();
        // A lane 0 agrees with B lane 2 only.
        assert_eq!(tables.byte_verdict(0b0100), ByteVerdict::Align(0b11_10_01_10));
        // A lane 1 agrees with B lanes 0 and 3.
        assert_eq!(tables.byte_verdict(0b1001_0000), ByteVerdict::Ambiguous);
        assert_eq!(tables.byte_verdict(0), ByteVerdict::NoMatch);
    }

    #[test]
    fn group_orders_cover_every_pair() {
        for group in 0..4 {
            for i in 0..4 {
                for j in 0..4 {
                    assert_eq!(BYTE_CHECK_GROUP_A[group][i * 4 + j] as usize, i * 4 + group);
                    assert_eq!(BYTE_CHECK_GROUP_B[group][i * 4 + j] as usize, j * 4 + group);
                }
            }
        }
    }
}
