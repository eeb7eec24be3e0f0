// SPDX-License-Identifier: MIT

//! Statistical acceptance tests applied to every candidate buffer
//! before the random source hands it out.
//!
//! The bounds are calibrated for a buffer of [`SAMPLE_LEN`] bytes
//! (20000 bits, 5000 nibbles) and are those of the FIPS 140-1 power-up
//! tests: monobit, poker and runs. Bits are taken least significant
//! first within each byte.

/// Buffer size the bounds below are calibrated for.
pub const SAMPLE_LEN: usize = 2500;

const MONOBIT_MIN: u32 = 9725;
const MONOBIT_MAX: u32 = 10275;

const POKER_MIN: f32 = 2.16;
const POKER_MAX: f32 = 46.17;

const RUN_MIN: [u32; 6] = [2343, 1135, 542, 251, 111, 111];
const RUN_MAX: [u32; 6] = [2657, 1365, 708, 373, 201, 201];
const LONG_RUN: usize = 26;

/// Run all three tests. Short-circuits on the first failure.
pub fn passes(sample: &[u8; SAMPLE_LEN]) -> bool {
    monobit(sample) && poker(sample) && runs(sample)
}

/// The number of set bits must lie in `9725..=10275`.
pub fn monobit(sample: &[u8; SAMPLE_LEN]) -> bool {
    let ones: u32 = sample.iter().map(|b| b.count_ones()).sum();
    (MONOBIT_MIN..=MONOBIT_MAX).contains(&ones)
}

/// Nibble frequency test.
///
/// With `f(i)` the number of occurrences of the 4-bit value `i` over
/// the 5000 aligned nibbles, `X = 16/5000 · Σ f(i)² − 5000` must lie in
/// `[2.16, 46.17]`.
pub fn poker(sample: &[u8; SAMPLE_LEN]) -> bool {
    let mut freq = [0u64; 16];
    for b in sample.iter() {
        freq[usize::from(b & 0xf)] += 1;
        freq[usize::from(b >> 4)] += 1;
    }
    let nibbles = (SAMPLE_LEN * 2) as f64;
    let sum: u64 = freq.iter().map(|f| f * f).sum();
    let x = ((16.0 / nibbles) * sum as f64 - nibbles) as f32;
    (POKER_MIN..=POKER_MAX).contains(&x)
}

/// Runs test.
///
/// Maximal runs of equal bits are counted by length, 1 through 5 and
/// 6 or longer, separately for zeros and ones. Every one of the twelve
/// counts must be within its bounds, and no run may be longer than 26
/// bits.
pub fn runs(sample: &[u8; SAMPLE_LEN]) -> bool {
    let mut counts = [[0u32; 6]; 2];
    let mut bits = sample
        .iter()
        .flat_map(|&b| (0..8).map(move |i| usize::from((b >> i) & 1)));

    let Some(mut current) = bits.next() else {
        return false;
    };
    let mut len = 1usize;
    for bit in bits {
        if bit == current {
            len += 1;
            if len > LONG_RUN {
                return false;
            }
        } else {
            counts[current][len.min(6) - 1] += 1;
            current = bit;
            len = 1;
        }
    }
    counts[current][len.min(6) - 1] += 1;

    counts.iter().all(|by_len| {
        by_len
            .iter()
            .zip(RUN_MIN.iter().zip(RUN_MAX.iter()))
            .all(|(n, (min, max))| (min..=max).contains(&n))
    })
}
