// SPDX-License-Identifier: MIT

//! The non-cryptographic system generator used to derive engine keys
//! and to bootstrap the random source before it is initialized.
//!
//! [`SysRandom`] reproduces the C library `random()` generator (the
//! TYPE_3 additive feedback variant) word for word. The cipher's
//! self-test checksum is defined over its output for seed 0, so the
//! sequence must match exactly.

const DEG: usize = 31;
const SEP: usize = 3;
const DISCARD: usize = 10 * DEG;

/// Additive lagged Fibonacci generator with a 31 word state.
///
/// Outputs are 31-bit values in `0..=0x7fff_ffff`.
///
/// ```
/// use gost89::sysrand::SysRandom;
///
/// let mut rng = SysRandom::new(1);
/// assert_eq!(rng.next_u32(), 1804289383);
/// assert_eq!(rng.next_u32(), 846930886);
/// ```
#[derive(Clone)]
pub struct SysRandom {
    state: [u32; DEG],
    front: usize,
    rear: usize,
}

impl SysRandom {
    /// Seed a new generator. A seed of 0 is treated as 1.
    pub fn new(seed: u32) -> Self {
        let seed = if seed == 0 { 1 } else { seed };
        let mut state = [0u32; DEG];
        let mut word = seed as i32;
        state[0] = word as u32;
        for slot in state.iter_mut().skip(1) {
            // Park-Miller minimal standard, Schrage's method
            let hi = i64::from(word) / 127_773;
            let lo = i64::from(word) % 127_773;
            word = (16_807 * lo - 2_836 * hi) as i32;
            if word < 0 {
                word = word.wrapping_add(2_147_483_647);
            }
            *slot = word as u32;
        }
        let mut rng = Self {
            state,
            front: SEP,
            rear: 0,
        };
        for _ in 0..DISCARD {
            rng.next_u32();
        }
        rng
    }

    /// Seed a new generator from the current wall-clock time in
    /// seconds.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn from_time() -> Self {
        Self::new(time_seed())
    }

    /// Return the next 31-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let val = self.state[self.front].wrapping_add(self.state[self.rear]);
        self.state[self.front] = val;
        self.front += 1;
        if self.front >= DEG {
            self.front = 0;
            self.rear += 1;
        } else {
            self.rear += 1;
            if self.rear >= DEG {
                self.rear = 0;
            }
        }
        val >> 1
    }

    /// Fill `bytes` with successive outputs, each stored as a
    /// little-endian word. A trailing partial word takes the low bytes
    /// of one more output.
    pub fn fill_words(&mut self, bytes: &mut [u8]) {
        for chunk in bytes.chunks_mut(4) {
            let word = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}

impl Drop for SysRandom {
    fn drop(&mut self) {
        self.state.iter_mut().for_each(|v| *v = 0);
    }
}

/// Current wall-clock time in seconds, truncated to 32 bits.
#[cfg(feature = "std")]
pub(crate) fn time_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
