// SPDX-License-Identifier: MIT

//! A random number generator built on GOST 28147-89 gamma with
//! feedback.
//!
//! [`GostRandom`] keeps a buffer of [`BUFFER_LEN`] random bytes. Each
//! buffer is produced by encrypting fresh entropy in gamma-with-feedback
//! mode and is only handed out after passing the statistical tests in
//! [`quality`](crate::quality). Before any output is produced the
//! generator verifies its own cipher against a known checksum.
//!
//! Instances are constructed with [`RandomBuilder`].
use crate::{
    entropy::{self, Entropy},
    gost::Gost89,
    quality::{self, SAMPLE_LEN},
    sysrand::SysRandom,
};

use core::{
    fmt,
    fmt::{Debug, Display, Formatter},
};
use log::{debug, error, trace, warn};

#[cfg(feature = "rand_core")]
use rand_core::{TryCryptoRng, TryRngCore};

/// Size of the internal random buffer in bytes.
pub const BUFFER_LEN: usize = SAMPLE_LEN;

/// Checksum a conforming cipher produces during the self-test.
pub const CHECKSUM: u64 = 0xa5dc_0000_7f6b;

const CHECKSUM_SYNC: u64 = 10781;
const CHECKSUM_DRAWS: usize = 100;
const CHECKSUM_MOD: u32 = 0xffff;

const DEFAULT_MAX_ATTEMPTS: u32 = 1024;

// max distance between set and clear bits of the initial synchro
const SYNC_BALANCE: f64 = 64.0 * 0.12;

/// Error type for generator failures.
#[derive(Debug, Clone)]
pub enum Error {
    /// The entropy source failed or is unavailable.
    Entropy(entropy::Error),
    /// The cipher produced the wrong self-test checksum. The engine
    /// cannot be trusted on this host.
    SelfTest { expected: u64, actual: u64 },
    /// No candidate synchro or buffer passed the quality tests within
    /// the retry cap.
    Degraded { attempts: u32 },
    /// Output was requested before initialization completed.
    Uninitialized,
}

impl From<entropy::Error> for Error {
    fn from(error: entropy::Error) -> Self {
        Error::Entropy(error)
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Entropy(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Error::Entropy(e) => write!(f, "{}", e),
            Error::SelfTest { expected, actual } => write!(
                f,
                "cipher self-test failed: checksum {:#x}, expected {:#x}",
                actual, expected
            ),
            Error::Degraded { attempts } => write!(
                f,
                "entropy degraded: no candidate passed the quality tests in {} attempts",
                attempts
            ),
            Error::Uninitialized => write!(f, "generator is not initialized"),
        }
    }
}

/// Self-testing random number generator backed by GOST 28147-89.
///
/// # Example
///
/// ```
/// use gost89::{entropy::OsEntropy, random::RandomBuilder};
///
/// # use gost89::random::Error;
/// #
/// # fn main() -> Result<(), Error> {
/// #
/// let mut rng = RandomBuilder::new(OsEntropy::default()).build()?;
///
/// let byte = rng.next_u8()?;
/// let word = rng.next_u32()?;
/// let mut key = [0u8; 32];
/// rng.fill_bytes(&mut key)?;
/// #
/// # let _ = (byte, word);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GostRandom<E> {
    engine: Gost89,
    prng: SysRandom,
    sync: u64,
    buffer: [u8; BUFFER_LEN],
    pos: usize,
    initialized: bool,
    max_attempts: u32,
    entropy: E,
}

/// Builder class for [`GostRandom`] instances.
///
/// # Example
/// ```
/// use gost89::{entropy::OsEntropy, random::RandomBuilder};
///
/// # use gost89::random::Error;
/// #
/// # fn main() -> Result<(), Error> {
/// #
/// let rng = RandomBuilder::new(OsEntropy::default())
///     .max_attempts(64)
///     .build()?;
/// assert!(rng.is_initialized());
/// #
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RandomBuilder<E> {
    max_attempts: u32,
    entropy: E,
}

impl<E> RandomBuilder<E>
where
    E: Entropy,
{
    pub fn new(entropy: E) -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            entropy,
        }
    }

    /// Specify how many candidates the generator draws while deriving
    /// its synchro or regenerating its buffer before giving up with
    /// [`Error::Degraded`].
    ///
    /// By default, this value is 1024.
    ///
    /// # Panics
    ///
    /// This function panics if `max_attempts` is 0.
    pub fn max_attempts(mut self, max_attempts: u32) -> RandomBuilder<E> {
        if max_attempts == 0 {
            panic!("GostRandom: max attempts must be positive")
        }
        self.max_attempts = max_attempts;
        self
    }

    /// Build and initialize a new [`GostRandom`] instance.
    ///
    /// # Error
    ///
    /// See [`GostRandom::initialize`].
    pub fn build(self) -> Result<GostRandom<E>, Error> {
        let mut rng = GostRandom::new(self.entropy, self.max_attempts);
        rng.initialize()?;
        Ok(rng)
    }
}

impl<E> Drop for GostRandom<E> {
    fn drop(&mut self) {
        self.buffer.iter_mut().for_each(|v| *v = 0);
        self.sync = 0;
        self.pos = 0;
    }
}

impl<E> Debug for GostRandom<E> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GostRandom")
            .field("initialized", &self.initialized)
            .field("pos", &self.pos)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<E> GostRandom<E>
where
    E: Entropy,
{
    /// (Re)initialize the generator.
    ///
    /// 1. Key the engine from the fixed seed and verify the cipher
    ///    against [`CHECKSUM`].
    /// 2. Rekey the engine from a system generator seeded with entropy.
    /// 3. Derive a synchro from one system generator word and one
    ///    entropy word, encrypted and checked for bit balance.
    /// 4. Fill the first buffer.
    ///
    /// # Error
    ///
    /// Returns [`Error::SelfTest`] on a checksum mismatch,
    /// [`Error::Entropy`] if the entropy source fails and
    /// [`Error::Degraded`] if the retry cap is reached. The generator
    /// refuses to produce output until a later call succeeds.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.initialized = false;

        let actual = self.self_test()?;
        if actual != CHECKSUM {
            error!("cipher self-test checksum {:#x} != {:#x}", actual, CHECKSUM);
            return Err(Error::SelfTest {
                expected: CHECKSUM,
                actual,
            });
        }
        debug!("cipher self-test passed");

        let seed = self.entropy.next_u32()?;
        self.prng = SysRandom::new(seed);
        self.engine.initialize_with(&mut self.prng);
        self.sync = self.derive_sync()?;

        self.initialized = true;
        if let Err(e) = self.refill() {
            self.initialized = false;
            return Err(e);
        }
        debug!("generator initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Return the next random byte, regenerating the buffer first if it
    /// is exhausted.
    ///
    /// # Error
    ///
    /// Returns [`Error::Uninitialized`] before a successful
    /// initialization, otherwise any error from regeneration.
    pub fn next_u8(&mut self) -> Result<u8, Error> {
        if !self.initialized {
            return Err(Error::Uninitialized);
        }
        self.draw_u8()
    }

    /// Return a random 32-bit value assembled from four bytes, least
    /// significant first.
    pub fn next_u32(&mut self) -> Result<u32, Error> {
        let mut word = [0u8; 4];
        self.fill_bytes(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Return a random 64-bit value assembled from eight bytes, least
    /// significant first.
    pub fn next_u64(&mut self) -> Result<u64, Error> {
        let mut word = [0u8; 8];
        self.fill_bytes(&mut word)?;
        Ok(u64::from_le_bytes(word))
    }

    /// Fill `bytes` with random data.
    pub fn fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        for b in bytes.iter_mut() {
            *b = self.next_u8()?;
        }
        Ok(())
    }

    fn new(entropy: E, max_attempts: u32) -> Self {
        Self {
            engine: Gost89::default(),
            prng: SysRandom::new(0),
            sync: 0,
            buffer: [0u8; BUFFER_LEN],
            pos: BUFFER_LEN,
            initialized: false,
            max_attempts,
            entropy,
        }
    }

    fn draw_u8(&mut self) -> Result<u8, Error> {
        if self.pos == BUFFER_LEN {
            self.refill()?;
        }
        let b = self.buffer[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Key the engine from seed 0 and compute its checksum.
    fn self_test(&mut self) -> Result<u64, Error> {
        self.prng = SysRandom::new(0);
        self.engine.initialize_with(&mut self.prng);
        self.checksum()
    }

    /// Stage one feedback-encrypted buffer of system generator words,
    /// then fold 100 words drawn through the regular regeneration path
    /// into two cascaded sums modulo 2^16 − 1.
    fn checksum(&mut self) -> Result<u64, Error> {
        self.sync = CHECKSUM_SYNC;
        self.prng.fill_words(&mut self.buffer);
        self.engine
            .transform_gamma_feedback(&mut self.buffer, &mut self.sync, true);
        self.pos = BUFFER_LEN;

        let mut acc0 = 0u32;
        let mut acc1 = 0u32;
        for _ in 0..CHECKSUM_DRAWS {
            let mut word = [0u8; 4];
            for b in word.iter_mut() {
                *b = self.draw_u8()?;
            }
            acc0 = acc0.wrapping_add(u32::from_le_bytes(word)) % CHECKSUM_MOD;
            acc1 = (acc1 + acc0) % CHECKSUM_MOD;
        }
        Ok(u64::from(acc0) | (u64::from(CHECKSUM_MOD - acc1) << 32))
    }

    fn derive_sync(&mut self) -> Result<u64, Error> {
        for attempt in 1..=self.max_attempts {
            let low = self.prng.next_u32();
            let high = self.entropy.next_u32()?;
            let sync = self
                .engine
                .encrypt_block(u64::from(low) | (u64::from(high) << 32));
            let ones = f64::from(sync.count_ones());
            if (ones - (64.0 - ones)).abs() < SYNC_BALANCE {
                return Ok(sync);
            }
            trace!("synchro candidate {} unbalanced", attempt);
        }
        warn!("no balanced synchro in {} attempts", self.max_attempts);
        Err(Error::Degraded {
            attempts: self.max_attempts,
        })
    }

    /// Replace the buffer with a fresh candidate that passes the
    /// quality tests and rewind the cursor.
    ///
    /// Candidates are entropy words once initialized, system generator
    /// words before that, encrypted in gamma-with-feedback mode with the
    /// running synchro.
    fn refill(&mut self) -> Result<(), Error> {
        let mut candidate = [0u8; BUFFER_LEN];
        let result = self.fill_candidate(&mut candidate);
        candidate.iter_mut().for_each(|v| *v = 0);
        result
    }

    fn fill_candidate(&mut self, candidate: &mut [u8; BUFFER_LEN]) -> Result<(), Error> {
        for attempt in 1..=self.max_attempts {
            if self.initialized {
                for chunk in candidate.chunks_mut(4) {
                    let word = self.entropy.next_u32()?.to_le_bytes();
                    chunk.copy_from_slice(&word[..chunk.len()]);
                }
            } else {
                self.prng.fill_words(candidate);
            }
            self.engine
                .transform_gamma_feedback(candidate, &mut self.sync, true);
            if quality::passes(candidate) {
                self.buffer.copy_from_slice(&candidate[..]);
                self.pos = 0;
                return Ok(());
            }
            trace!("candidate buffer {} rejected", attempt);
        }
        warn!("no candidate buffer passed in {} attempts", self.max_attempts);
        Err(Error::Degraded {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl<E: Entropy> TryCryptoRng for GostRandom<E> {}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl<E: Entropy> TryRngCore for GostRandom<E> {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        self.next_u32()
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        self.next_u64()
    }

    fn try_fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.fill_bytes(bytes)
    }
}
