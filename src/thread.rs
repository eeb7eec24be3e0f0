// SPDX-License-Identifier: MIT

//! A thread-local interface for the GOST random generator.
use crate::{
    entropy::OsEntropy,
    random::{Error, GostRandom, RandomBuilder},
};

use std::{cell::RefCell, rc::Rc, thread_local};

#[cfg(feature = "rand_core")]
use rand_core::{TryCryptoRng, TryRngCore};

/// A thread-local instance of [`GostRandom`].
///
/// A call to [`LocalGostRandom::default()`] returns a handle to a
/// pre-allocated thread-local instance drawing entropy from
/// [`OsEntropy`]. The instance runs its self-test and initializes on
/// first use in each thread.
///
/// # Example
///
/// ```
/// # use gost89::random::Error;
/// use gost89::thread::LocalGostRandom;
///
/// # fn main() -> Result<(), Error> {
/// let rng = LocalGostRandom::default();
/// let mut random_data = [0u8; 32];
/// rng.fill_bytes(&mut random_data)?;
/// let n = rng.next_u64()?;
/// # let _ = n;
/// # Ok(())
/// # }
/// ```
///
/// # Panics
///
/// The first use in a thread panics if the generator fails to
/// initialize, since there is no caller to hand the error to.
/// Construct a [`GostRandom`] with [`RandomBuilder`] to handle
/// initialization errors.
#[derive(Clone)]
pub struct LocalGostRandom {
    rng: Rc<RefCell<GostRandom<OsEntropy>>>,
}

thread_local!(
    static LOCAL_RNG: Rc<RefCell<GostRandom<OsEntropy>>> = {
        let rng = RandomBuilder::new(OsEntropy::default())
            .build()
            .expect("GostRandom initialization failure");

        Rc::new(RefCell::new(rng))
    }
);

impl Default for LocalGostRandom {
    fn default() -> Self {
        Self {
            rng: LOCAL_RNG.with(|v| v.clone()),
        }
    }
}

impl LocalGostRandom {
    /// See [`next_u8`](crate::random::GostRandom::next_u8) for details.
    pub fn next_u8(&self) -> Result<u8, Error> {
        self.rng.borrow_mut().next_u8()
    }

    /// See [`next_u32`](crate::random::GostRandom::next_u32) for details.
    pub fn next_u32(&self) -> Result<u32, Error> {
        self.rng.borrow_mut().next_u32()
    }

    /// See [`next_u64`](crate::random::GostRandom::next_u64) for details.
    pub fn next_u64(&self) -> Result<u64, Error> {
        self.rng.borrow_mut().next_u64()
    }

    /// See [`fill_bytes`](crate::random::GostRandom::fill_bytes) for details.
    pub fn fill_bytes(&self, bytes: &mut [u8]) -> Result<(), Error> {
        self.rng.borrow_mut().fill_bytes(bytes)
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl TryCryptoRng for LocalGostRandom where LocalGostRandom: TryRngCore {}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl TryRngCore for LocalGostRandom {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        self.rng.borrow_mut().try_next_u32()
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        self.rng.borrow_mut().try_next_u64()
    }

    fn try_fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.rng.borrow_mut().try_fill_bytes(bytes)
    }
}
