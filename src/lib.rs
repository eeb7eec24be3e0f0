// SPDX-License-Identifier: MIT

//! An implementation of the GOST 28147-89 block cipher and a
//! self-testing random number generator built on it.
//!
//! The [`gost`] module provides the cipher engine
//! [`Gost89`](gost::Gost89) with its four modes: simple replacement,
//! gamma, gamma with feedback and the 32-bit imitation insert (MAC).
//!
//! The [`random`] module provides [`GostRandom`](random::GostRandom),
//! which verifies the engine against a known checksum, then encrypts
//! OS entropy in gamma-with-feedback mode and only releases output that
//! passes the monobit, poker and runs tests in [`quality`].
//!
//! # Quick Example
//!
//! A simple way to obtain random data is to use the
//! [`LocalGostRandom::default()`](crate::thread::LocalGostRandom::default())
//! function. This returns a handle to a thread-local instance of
//! [`GostRandom`](random::GostRandom) using entropy supplied by the OS.
//! The `std` feature is required for this approach.
//!
//! ```
//! # #[cfg(feature = "std")]
//! use gost89::thread::LocalGostRandom;
//!
//! # use gost89::random::Error;
//! #
//! # fn main() -> Result<(),Error> {
//! #
//! # #[cfg(feature = "std")]
//! let rng = LocalGostRandom::default();
//! let mut random_data = [0u8; 32];
//! # #[cfg(feature = "std")]
//! rng.fill_bytes(&mut random_data)?;
//! #
//! # Ok(())
//! # }
//! ```
//!
//! Otherwise an instance may be constructed by hand using
//! [`RandomBuilder`](random::RandomBuilder). This approach doesn't
//! require the `std` feature and accepts any
//! [`Entropy`](entropy::Entropy) source.
//!
//! Encrypting with the engine directly:
//!
//! ```
//! use gost89::gost::Gost89;
//!
//! let engine = Gost89::from_seed(42);
//! let mut message = *b"attack at dawn";
//!
//! let mac = engine.compute_mac(&message);
//! engine.feedback(0x5eed).encrypt(&mut message);
//! engine.feedback(0x5eed).decrypt(&mut message);
//!
//! assert_eq!(&message, b"attack at dawn");
//! assert_eq!(engine.compute_mac(&message), mac);
//! ```
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod entropy;
pub mod gost;
pub mod quality;
pub mod random;
pub mod sysrand;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod thread;
