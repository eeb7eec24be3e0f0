//
// Copyright (c) 2023 Daniel Ottavio
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE
//
//! The OS entropy source consumed by the random generator.
//!
//! The generator treats entropy as a hard dependency: a failing or
//! unavailable source aborts initialization and regeneration with
//! [`Error`].
use alloc::string::{String, ToString};
use core::{
    fmt,
    fmt::{Debug, Display, Formatter},
};

/// Error type for entropy source failures.
#[derive(Debug, Clone)]
pub struct Error {
    inner: String,
}

/// A blocking source of cryptographically secure random bytes.
pub trait Entropy {
    /// Fill `bytes` completely with random data from the entropy
    /// source.
    ///
    /// # Error
    ///
    /// Returns an error if there is a problem with the underlying
    /// entropy source. Implementations must fail rather than return a
    /// partially filled slice.
    fn fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Error>;

    /// Read one little-endian 32-bit word from the source.
    fn next_u32(&mut self) -> Result<u32, Error> {
        let mut word = [0u8; 4];
        self.fill_bytes(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }
}

impl Error {
    /// Create a new error by wrapping an underlying entropy source
    /// error.
    ///
    /// # Example
    /// ```
    /// use gost89::entropy::Error;
    ///
    /// fn fill_bytes(bytes: &mut [u8]) -> Result<(), Error> {
    ///    getrandom::getrandom(bytes).map_err(Error::new)
    /// }
    /// ```
    pub fn new<E>(error: E) -> Self
    where
        E: Display + Debug,
    {
        Self {
            inner: error.to_string(),
        }
    }
}

impl core::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "entropy error: {}", self.inner)
    }
}

/// An entropy source that draws random data from the host operating
/// system.
///
/// ```
/// use gost89::entropy::{OsEntropy, Entropy};
///
/// # use gost89::entropy::Error;
/// #
/// # fn main() -> Result<(),Error> {
/// #
/// let mut entropy = OsEntropy::default();
/// let seed = entropy.next_u32()?;
/// let mut random_data = [0u8; 32];
/// entropy.fill_bytes(&mut random_data)?;
/// #
/// # let _ = seed;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy {}

impl OsEntropy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Entropy for OsEntropy {
    /// Fill `bytes` with random data from the operating system using
    /// [`getrandom`](getrandom::getrandom).
    ///
    /// # Error
    ///
    /// Returns any error from `getrandom`.
    fn fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        getrandom::getrandom(bytes).map_err(Error::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::entropy::{Entropy, Error, OsEntropy};
    use alloc::string::ToString;

    struct Counter(u8);

    impl Entropy for Counter {
        fn fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
            for b in bytes.iter_mut() {
                *b = self.0;
                self.0 = self.0.wrapping_add(1);
            }
            Ok(())
        }
    }

    #[test]
    fn next_u32_little_endian() -> Result<(), Error> {
        let mut src = Counter(1);
        assert_eq!(src.next_u32()?, 0x04030201);
        assert_eq!(src.next_u32()?, 0x08070605);
        Ok(())
    }

    #[test]
    fn os_entropy_fills() -> Result<(), Error> {
        let mut src = OsEntropy::new();
        let mut buf = [0u8; 32];
        src.fill_bytes(&mut buf)?;
        assert_ne!(buf, [0u8; 32]);
        Ok(())
    }

    #[test]
    fn error_display() {
        let err = Error::new("device missing");
        assert_eq!(err.to_string(), "entropy error: device missing");
    }
}
