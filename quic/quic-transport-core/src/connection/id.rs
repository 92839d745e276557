// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Defines the connection IDs issued by the peer

use core::convert::TryFrom;

#[cfg(any(test, feature = "generator"))]
use bolero_generator::*;

//= https://www.rfc-editor.org/rfc/rfc9000#section-5.1
//# Each connection possesses a set of connection identifiers, or
//# connection IDs, each of which can identify the connection.
//# Connection IDs are independently selected by endpoints; each endpoint
//# selects the connection IDs that its peer uses.

//= https://www.rfc-editor.org/rfc/rfc9000#section-17.2
//# In QUIC version 1, this value MUST NOT exceed 20 bytes.
/// The maximum size of a connection ID.
pub const MAX_LEN: usize = 20;

/// A connection ID chosen by the peer, used to address packets sent to it.
///
/// The peer may choose zero-length connection IDs.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(any(feature = "generator", test), derive(TypeGenerator))]
pub struct PeerId {
    bytes: [u8; MAX_LEN],
    #[cfg_attr(any(feature = "generator", test), generator(0..=(MAX_LEN as u8)))]
    len: u8,
}

impl core::fmt::Debug for PeerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PeerId({:?})", self.as_bytes())
    }
}

impl PeerId {
    /// Creates a connection ID from a byte slice.
    ///
    /// Returns `None` if the slice is longer than [`MAX_LEN`].
    #[inline]
    pub fn try_from_bytes(bytes: &[u8]) -> Option<PeerId> {
        Self::try_from(bytes).ok()
    }

    /// Returns the connection ID in byte form
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.as_ref()
    }

    /// Returns the length of the connection ID
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns true if this connection ID is zero-length
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<[u8; MAX_LEN]> for PeerId {
    #[inline]
    fn from(bytes: [u8; MAX_LEN]) -> Self {
        Self {
            bytes,
            len: MAX_LEN as u8,
        }
    }
}

impl TryFrom<&[u8]> for PeerId {
    type Error = Error;

    #[inline]
    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let len = slice.len();
        ensure!(len <= MAX_LEN, Err(Error::InvalidLength));

        let mut bytes = [0; MAX_LEN];
        bytes[..len].copy_from_slice(slice);
        Ok(Self {
            bytes,
            len: len as u8,
        })
    }
}

impl AsRef<[u8]> for PeerId {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidLength,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidLength => write!(f, "connection ID exceeds {MAX_LEN} bytes"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        assert!(PeerId::try_from_bytes(&[]).is_some_and(|id| id.is_empty()));
        assert_eq!(PeerId::try_from_bytes(&[7; MAX_LEN]).map(|id| id.len()), Some(MAX_LEN));
        assert_eq!(PeerId::try_from(&[7u8; MAX_LEN + 1][..]), Err(Error::InvalidLength));
    }

    #[test]
    fn trailing_bytes_do_not_affect_equality() {
        let short = PeerId::try_from_bytes(b"abc");
        let long = PeerId::try_from_bytes(b"abcd");
        assert_ne!(short, long);
        assert_eq!(short.map(|id| id.as_bytes().to_vec()), Some(b"abc".to_vec()));
    }
}
