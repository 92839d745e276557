// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

//= https://www.rfc-editor.org/rfc/rfc9000#section-12.3
//# The packet number is an integer in the range 0 to 2^62-1.
const MAX_VALUE: u64 = (1 << 62) - 1;

/// A fully-decoded packet number, as tracked by the loss-detection engine
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketNumber(u64);

impl PacketNumber {
    /// Creates a packet number from its integer value
    #[inline]
    pub const fn new(value: u64) -> Self {
        debug_assert!(value <= MAX_VALUE);
        Self(value)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the packet number sent immediately before this one, if any
    #[inline]
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// Returns the packet number sent immediately after this one, if any
    #[inline]
    pub fn next(self) -> Option<Self> {
        self.0
            .checked_add(1)
            .filter(|value| *value <= MAX_VALUE)
            .map(Self)
    }
}

impl From<u64> for PacketNumber {
    #[inline]
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for PacketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketNumber({})", self.0)
    }
}

impl fmt::Display for PacketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
