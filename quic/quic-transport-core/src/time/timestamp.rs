// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::{num::NonZeroU64, ops, time::Duration};

/// An absolute point in time, measured in microseconds from the epoch of the
/// [`Clock`](crate::time::Clock) that produced it.
///
/// Timestamps are only comparable with other timestamps from the same clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NonZeroU64);

impl Timestamp {
    /// Creates a `Timestamp` at `duration` past the clock epoch.
    ///
    /// The epoch itself is not representable; durations shorter than one
    /// microsecond are rounded up to one microsecond.
    #[inline]
    pub fn from_duration(duration: Duration) -> Self {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        Self(NonZeroU64::new(micros).unwrap_or(NonZeroU64::MIN))
    }

    /// Returns the time elapsed since the clock epoch
    #[inline]
    pub const fn as_duration(self) -> Duration {
        Duration::from_micros(self.0.get())
    }

    /// Returns the amount of time elapsed from `earlier` to `self`, or zero if
    /// `earlier` is later than `self`.
    #[inline]
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        self.as_duration().saturating_sub(earlier.as_duration())
    }

    /// Returns `true` if `self` is at or before `now`
    #[inline]
    pub fn has_elapsed(self, now: Self) -> bool {
        self <= now
    }

    #[inline]
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        self.as_duration()
            .checked_add(duration)
            .map(Self::from_duration)
    }

    #[inline]
    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.as_duration()
            .checked_sub(duration)
            .filter(|remaining| !remaining.is_zero())
            .map(Self::from_duration)
    }
}

impl ops::Add<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self::from_duration(self.as_duration().saturating_add(rhs))
    }
}

impl ops::AddAssign<Duration> for Timestamp {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl ops::Sub<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self::from_duration(self.as_duration().saturating_sub(rhs))
    }
}

impl ops::Sub for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_rounded_up() {
        let ts = Timestamp::from_duration(Duration::ZERO);
        assert_eq!(ts.as_duration(), Duration::from_micros(1));
        assert_eq!(ts.checked_sub(Duration::from_micros(1)), None);
    }

    #[test]
    fn arithmetic() {
        let start = Timestamp::from_duration(Duration::from_millis(10));
        let later = start + Duration::from_millis(15);

        assert_eq!(later - start, Duration::from_millis(15));
        // subtraction saturates instead of going negative
        assert_eq!(start - later, Duration::ZERO);
        assert!(start.has_elapsed(later));
        assert!(!later.has_elapsed(start));
        assert_eq!(later - Duration::from_millis(15), start);
    }
}
