// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::time::{Duration, Timestamp};

/// The view of the loss-detection engine that the congestion controller
/// consumes when it is notified of acknowledgements, losses and persistent
/// congestion.
pub trait Context {
    /// The time the current event is being processed
    fn now(&self) -> Timestamp;

    //= https://www.rfc-editor.org/rfc/rfc9002#section-5.3
    //# smoothed_rtt is an exponentially weighted moving average of an
    //# endpoint's RTT samples
    /// The current smoothed round-trip time estimate
    fn smoothed_rtt(&self) -> Duration;

    /// The smallest round-trip time observed on the path
    fn min_rtt(&self) -> Duration;
}

impl<C: Context + ?Sized> Context for &C {
    #[inline]
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    #[inline]
    fn smoothed_rtt(&self) -> Duration {
        (**self).smoothed_rtt()
    }

    #[inline]
    fn min_rtt(&self) -> Duration {
        (**self).min_rtt()
    }
}

//= https://www.rfc-editor.org/rfc/rfc9002#section-6.2.2
//# When no previous RTT is available, the initial RTT
//# SHOULD be set to 333 milliseconds.
pub const INITIAL_RTT: Duration = Duration::from_millis(333);

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use crate::time::{testing, Clock as _, Duration, Timestamp};

    /// A loss-detection context driven by a manually advanced clock
    #[derive(Clone, Copy, Debug)]
    pub struct Context {
        pub clock: testing::Clock,
        pub smoothed_rtt: Duration,
        pub min_rtt: Duration,
    }

    impl Default for Context {
        fn default() -> Self {
            Self::new(super::INITIAL_RTT)
        }
    }

    impl Context {
        pub fn new(rtt: Duration) -> Self {
            Self {
                clock: Default::default(),
                smoothed_rtt: rtt,
                min_rtt: rtt,
            }
        }

        pub fn advance(&mut self, duration: Duration) {
            self.clock.inc_by(duration);
        }
    }

    impl super::Context for Context {
        fn now(&self) -> Timestamp {
            self.clock.get_time()
        }

        fn smoothed_rtt(&self) -> Duration {
            self.smoothed_rtt
        }

        fn min_rtt(&self) -> Duration {
            self.min_rtt
        }
    }
}
