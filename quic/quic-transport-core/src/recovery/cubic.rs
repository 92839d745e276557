// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::{congestion_controller::Strategy, loss::INITIAL_RTT};
use crate::time::{Duration, Timestamp};
#[cfg(not(feature = "std"))]
use num_traits::Float as _;

#[cfg(test)]
mod tests;

//= https://www.rfc-editor.org/rfc/rfc8312#section-5.1
//# Based on these observations and our experiments, we find C=0.4
//# gives a good balance between TCP-friendliness and aggressiveness
//# of window increase.  Therefore, C SHOULD be set to 0.4.
const C: f64 = 0.4;

//= https://www.rfc-editor.org/rfc/rfc8312#section-4.5
//# Parameter beta_cubic SHOULD be set to 0.7.
const BETA_CUBIC: f64 = 0.7;

/// CUBIC congestion avoidance
///
/// Windows are tracked in bytes; the cubic function is scaled by the maximum
/// UDP payload size passed in with each event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cubic {
    /// The time, in seconds, the window takes to grow back to `w_max`
    k: f64,
    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
    //# W_max is the window size just before the window is
    //# reduced in the last congestion event.
    w_max: u32,
    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.6
    //# a flow remembers the last value of W_max before it
    //# updates W_max for the current congestion event.
    //# Let us call the last value of W_max to be W_last_max.
    w_last_max: u32,
    /// When the current congestion avoidance stage started
    avoidance_start: Option<Timestamp>,
}

impl Cubic {
    #[inline]
    pub fn k(&self) -> f64 {
        self.k
    }

    #[inline]
    pub fn w_max(&self) -> u32 {
        self.w_max
    }

    #[inline]
    pub fn w_last_max(&self) -> u32 {
        self.w_last_max
    }

    #[inline]
    pub fn avoidance_start(&self) -> Option<Timestamp> {
        self.avoidance_start
    }

    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
    //# CUBIC uses the following window increase function:
    //#
    //#    W_cubic(t) = C*(t-K)^3 + W_max (Eq. 1)
    #[inline]
    fn w_cubic(&self, t: f64, max_udp_payload_size: f64) -> f64 {
        (C * (t - self.k).powi(3)).mul_add(max_udp_payload_size, self.w_max as f64)
    }

    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.2
    //# W_est(t) = W_max*beta_cubic +
    //               [3*(1-beta_cubic)/(1+beta_cubic)] * (t/RTT) (Eq. 4)
    #[inline]
    fn w_est(&self, t: f64, rtt: f64, max_udp_payload_size: f64) -> f64 {
        (self.w_max as f64).mul_add(
            BETA_CUBIC,
            (3.0 * (1.0 - BETA_CUBIC) / (1.0 + BETA_CUBIC)) * (t / rtt) * max_udp_payload_size,
        )
    }
}

impl Strategy for Cubic {
    fn on_congestion_avoidance(
        &mut self,
        congestion_window: u32,
        _bytes_acknowledged: u32,
        now: Timestamp,
        rtt: Duration,
        max_udp_payload_size: u16,
    ) -> u32 {
        // the window can reach the slow start threshold without a loss so
        // congestion avoidance starts with the first acknowledgement
        let avoidance_start = *self.avoidance_start.get_or_insert(now);
        let t = now.saturating_duration_since(avoidance_start).as_secs_f64();
        let rtt = if rtt.is_zero() { INITIAL_RTT } else { rtt }.as_secs_f64();
        let mss = max_udp_payload_size.max(1) as f64;
        let cwnd = congestion_window as f64;

        let w_est = self.w_est(t, rtt, mss);

        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.2
        //# If W_cubic(t) is less than W_est(t), then the protocol is in the TCP
        //# friendly region and cwnd SHOULD be set to W_est(t) at each reception
        //# of an ACK.
        if self.w_cubic(t, mss) < w_est {
            return to_window(cwnd.max(w_est));
        }

        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.3
        //# cwnd SHOULD be
        //# incremented by (W_cubic(t+RTT) - cwnd)/cwnd for each received ACK,
        //# where W_cubic(t+RTT) is calculated using Eq. 1.
        let target = self.w_cubic(t + rtt, mss);
        if target > cwnd {
            to_window((target - cwnd) / cwnd.max(1.0) * mss + cwnd)
        } else {
            congestion_window
        }
    }

    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.5
    //# When a packet loss is detected by duplicate ACKs or a network
    //# congestion is detected by ECN-Echo ACKs, CUBIC updates its W_max,
    //# cwnd, and ssthresh as follows.
    fn on_congestion_event(
        &mut self,
        congestion_window: u32,
        minimum_window: u32,
        now: Timestamp,
        max_udp_payload_size: u16,
    ) -> u32 {
        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.6
        //#    if (W_max < W_last_max){ // should we make room for others
        //#       W_last_max = W_max;             // remember the last W_max
        //#       W_max = W_max*(1.0+beta_cubic)/2.0; // further reduce W_max
        //#    } else {
        //#       W_last_max = W_max              // remember the last W_max
        //#    }
        self.w_max = if congestion_window < self.w_last_max {
            to_window((congestion_window as f64 * (1.0 + BETA_CUBIC) / 2.0).round())
        } else {
            congestion_window
        };
        self.w_last_max = congestion_window;

        let reduced =
            to_window((congestion_window as f64 * BETA_CUBIC).round()).max(minimum_window);

        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
        //#    K = cubic_root(W_max*(1-beta_cubic)/C) (Eq. 2)
        let mss = max_udp_payload_size.max(1) as f64;
        self.k = (self.w_max.saturating_sub(reduced) as f64 / mss / C).cbrt();
        self.avoidance_start = Some(now);

        reduced
    }

    #[inline]
    fn on_persistent_congestion(&mut self, now: Timestamp) {
        self.k = 0.0;
        self.w_max = 0;
        self.w_last_max = 0;
        self.avoidance_start = Some(now);
    }
}

/// Converts a window computed in floating point back to bytes
#[inline]
fn to_window(bytes: f64) -> u32 {
    // `as` saturates at the bounds of u32 and maps NaN to 0
    bytes as u32
}
