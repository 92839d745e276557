// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::congestion_controller::Strategy;
use crate::time::{Duration, Timestamp};


/// The multiplicative decrease factor of 0.7, expressed as a ratio
const BETA_NUMERATOR: u64 = 7;
const BETA_DENOMINATOR: u64 = 10;

/// NewReno with byte counting
///
/// In congestion avoidance the acknowledged bytes are stashed until a whole
/// congestion window has been acknowledged, at which point the window grows by
/// one maximum-sized datagram.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reno {
    stash: u32,
}

impl Reno {
    /// The number of acknowledged bytes not yet turned into window growth
    #[inline]
    pub fn stash(&self) -> u32 {
        self.stash
    }
}

impl Strategy for Reno {
    //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.3
    //# A NewReno sender in congestion avoidance uses an additive increase
    //# multiplicative decrease (AIMD) approach that MUST limit the increase
    //# to the congestion window to at most one maximum datagram size for
    //# each congestion window that is acknowledged.
    fn on_congestion_avoidance(
        &mut self,
        congestion_window: u32,
        bytes_acknowledged: u32,
        _now: Timestamp,
        _rtt: Duration,
        max_udp_payload_size: u16,
    ) -> u32 {
        self.stash = self.stash.saturating_add(bytes_acknowledged);

        let window = congestion_window.max(1);
        ensure!(self.stash >= window, congestion_window);

        let windows = self.stash / window;
        self.stash -= windows * window;

        congestion_window.saturating_add(windows.saturating_mul(max_udp_payload_size as u32))
    }

    fn on_congestion_event(
        &mut self,
        congestion_window: u32,
        minimum_window: u32,
        _now: Timestamp,
        _max_udp_payload_size: u16,
    ) -> u32 {
        let reduced = congestion_window as u64 * BETA_NUMERATOR / BETA_DENOMINATOR;
        (reduced as u32).max(minimum_window)
    }

    #[inline]
    fn on_persistent_congestion(&mut self, _now: Timestamp) {
        self.stash = 0;
    }
}
