// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A loss-based congestion controller with interchangeable window growth
//! strategies.
//!
//! The controller owns the parts every strategy shares: slow start, the
//! recovery period that collapses a burst of losses into a single congestion
//! event, and the window bounds. The selected [`Strategy`] decides how the
//! window grows in congestion avoidance and how far it is reduced on loss.

use super::{cubic::Cubic, loss, reno::Reno, MINIMUM_WINDOW_PACKETS};
use crate::{
    event::{_debug, _trace},
    packet::number::PacketNumber,
    time::{Duration, Timestamp},
};
use core::{fmt, str::FromStr};

#[cfg(test)]
mod fuzz_target;

//= https://www.rfc-editor.org/rfc/rfc9002#section-7.2
//# Endpoints SHOULD use an initial congestion
//# window of ten times the maximum datagram size (max_datagram_size),
//# while limiting the window to the larger of 14,720 bytes or twice the
//# maximum datagram size.
const INITIAL_WINDOW_PACKETS: u32 = 10;

/// The largest payload that fits in an Ethernet frame after the IPv4 and UDP headers
const MAX_UDP_PAYLOAD_SIZE_LIMIT: u16 = 1472;

/// Returns the initial congestion window for a path with the given maximum UDP payload size
///
/// ```
/// # use quic_transport_core::recovery::calc_initial_cwnd;
/// assert_eq!(calc_initial_cwnd(1200), 12000);
/// assert_eq!(calc_initial_cwnd(9000), 14720);
/// ```
#[inline]
pub fn calc_initial_cwnd(max_udp_payload_size: u16) -> u32 {
    INITIAL_WINDOW_PACKETS * max_udp_payload_size.min(MAX_UDP_PAYLOAD_SIZE_LIMIT) as u32
}

/// The window growth strategy used in congestion avoidance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(any(test, feature = "generator"), derive(bolero_generator::TypeGenerator))]
pub enum Algorithm {
    /// NewReno with byte counting, growing by one datagram per window acknowledged
    #[default]
    Reno,
    /// CUBIC as described in RFC 8312
    Cubic,
}

impl Algorithm {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reno => "reno",
            Self::Cubic => "cubic",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseAlgorithmError;

impl fmt::Display for ParseAlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown congestion control algorithm; expected `reno` or `cubic`")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseAlgorithmError {}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("reno") {
            Ok(Self::Reno)
        } else if s.eq_ignore_ascii_case("cubic") {
            Ok(Self::Cubic)
        } else {
            Err(ParseAlgorithmError)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// The algorithm used in congestion avoidance
    pub algorithm: Algorithm,
    /// The smallest window, in multiples of the maximum UDP payload size
    pub minimum_window_packets: u32,
    /// The largest window, in bytes
    pub maximum_window: u32,
}

impl Config {
    /// The behavior recommended by RFC 9002
    pub const RFC9002: Self = Self::new(Algorithm::Reno);

    /// The behavior tuned for throughput on paths with a large bandwidth-delay product
    pub const PERFORMANT: Self = Self::new(Algorithm::Cubic);

    #[inline]
    pub const fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            minimum_window_packets: MINIMUM_WINDOW_PACKETS,
            maximum_window: u32::MAX,
        }
    }

    #[inline]
    pub const fn with_maximum_window(mut self, maximum_window: u32) -> Self {
        self.maximum_window = maximum_window;
        self
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::RFC9002
    }
}

/// Window statistics for a single path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    /// The window the controller was created with
    pub cwnd_initial: u32,
    /// The window at the time slow start ended, if it has
    pub cwnd_exiting_slow_start: Option<u32>,
    /// The smallest window observed
    pub cwnd_minimum: u32,
    /// The largest window observed
    pub cwnd_maximum: u32,
    /// The number of congestion events caused by loss
    pub num_loss_episodes: u32,
    /// The total number of bytes acknowledged
    pub bytes_acked: u64,
    /// The total number of bytes declared lost
    pub bytes_lost: u64,
    /// The largest number of bytes in flight reported with an acknowledgement
    pub max_bytes_in_flight: u32,
}

impl Statistics {
    #[inline]
    fn new(cwnd_initial: u32) -> Self {
        Self {
            cwnd_initial,
            cwnd_minimum: cwnd_initial,
            cwnd_maximum: cwnd_initial,
            ..Default::default()
        }
    }

    #[inline]
    fn observe(&mut self, congestion_window: u32) {
        self.cwnd_minimum = self.cwnd_minimum.min(congestion_window);
        self.cwnd_maximum = self.cwnd_maximum.max(congestion_window);
    }
}

/// The per-algorithm part of the controller
///
/// Implementations only see plain values so the controller can dispatch to
/// them through a trait object. The returned windows are clamped to the
/// configured bounds by the controller.
pub trait Strategy {
    /// Called for acknowledgements received in congestion avoidance outside
    /// of a recovery period. Returns the new congestion window.
    fn on_congestion_avoidance(
        &mut self,
        congestion_window: u32,
        bytes_acknowledged: u32,
        now: Timestamp,
        rtt: Duration,
        max_udp_payload_size: u16,
    ) -> u32;

    /// Called when a loss starts a new congestion event. Returns the reduced
    /// congestion window, which also becomes the slow start threshold.
    fn on_congestion_event(
        &mut self,
        congestion_window: u32,
        minimum_window: u32,
        now: Timestamp,
        max_udp_payload_size: u16,
    ) -> u32;

    /// Called when the window collapses to the minimum after persistent congestion
    fn on_persistent_congestion(&mut self, now: Timestamp);
}

/// The state owned by the selected algorithm
#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Reno(Reno),
    Cubic(Cubic),
}

impl State {
    #[inline]
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Reno => Self::Reno(Reno::default()),
            Algorithm::Cubic => Self::Cubic(Cubic::default()),
        }
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Reno(_) => Algorithm::Reno,
            Self::Cubic(_) => Algorithm::Cubic,
        }
    }

    #[inline]
    fn strategy(&mut self) -> &mut dyn Strategy {
        match self {
            Self::Reno(reno) => reno,
            Self::Cubic(cubic) => cubic,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CongestionController {
    config: Config,
    state: State,
    //= https://www.rfc-editor.org/rfc/rfc9002#appendix-B.2
    //# congestion_window:  The maximum number of bytes allowed to be in
    //#    flight.
    congestion_window: u32,
    //= https://www.rfc-editor.org/rfc/rfc9002#appendix-B.2
    //# ssthresh:  Slow start threshold in bytes.  When the congestion window
    //#    is below ssthresh, the mode is slow start and the window grows by
    //#    the number of bytes acknowledged.
    slow_start_threshold: u32,
    /// The largest packet number sent before the current congestion event
    recovery_end: Option<PacketNumber>,
    /// The path's maximum UDP payload size, which sizes the minimum window
    max_udp_payload_size: u16,
    stats: Statistics,
}

impl CongestionController {
    /// Creates a controller starting from `initial_window` bytes
    ///
    /// The initial window is typically [`calc_initial_cwnd`] of the path's
    /// `max_udp_payload_size`, which also fixes the minimum window for the
    /// life of the controller.
    pub fn new(config: Config, initial_window: u32, max_udp_payload_size: u16) -> Self {
        let mut controller = Self {
            config,
            state: State::new(config.algorithm),
            congestion_window: initial_window,
            //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.1
            //# A NewReno sender is in slow start any time the congestion window is
            //# below the slow start threshold.  A sender begins in slow start
            //# because the slow start threshold is initialized to an infinite
            //# value.
            slow_start_threshold: u32::MAX,
            recovery_end: None,
            max_udp_payload_size,
            stats: Statistics::default(),
        };

        controller.clamp_window();
        controller.stats = Statistics::new(controller.congestion_window);

        _debug!(
            algorithm = %config.algorithm,
            cwnd = controller.congestion_window,
            "congestion controller initialized"
        );

        controller.check_consistency();
        controller
    }

    /// Called when packets are acknowledged
    ///
    /// `largest_acked` is the largest newly acknowledged packet number and
    /// `bytes_in_flight` is the number of bytes that were in flight when it was sent.
    pub fn on_acked<Ctx: loss::Context>(
        &mut self,
        context: &Ctx,
        bytes_acknowledged: u32,
        largest_acked: PacketNumber,
        bytes_in_flight: u32,
        max_udp_payload_size: u16,
    ) {
        self.stats.bytes_acked += bytes_acknowledged as u64;
        self.stats.max_bytes_in_flight = self.stats.max_bytes_in_flight.max(bytes_in_flight);

        //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.2
        //# The recovery period aims to limit congestion window reduction to
        //# once per round trip.  Therefore, during a recovery period, the
        //# congestion window does not change in response to new losses or
        //# increases in the ECN-CE count.
        if self.is_in_recovery(largest_acked) {
            _trace!(%largest_acked, "acknowledgement within recovery period");
            return;
        }

        if self.is_slow_start() {
            //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.1
            //# While a sender is in slow start, the congestion window
            //# increases by the number of bytes acknowledged when each
            //# acknowledgment is processed.
            self.congestion_window = self.congestion_window.saturating_add(bytes_acknowledged);
            self.clamp_window();

            if !self.is_slow_start() && self.stats.cwnd_exiting_slow_start.is_none() {
                self.stats.cwnd_exiting_slow_start = Some(self.congestion_window);
                _debug!(cwnd = self.congestion_window, "exited slow start");
            }
        } else {
            let now = context.now();
            let rtt = context.smoothed_rtt();
            self.congestion_window = self.state.strategy().on_congestion_avoidance(
                self.congestion_window,
                bytes_acknowledged,
                now,
                rtt,
                max_udp_payload_size,
            );
        }

        _trace!(
            bytes_acknowledged,
            bytes_in_flight,
            cwnd = self.congestion_window,
            "on_acked"
        );

        self.on_window_update();
    }

    /// Called when a packet is declared lost
    ///
    /// `next_packet_number` is the packet number that will be used for the
    /// next packet sent.
    pub fn on_lost<Ctx: loss::Context>(
        &mut self,
        context: &Ctx,
        lost_bytes: u32,
        lost_packet_number: PacketNumber,
        next_packet_number: PacketNumber,
        max_udp_payload_size: u16,
    ) {
        self.stats.bytes_lost += lost_bytes as u64;

        //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.2
        //# A recovery period ends and the sender enters congestion avoidance
        //# when a packet sent during the recovery period is acknowledged.
        if self.is_in_recovery(lost_packet_number) {
            _trace!(%lost_packet_number, lost_bytes, "loss within recovery period");
            return;
        }

        //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.2
        //# On entering a recovery period, a sender MUST set the slow start
        //# threshold to half the value of the congestion window when loss is
        //# detected.
        let recovery_end = next_packet_number
            .prev()
            .map_or(lost_packet_number, |end| end.max(lost_packet_number));
        self.recovery_end = Some(recovery_end);
        self.stats.num_loss_episodes += 1;
        if self.stats.cwnd_exiting_slow_start.is_none() {
            self.stats.cwnd_exiting_slow_start = Some(self.congestion_window);
        }

        let previous_window = self.congestion_window;
        let minimum_window = self.minimum_window();
        let reduced = self.state.strategy().on_congestion_event(
            previous_window,
            minimum_window,
            context.now(),
            max_udp_payload_size,
        );
        //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.2
        //# The sender MUST set the congestion
        //# window to the reduced value of the slow start threshold before
        //# exiting the recovery period.
        self.congestion_window = reduced
            .clamp(minimum_window, self.maximum_window())
            .min(previous_window);
        self.slow_start_threshold = self.congestion_window;

        _debug!(
            %lost_packet_number,
            %recovery_end,
            cwnd = self.congestion_window,
            ssthresh = self.slow_start_threshold,
            "congestion event"
        );

        self.on_window_update();
    }

    //= https://www.rfc-editor.org/rfc/rfc9002#section-7.6.2
    //# When persistent congestion is declared, the sender's congestion
    //# window MUST be reduced to the minimum congestion window
    //# (kMinimumWindow), similar to a TCP sender's response on an RTO.
    /// Called when persistent congestion is detected
    ///
    /// The window collapses to the minimum and the controller returns to slow
    /// start until the next congestion event sets a new threshold.
    pub fn on_persistent_congestion<Ctx: loss::Context>(&mut self, context: &Ctx) {
        self.congestion_window = self.minimum_window();
        self.slow_start_threshold = u32::MAX;
        self.recovery_end = None;
        self.state.strategy().on_persistent_congestion(context.now());

        _debug!(cwnd = self.congestion_window, "persistent congestion");

        self.on_window_update();
    }

    /// The number of bytes allowed to be in flight
    #[inline]
    pub fn congestion_window(&self) -> u32 {
        self.congestion_window
    }

    /// The slow start threshold, `u32::MAX` while no congestion event has
    /// happened since the controller was created or persistent congestion
    /// was declared
    #[inline]
    pub fn slow_start_threshold(&self) -> u32 {
        self.slow_start_threshold
    }

    #[inline]
    pub fn recovery_end(&self) -> Option<PacketNumber> {
        self.recovery_end
    }

    #[inline]
    pub fn is_slow_start(&self) -> bool {
        self.congestion_window < self.slow_start_threshold
    }

    /// Returns true if the given packet was sent before the current
    /// congestion event and therefore cannot change the window
    #[inline]
    pub fn is_in_recovery(&self, packet_number: PacketNumber) -> bool {
        self.recovery_end.is_some_and(|recovery_end| packet_number <= recovery_end)
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.state.algorithm()
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    //= https://www.rfc-editor.org/rfc/rfc9002#section-7.2
    //# The minimum congestion window is the smallest value the congestion
    //# window can attain in response to loss, an increase in the peer-
    //# reported ECN-CE count, or persistent congestion.
    #[inline]
    pub fn minimum_window(&self) -> u32 {
        self.config
            .minimum_window_packets
            .saturating_mul(self.max_udp_payload_size as u32)
            .min(self.config.maximum_window)
    }

    #[inline]
    pub fn maximum_window(&self) -> u32 {
        self.config.maximum_window
    }

    #[inline]
    fn clamp_window(&mut self) {
        self.congestion_window = self
            .congestion_window
            .clamp(self.minimum_window(), self.maximum_window());
    }

    /// Applies the window bounds after a change and records the result
    #[inline]
    fn on_window_update(&mut self) {
        self.clamp_window();
        self.stats.observe(self.congestion_window);
        self.check_consistency();
    }

    #[inline]
    fn check_consistency(&self) {
        if cfg!(debug_assertions) {
            assert!(self.minimum_window() <= self.congestion_window);
            assert!(self.congestion_window <= self.maximum_window());
            assert!(self.stats.cwnd_minimum <= self.congestion_window);
            assert!(self.congestion_window <= self.stats.cwnd_maximum);
        }
    }
}
