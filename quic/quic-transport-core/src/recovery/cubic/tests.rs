// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::{
    packet::number::PacketNumber,
    recovery::{loss::testing::Context, Algorithm, Config, CongestionController, State},
    time::Clock as _,
};

const MSS: u16 = 1200;

fn now() -> Timestamp {
    Timestamp::from_duration(Duration::from_secs(1))
}

#[test]
fn congestion_event_test() {
    let mut cubic = Cubic::default();

    assert_eq!(cubic.on_congestion_event(12000, 2400, now(), MSS), 8400);
    assert_eq!(cubic.w_max(), 12000);
    assert_eq!(cubic.w_last_max(), 12000);
    assert_eq!(cubic.avoidance_start(), Some(now()));

    // K = cbrt((12000 - 8400) / 1200 / 0.4) = cbrt(7.5)
    assert!((cubic.k() - 7.5f64.cbrt()).abs() < 1e-9);
}

#[test]
fn congestion_event_at_minimum_window_test() {
    let mut cubic = Cubic::default();

    assert_eq!(cubic.on_congestion_event(2400, 2400, now(), MSS), 2400);
    assert_eq!(cubic.w_max(), 2400);
    assert_eq!(cubic.k(), 0.0);
}

//= https://www.rfc-editor.org/rfc/rfc8312#section-4.6
//# With fast convergence, when a congestion event occurs, before the
//# window reduction of the congestion window, a flow remembers the last
//# value of W_max before it updates W_max for the current congestion
//# event.
#[test]
fn fast_convergence_test() {
    let mut cubic = Cubic::default();

    assert_eq!(cubic.on_congestion_event(100_000, 2400, now(), MSS), 70_000);
    assert_eq!(cubic.w_max(), 100_000);

    // the window did not grow back to the previous maximum
    assert_eq!(cubic.on_congestion_event(80_000, 2400, now(), MSS), 56_000);
    assert_eq!(cubic.w_last_max(), 80_000);
    assert_eq!(cubic.w_max(), 68_000);
    assert!(cubic.w_max() < 80_000);

    // growing past the previous maximum stops the further reduction
    assert_eq!(cubic.on_congestion_event(90_000, 2400, now(), MSS), 63_000);
    assert_eq!(cubic.w_max(), 90_000);
    assert_eq!(cubic.w_last_max(), 90_000);
}

#[test]
fn fast_convergence_through_controller_test() {
    let context = Context::default();
    let mut controller = CongestionController::new(Config::new(Algorithm::Cubic), 100_000, MSS);

    controller.on_lost(&context, 1200, PacketNumber::new(0), PacketNumber::new(10), MSS);
    assert_eq!(controller.congestion_window(), 70_000);

    controller.on_lost(&context, 1200, PacketNumber::new(10), PacketNumber::new(20), MSS);
    assert_eq!(controller.congestion_window(), 49_000);

    match controller.state() {
        State::Cubic(cubic) => {
            // a naive update would remember the window at the second event
            assert!(cubic.w_max() < 70_000);
            assert_eq!(cubic.w_max(), 59_500);
            assert_eq!(cubic.w_last_max(), 70_000);
        }
        state => panic!("unexpected state {state:?}"),
    }
}

//= https://www.rfc-editor.org/rfc/rfc8312#section-4.3
//# cwnd SHOULD be
//# incremented by (W_cubic(t+RTT) - cwnd)/cwnd for each received ACK
#[test]
fn concave_region_test() {
    let mut cubic = Cubic::default();
    cubic.on_congestion_event(12000, 2400, now(), MSS);

    let rtt = Duration::from_secs(1);
    let later = now() + Duration::from_secs(1);

    // W_cubic(2s) is just above w_max, so the window grows by (12000 - 8400) / 8400 * 1200
    assert_eq!(cubic.on_congestion_avoidance(8400, 1200, later, rtt, MSS), 8914);

    // a window above the target is left alone
    assert_eq!(cubic.on_congestion_avoidance(20000, 1200, later, rtt, MSS), 20000);
}

//= https://www.rfc-editor.org/rfc/rfc8312#section-4.2
//# If W_cubic(t) is less than W_est(t), then the protocol is in the TCP
//# friendly region and cwnd SHOULD be set to W_est(t) at each reception
//# of an ACK.
#[test]
fn tcp_friendly_region_test() {
    let mut cubic = Cubic::default();
    cubic.on_congestion_event(12000, 2400, now(), MSS);

    let rtt = Duration::from_millis(10);
    let later = now() + Duration::from_secs(1);

    // W_est(1s) = 12000 * 0.7 + 0.9 / 1.7 * 100 * 1200
    assert_eq!(cubic.on_congestion_avoidance(8400, 1200, later, rtt, MSS), 71929);
}

#[test]
fn avoidance_without_congestion_event_test() {
    let mut cubic = Cubic::default();

    assert_eq!(
        cubic.on_congestion_avoidance(12000, 1200, now(), Duration::from_millis(100), MSS),
        12000
    );
    assert_eq!(cubic.avoidance_start(), Some(now()));
}

#[test]
fn zero_rtt_test() {
    let mut cubic = Cubic::default();
    cubic.on_congestion_event(12000, 2400, now(), MSS);

    let cwnd = cubic.on_congestion_avoidance(
        8400,
        1200,
        now() + Duration::from_secs(1),
        Duration::ZERO,
        MSS,
    );
    assert!(cwnd >= 8400);
}

#[test]
fn persistent_congestion_test() {
    let mut context = Context::default();
    let mut cubic = Cubic::default();
    cubic.on_congestion_event(12000, 2400, context.clock.get_time(), MSS);

    context.advance(Duration::from_secs(3));
    cubic.on_persistent_congestion(context.clock.get_time());

    assert_eq!(cubic.w_max(), 0);
    assert_eq!(cubic.w_last_max(), 0);
    assert_eq!(cubic.k(), 0.0);
    assert_eq!(cubic.avoidance_start(), Some(context.clock.get_time()));
}
