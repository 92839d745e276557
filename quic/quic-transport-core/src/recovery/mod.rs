// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub use congestion_controller::{
    calc_initial_cwnd, Algorithm, Config, CongestionController, ParseAlgorithmError, State,
    Statistics, Strategy,
};
pub use cubic::Cubic;
pub use reno::Reno;

pub mod congestion_controller;
pub mod cubic;
pub mod loss;
pub mod reno;

//= https://www.rfc-editor.org/rfc/rfc9002#section-7.2
//# The RECOMMENDED
//# value is 2 * max_datagram_size.
/// The smallest congestion window, in packets of the maximum UDP payload size
pub const MINIMUM_WINDOW_PACKETS: u32 = 2;

//= https://www.rfc-editor.org/rfc/rfc9000#section-14
//# UDP datagrams MUST NOT be fragmented at the IP layer.  In IPv4
//# [IPv4], the Don't Fragment (DF) bit MUST be set if possible, to
//# prevent fragmentation on the path.
//#
//# ... an endpoint MUST NOT send a UDP datagram with a payload smaller
//# than 1200 bytes
/// The smallest maximum UDP payload size a QUIC path can have
pub const MINIMUM_MAX_UDP_PAYLOAD_SIZE: u16 = 1200;
