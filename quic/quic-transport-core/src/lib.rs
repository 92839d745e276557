// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

//! Loss-and-congestion building blocks of a QUIC transport.
//!
//! * [`recovery`] holds the congestion controller, with modified Reno and
//!   CUBIC as interchangeable algorithms.
//! * [`connection::PeerIdRegistry`] tracks the connection IDs issued by the
//!   peer in NEW_CONNECTION_ID frames and applies their retirement.

#[macro_use]
mod macros;

pub mod connection;
pub mod event;
pub mod packet;
pub mod recovery;
pub mod stateless_reset;
pub mod time;
pub mod transport;
