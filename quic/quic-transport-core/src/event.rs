// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic events emitted by the congestion controller and the peer ID registry.
//!
//! With the `event-tracing` feature enabled these are forwarded to [`tracing`];
//! otherwise the macros expand to nothing and the arguments are not evaluated.

#[cfg(feature = "event-tracing")]
#[doc(hidden)]
pub use tracing::debug as _debug;

#[cfg(not(feature = "event-tracing"))]
#[doc(hidden)]
pub use crate::__tracing_noop__ as _debug;

#[cfg(feature = "event-tracing")]
#[doc(hidden)]
pub use tracing::trace as _trace;

#[cfg(not(feature = "event-tracing"))]
#[doc(hidden)]
pub use crate::__tracing_noop__ as _trace;
