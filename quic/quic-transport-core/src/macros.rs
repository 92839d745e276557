// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Returns early from the current function if the condition is not met
macro_rules! ensure {
    ($cond:expr) => {
        ensure!($cond, ())
    };
    ($cond:expr, $otherwise:expr) => {
        if !($cond) {
            return $otherwise;
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __tracing_noop__ {
    ($($fmt:tt)*) => {};
}
