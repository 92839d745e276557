// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A manually advanced clock for deterministic tests

use crate::time::{Duration, Timestamp};

#[derive(Clone, Copy, Debug)]
pub struct Clock {
    now: Timestamp,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            now: Timestamp::from_duration(Duration::from_micros(1)),
        }
    }
}

impl super::Clock for Clock {
    fn get_time(&self) -> Timestamp {
        self.now
    }
}

impl Clock {
    pub fn inc_by(&mut self, duration: Duration) {
        self.now += duration;
    }
}
