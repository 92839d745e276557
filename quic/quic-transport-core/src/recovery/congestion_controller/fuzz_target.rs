// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    packet::number::PacketNumber,
    recovery::{
        calc_initial_cwnd, loss::testing::Context, Algorithm, Config, CongestionController,
        MINIMUM_MAX_UDP_PAYLOAD_SIZE,
    },
    time::Duration,
};
use bolero::{check, generator::*};
use std::collections::VecDeque;

#[derive(Debug, TypeGenerator)]
enum Operation {
    IncrementTime {
        /// The milli-second value by which to increase the timestamp
        millis: u16,
    },
    PacketSent {
        #[generator(1..=255)]
        count: u8,
    },
    RttUpdated {
        #[generator(1..=2000)]
        millis: u16,
    },
    AckReceived {
        #[generator(1..=255)]
        count: u8,
    },
    PacketLost,
    PersistentCongestion,
}

struct Model {
    /// The congestion controller being fuzzed
    subject: CongestionController,
    /// Tracks packets inflight
    sent_packets: VecDeque<PacketNumber>,
    next_packet_number: PacketNumber,
    context: Context,
    max_udp_payload_size: u16,
}

impl Model {
    fn new(config: Config, max_udp_payload_size: u16) -> Self {
        Self {
            subject: CongestionController::new(
                config,
                calc_initial_cwnd(max_udp_payload_size),
                max_udp_payload_size,
            ),
            sent_packets: VecDeque::new(),
            next_packet_number: PacketNumber::default(),
            context: Context::default(),
            max_udp_payload_size,
        }
    }

    fn apply(&mut self, operation: &Operation) {
        match operation {
            Operation::IncrementTime { millis } => {
                self.context.advance(Duration::from_millis(*millis as u64));
            }
            Operation::PacketSent { count } => {
                for _ in 0..*count {
                    let packet_number = self.next_packet_number;
                    self.sent_packets.push_back(packet_number);
                    self.next_packet_number = PacketNumber::new(packet_number.as_u64() + 1);
                }
            }
            Operation::RttUpdated { millis } => {
                let rtt = Duration::from_millis(*millis as u64);
                self.context.smoothed_rtt = rtt;
                self.context.min_rtt = self.context.min_rtt.min(rtt);
            }
            Operation::AckReceived { count } => {
                let count = (*count as usize).min(self.sent_packets.len());
                let bytes_in_flight = self.bytes_in_flight();
                let Some(largest_acked) = self.sent_packets.drain(..count).last() else {
                    return;
                };
                let bytes_acknowledged = count as u32 * self.max_udp_payload_size as u32;
                self.on_acked(bytes_acknowledged, largest_acked, bytes_in_flight);
            }
            Operation::PacketLost => {
                if let Some(lost_packet_number) = self.sent_packets.pop_front() {
                    self.on_lost(lost_packet_number);
                }
            }
            Operation::PersistentCongestion => {
                let cwnd = self.subject.congestion_window();
                self.subject.on_persistent_congestion(&self.context);
                assert_eq!(self.subject.congestion_window(), self.subject.minimum_window());
                assert!(self.subject.congestion_window() <= cwnd);
                assert!(self.subject.is_slow_start());
                assert_eq!(self.subject.recovery_end(), None);
            }
        }
    }

    fn on_acked(
        &mut self,
        bytes_acknowledged: u32,
        largest_acked: PacketNumber,
        bytes_in_flight: u32,
    ) {
        let fenced = self.subject.is_in_recovery(largest_acked);
        let cwnd = self.subject.congestion_window();
        let recovery_end = self.subject.recovery_end();

        self.subject.on_acked(
            &self.context,
            bytes_acknowledged,
            largest_acked,
            bytes_in_flight,
            self.max_udp_payload_size,
        );

        // acknowledgements never shrink the window or move the recovery period
        assert!(cwnd <= self.subject.congestion_window());
        assert_eq!(recovery_end, self.subject.recovery_end());
        if fenced {
            assert_eq!(cwnd, self.subject.congestion_window());
        }
    }

    fn on_lost(&mut self, lost_packet_number: PacketNumber) {
        let fenced = self.subject.is_in_recovery(lost_packet_number);
        let cwnd = self.subject.congestion_window();
        let recovery_end = self.subject.recovery_end();
        let loss_episodes = self.subject.statistics().num_loss_episodes;

        self.subject.on_lost(
            &self.context,
            self.max_udp_payload_size as u32,
            lost_packet_number,
            self.next_packet_number,
            self.max_udp_payload_size,
        );

        if fenced {
            assert_eq!(cwnd, self.subject.congestion_window());
            assert_eq!(recovery_end, self.subject.recovery_end());
            assert_eq!(loss_episodes, self.subject.statistics().num_loss_episodes);
        } else {
            assert!(self.subject.congestion_window() <= cwnd);
            assert_eq!(self.subject.congestion_window(), self.subject.slow_start_threshold());
            assert_eq!(self.subject.recovery_end(), self.next_packet_number.prev());
            assert_eq!(loss_episodes + 1, self.subject.statistics().num_loss_episodes);
        }
    }

    fn bytes_in_flight(&self) -> u32 {
        self.sent_packets.len() as u32 * self.max_udp_payload_size as u32
    }

    fn invariants(&self) {
        let cwnd = self.subject.congestion_window();
        let stats = self.subject.statistics();

        assert!(self.subject.minimum_window() <= cwnd);
        assert!(cwnd <= self.subject.maximum_window());
        assert!(stats.cwnd_minimum <= cwnd);
        assert!(cwnd <= stats.cwnd_maximum);
    }
}

#[test]
fn congestion_controller_fuzz() {
    check!()
        .with_type::<(Algorithm, u16, Option<u32>, Vec<Operation>)>()
        .for_each(|(algorithm, payload_size, maximum_window, operations)| {
            let max_udp_payload_size = MINIMUM_MAX_UDP_PAYLOAD_SIZE + payload_size % 7801;
            let mut config = Config::new(*algorithm);
            if let Some(maximum_window) = maximum_window {
                config = config.with_maximum_window(*maximum_window);
            }

            let mut model = Model::new(config, max_udp_payload_size);
            model.invariants();

            for operation in operations.iter() {
                model.apply(operation);
                model.invariants();
            }
        });
}
