// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Tracks the connection IDs issued by the peer.
//!
//! The registry holds up to [`ACTIVE_CONNECTION_ID_LIMIT`] connection IDs in a
//! fixed array of slots. Slot 0 always holds the connection ID currently used
//! to address packets to the peer, once one has been registered. Retired slots
//! are kept as reservations for sequence numbers the peer is expected to issue
//! next.

use crate::{
    connection::{
        peer_id_registry::PeerIdRegistrationError::{
            ExceededActiveConnectionIdLimit, InvalidNewConnectionId, InvalidRetirePriorTo,
        },
        PeerId,
    },
    event::_debug,
    stateless_reset, transport,
};
use core::fmt;
use smallvec::SmallVec;


//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# This is an integer value
//# specifying the maximum number of connection IDs from the peer that
//# an endpoint is willing to store.  This value includes the
//# connection ID received during the handshake, that received in the
//# preferred_address transport parameter, and those received in
//# NEW_CONNECTION_ID frames.  The value of the
//# active_connection_id_limit parameter MUST be at least 2.
pub const ACTIVE_CONNECTION_ID_LIMIT: usize = 4;

//= https://www.rfc-editor.org/rfc/rfc9000#section-5.1.2
//# An endpoint SHOULD allow for sending and tracking a
//# number of RETIRE_CONNECTION_ID frames of at least twice the value of
//# the active_connection_id_limit transport parameter.
const RETIRED_CONNECTION_ID_LIMIT: usize = ACTIVE_CONNECTION_ID_LIMIT * 2;

/// Sequence numbers retired by a single call, in ascending slot order
pub type RetiredSequences = SmallVec<[u64; ACTIVE_CONNECTION_ID_LIMIT]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PeerIdInfo {
    //= https://www.rfc-editor.org/rfc/rfc9000#section-5.1.1
    //# Each Connection ID has an associated sequence number to assist in
    //# detecting when NEW_CONNECTION_ID or RETIRE_CONNECTION_ID frames refer
    //# to the same value.
    sequence: u64,
    id: PeerId,
    //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
    //# A 128-bit value that will be used for a stateless reset when the
    //# associated connection ID is used.
    stateless_reset_token: stateless_reset::Token,
}

impl PeerIdInfo {
    //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
    //# If an endpoint receives a NEW_CONNECTION_ID frame that repeats a
    //# previously issued connection ID with a different Stateless Reset
    //# Token field value or a different Sequence Number field value, or if a
    //# sequence number is used for different connection IDs, the endpoint
    //# MAY treat that receipt as a connection error of type
    //# PROTOCOL_VIOLATION.
    /// Returns `Ok(true)` if the new connection ID repeats this one exactly
    fn validate_new_connection_id(
        &self,
        sequence: u64,
        id: &PeerId,
        stateless_reset_token: &stateless_reset::Token,
    ) -> Result<bool, PeerIdRegistrationError> {
        let id_is_equal = self.id == *id;
        let reset_token_is_equal = self.stateless_reset_token == *stateless_reset_token;

        if self.sequence == sequence {
            ensure!(id_is_equal && reset_token_is_equal, Err(InvalidNewConnectionId));
            return Ok(true);
        }

        //= https://www.rfc-editor.org/rfc/rfc9000#section-10.3.2
        //# Endpoints are not required to compare new values
        //# against all previous values, but a duplicate value MAY be treated as
        //# a connection error of type PROTOCOL_VIOLATION.
        ensure!(!id_is_equal && !reset_token_is_equal, Err(InvalidNewConnectionId));

        Ok(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    /// The slot has never been used
    Free,
    /// The slot is kept for a sequence number the peer is expected to issue
    Reserved { sequence: u64 },
    Active(PeerIdInfo),
}

impl Slot {
    #[inline]
    fn active(&self) -> Option<&PeerIdInfo> {
        match self {
            Self::Active(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    fn is_available(&self) -> bool {
        !matches!(self, Self::Active(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PeerIdRegistrationError {
    /// The NEW_CONNECTION_ID frame was invalid
    InvalidNewConnectionId,
    /// The active_connection_id_limit was exceeded
    ExceededActiveConnectionIdLimit,
    /// The retire_prior_to value was larger than the sequence number
    InvalidRetirePriorTo,
}

impl PeerIdRegistrationError {
    fn message(&self) -> &'static str {
        match self {
            PeerIdRegistrationError::InvalidNewConnectionId => {
                "The new connection ID had an invalid sequence_number or stateless_reset_token"
            }
            PeerIdRegistrationError::ExceededActiveConnectionIdLimit => {
                "The active_connection_id_limit has been exceeded"
            }
            PeerIdRegistrationError::InvalidRetirePriorTo => {
                "The retire_prior_to value was greater than the sequence_number"
            }
        }
    }
}

impl fmt::Display for PeerIdRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PeerIdRegistrationError {}

impl From<PeerIdRegistrationError> for transport::Error {
    fn from(err: PeerIdRegistrationError) -> Self {
        let transport_error = match err {
            //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
            //# If an endpoint receives a NEW_CONNECTION_ID frame that repeats a
            //# previously issued connection ID with a different Stateless Reset
            //# Token field value or a different Sequence Number field value, or if a
            //# sequence number is used for different connection IDs, the endpoint
            //# MAY treat that receipt as a connection error of type
            //# PROTOCOL_VIOLATION.
            PeerIdRegistrationError::InvalidNewConnectionId => transport::Error::PROTOCOL_VIOLATION,
            //= https://www.rfc-editor.org/rfc/rfc9000#section-5.1.1
            //# After processing a NEW_CONNECTION_ID frame and
            //# adding and retiring active connection IDs, if the number of active
            //# connection IDs exceeds the value advertised in its
            //# active_connection_id_limit transport parameter, an endpoint MUST
            //# close the connection with an error of type CONNECTION_ID_LIMIT_ERROR.
            PeerIdRegistrationError::ExceededActiveConnectionIdLimit => {
                transport::Error::CONNECTION_ID_LIMIT_ERROR
            }
            //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
            //# Receiving a value in the Retire Prior To field that is greater than
            //# that in the Sequence Number field MUST be treated as a connection
            //# error of type FRAME_ENCODING_ERROR.
            PeerIdRegistrationError::InvalidRetirePriorTo => transport::Error::FRAME_ENCODING_ERROR,
        };
        transport_error
            .with_frame_type(transport::error::NEW_CONNECTION_ID_FRAME_TYPE)
            .with_reason(err.message())
    }
}

/// Misuse of [`PeerIdRegistry::unregister`] by the caller
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PeerIdRetirementError {
    /// No connection ID with the sequence number is registered or known to be retired
    UnknownSequenceNumber,
    /// The connection ID in use cannot be retired without another one to replace it
    NoReplacementConnectionId,
}

impl fmt::Display for PeerIdRetirementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSequenceNumber => f.write_str("unknown connection ID sequence number"),
            Self::NoReplacementConnectionId => {
                f.write_str("the connection ID in use has no replacement")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PeerIdRetirementError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerIdRegistry {
    slots: [Slot; ACTIVE_CONNECTION_ID_LIMIT],
    /// The largest sequence number registered or reserved so far
    largest_sequence_expected: u64,
    /// The largest retire prior to value applied; every sequence number below it is retired
    retire_prior_to: u64,
    /// Sequence numbers at or above `retire_prior_to` retired one at a time
    retired: SmallVec<[u64; RETIRED_CONNECTION_ID_LIMIT]>,
    /// Every sequence number below this value that is not registered is retired
    ///
    /// Raised when a sequence number is evicted from `retired`.
    retired_floor: u64,
}

impl Default for PeerIdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerIdRegistry {
    pub fn new() -> Self {
        Self {
            slots: [Slot::Free; ACTIVE_CONNECTION_ID_LIMIT],
            largest_sequence_expected: 0,
            retire_prior_to: 0,
            retired: SmallVec::new(),
            retired_floor: 0,
        }
    }

    /// Registers a connection ID issued by the peer
    ///
    /// Repeated registrations of the same connection ID and registrations of
    /// sequence numbers that were already retired succeed without changing
    /// the registry. Errors leave the registry unchanged.
    pub fn register(
        &mut self,
        sequence: u64,
        id: &PeerId,
        stateless_reset_token: &stateless_reset::Token,
    ) -> Result<(), PeerIdRegistrationError> {
        //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
        //# Upon receipt of a NEW_CONNECTION_ID frame, if the endpoint has
        //# already retired a connection ID with the same sequence number, it
        //# MUST NOT add that connection ID to its set of active connection IDs.
        if self.is_retired(sequence) {
            _debug!(sequence, "ignoring retired peer connection ID");
            return Ok(());
        }

        for info in self.slots.iter().filter_map(Slot::active) {
            //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
            //# Receipt of the same frame multiple times MUST NOT be treated as a
            //# connection error.
            if info.validate_new_connection_id(sequence, id, stateless_reset_token)? {
                return Ok(());
            }
        }

        //= https://www.rfc-editor.org/rfc/rfc9000#section-5.1.1
        //# An endpoint that receives more connection IDs than its advertised
        //# active_connection_id_limit MUST close the connection with an error
        //# of type CONNECTION_ID_LIMIT_ERROR.
        let index = self.slot_for(sequence).ok_or(ExceededActiveConnectionIdLimit)?;

        self.slots[index] = Slot::Active(PeerIdInfo {
            sequence,
            id: *id,
            stateless_reset_token: *stateless_reset_token,
        });
        self.largest_sequence_expected = self.largest_sequence_expected.max(sequence);

        _debug!(sequence, slot = index, "registered peer connection ID");

        self.check_consistency();
        Ok(())
    }

    /// Retires the connection ID with the given sequence number
    ///
    /// Retiring the connection ID in use promotes the active connection ID with
    /// the lowest sequence number in its place.
    pub fn unregister(&mut self, sequence: u64) -> Result<(), PeerIdRetirementError> {
        let Some(index) = self.position(sequence) else {
            ensure!(
                self.is_retired(sequence),
                Err(PeerIdRetirementError::UnknownSequenceNumber)
            );
            return Ok(());
        };

        let index = if index == 0 {
            let successor = self
                .successor(|_| true)
                .ok_or(PeerIdRetirementError::NoReplacementConnectionId)?;
            self.promote(successor);
            successor
        } else {
            index
        };

        self.retire_slot(index);
        self.check_consistency();
        Ok(())
    }

    //= https://www.rfc-editor.org/rfc/rfc9000#section-5.1.2
    //# An endpoint can cause its peer to retire connection IDs by sending a
    //# NEW_CONNECTION_ID frame with an increased Retire Prior To field.
    /// Retires every connection ID with a sequence number below `retire_prior_to`
    ///
    /// The connection ID in use is only retired if a connection ID at or above
    /// `retire_prior_to` can replace it; otherwise it stays in use and is not
    /// included in the result. A connection ID kept in use this way is retired
    /// by a later call once a replacement has been registered, even if that
    /// call does not raise `retire_prior_to`.
    pub fn unregister_prior_to(&mut self, retire_prior_to: u64) -> RetiredSequences {
        let mut retired = RetiredSequences::new();

        if retire_prior_to > self.retire_prior_to {
            self.retire_prior_to = retire_prior_to;
            self.retired.retain(|sequence| *sequence >= retire_prior_to);
        }

        self.retire_slots_prior_to(self.retire_prior_to, &mut retired);
        self.check_consistency();

        retired
    }

    //= https://www.rfc-editor.org/rfc/rfc9000#section-19.15
    //# Upon receipt of an increased Retire Prior To field, the peer MUST
    //# stop using the corresponding connection IDs and retire them with
    //# RETIRE_CONNECTION_ID frames before adding the newly provided
    //# connection ID to the set of active connection IDs.
    /// Applies a NEW_CONNECTION_ID frame, returning the sequence numbers it retired
    ///
    /// The newly issued connection ID may replace the connection ID in use. On
    /// error the registry is left unchanged.
    pub fn on_new_connection_id(
        &mut self,
        sequence: u64,
        retire_prior_to: u64,
        id: &PeerId,
        stateless_reset_token: &stateless_reset::Token,
    ) -> Result<RetiredSequences, PeerIdRegistrationError> {
        ensure!(retire_prior_to <= sequence, Err(InvalidRetirePriorTo));

        let backup = self.clone();
        let mut retired = self.unregister_prior_to(retire_prior_to);

        if let Err(error) = self.register(sequence, id, stateless_reset_token) {
            *self = backup;
            return Err(error);
        }

        // the new connection ID can replace the one in use
        self.retire_slots_prior_to(self.retire_prior_to, &mut retired);
        self.check_consistency();

        Ok(retired)
    }

    /// Returns the connection ID in use and its stateless reset token
    #[inline]
    pub fn active_id(&self) -> Option<(PeerId, stateless_reset::Token)> {
        self.slots[0]
            .active()
            .map(|info| (info.id, info.stateless_reset_token))
    }

    /// Returns the sequence number of the connection ID in use
    #[inline]
    pub fn active_sequence(&self) -> Option<u64> {
        self.slots[0].active().map(|info| info.sequence)
    }

    /// Returns true if the connection ID is registered and not retired
    #[inline]
    pub fn is_active(&self, id: &PeerId) -> bool {
        self.slots
            .iter()
            .filter_map(Slot::active)
            .any(|info| info.id == *id)
    }

    /// Returns the number of registered connection IDs
    #[inline]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter_map(Slot::active).count()
    }

    #[inline]
    pub fn largest_sequence_expected(&self) -> u64 {
        self.largest_sequence_expected
    }

    /// Returns the largest retire prior to value applied
    #[inline]
    pub fn retire_prior_to(&self) -> u64 {
        self.retire_prior_to
    }

    /// Returns true if the sequence number is known to be retired
    #[inline]
    fn is_retired(&self, sequence: u64) -> bool {
        sequence < self.retire_prior_to
            || self.retired.contains(&sequence)
            || (sequence < self.retired_floor && self.position(sequence).is_none())
    }

    /// Returns the slot index of the active connection ID with the sequence number
    #[inline]
    fn position(&self, sequence: u64) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.active().is_some_and(|info| info.sequence == sequence))
    }

    /// Returns the slot a new connection ID with the sequence number is stored in
    #[inline]
    fn slot_for(&self, sequence: u64) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| *slot == Slot::Reserved { sequence })
            .or_else(|| self.slots.iter().position(Slot::is_available))
    }

    /// Returns the slot holding the lowest sequence number outside of slot 0
    /// that satisfies the predicate
    #[inline]
    fn successor<F: Fn(u64) -> bool>(&self, predicate: F) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, slot)| Some((index, slot.active()?.sequence)))
            .filter(|(_, sequence)| predicate(*sequence))
            .min_by_key(|(_, sequence)| *sequence)
            .map(|(index, _)| index)
    }

    /// Moves the connection ID in `index` into use
    #[inline]
    fn promote(&mut self, index: usize) {
        debug_assert_ne!(index, 0);
        self.slots.swap(0, index);
        _debug!(sequence = self.active_sequence(), "promoted peer connection ID");
    }

    fn retire_slots_prior_to(&mut self, retire_prior_to: u64, retired: &mut RetiredSequences) {
        let is_retiring =
            |slot: &Slot| slot.active().is_some_and(|info| info.sequence < retire_prior_to);

        // the connection ID in use is only retired if another one can replace it
        let successor = if is_retiring(&self.slots[0]) {
            self.successor(|sequence| sequence >= retire_prior_to)
        } else {
            None
        };
        let first = if successor.is_some() { 0 } else { 1 };

        // sequence numbers are reported in slot order before the replacement moves into slot 0
        retired.extend(
            self.slots[first..]
                .iter()
                .filter(|slot| is_retiring(slot))
                .filter_map(|slot| Some(slot.active()?.sequence)),
        );

        if let Some(successor) = successor {
            self.promote(successor);
        }

        for index in 1..ACTIVE_CONNECTION_ID_LIMIT {
            if is_retiring(&self.slots[index]) {
                self.retire_slot(index);
            }
        }
    }

    /// Retires the connection ID in `index`, reserving the slot for the next expected sequence
    fn retire_slot(&mut self, index: usize) {
        debug_assert_ne!(index, 0, "the connection ID in use must be replaced first");

        let Some(sequence) = self.slots[index].active().map(|info| info.sequence) else {
            return;
        };

        self.largest_sequence_expected += 1;
        self.slots[index] = Slot::Reserved {
            sequence: self.largest_sequence_expected,
        };

        if sequence >= self.retire_prior_to.max(self.retired_floor)
            && !self.retired.contains(&sequence)
        {
            if self.retired.len() == RETIRED_CONNECTION_ID_LIMIT {
                if let Some((position, oldest)) = self
                    .retired
                    .iter()
                    .copied()
                    .enumerate()
                    .min_by_key(|(_, retired)| *retired)
                {
                    // everything up to the evicted sequence number stays retired
                    self.retired.swap_remove(position);
                    self.retired_floor = self.retired_floor.max(oldest + 1);
                }
            }
            self.retired.push(sequence);
        }

        _debug!(
            sequence,
            slot = index,
            reserved = self.largest_sequence_expected,
            "retired peer connection ID"
        );
    }

    /// Validate that the registry is in a consistent state
    fn check_consistency(&self) {
        if cfg!(debug_assertions) {
            let slots = &self.slots;

            // a registered connection ID is always in use
            if slots.iter().any(|slot| slot.active().is_some()) {
                assert!(slots[0].active().is_some());
            }

            for (index, slot) in slots.iter().enumerate() {
                let sequence = match slot {
                    Slot::Free => continue,
                    Slot::Reserved { sequence } => *sequence,
                    Slot::Active(info) => info.sequence,
                };
                assert!(sequence <= self.largest_sequence_expected);

                for other in &slots[index + 1..] {
                    match (slot, other) {
                        (Slot::Active(a), Slot::Active(b)) => {
                            assert_ne!(a.sequence, b.sequence);
                            assert_ne!(a.id, b.id);
                            assert_ne!(a.stateless_reset_token, b.stateless_reset_token);
                        }
                        (Slot::Reserved { sequence: a }, Slot::Reserved { sequence: b }) => {
                            assert_ne!(a, b);
                        }
                        _ => {}
                    }
                }
            }

            assert!(self.retired.len() <= RETIRED_CONNECTION_ID_LIMIT);
            assert!(self.retired.iter().all(|sequence| *sequence >= self.retired_floor));
        }
    }
}
