// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod id;
pub mod peer_id_registry;

pub use id::PeerId;
pub use peer_id_registry::{
    PeerIdRegistrationError, PeerIdRegistry, PeerIdRetirementError, RetiredSequences,
    ACTIVE_CONNECTION_ID_LIMIT,
};
