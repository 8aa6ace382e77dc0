// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Security-System Adapter contract (C7, spec §4.7)
//!
//! Consumed by reactor logic when a credential read arrives. The trait
//! is object-safe (`&self` methods only) so the orchestrator can hold
//! it behind `Arc<dyn SsAdapter + Send + Sync>` and share it across the
//! single worker thread without cloning.

use crate::codec::DoorType;
use crate::error::BridgeError;

/// Outcome of resolving a credential read against the external
/// access-control backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessInfo {
    pub is_valid: bool,
    pub default_floor: i8,
    pub default_door_type: DoorType,
    pub allowed_floors_front: Vec<i8>,
    pub allowed_floors_rear: Vec<i8>,
}

/// Contract between reactor logic and the external access-control
/// backend. A live implementation would wrap a Secusys/WebService
/// client; that client is explicitly out of scope here (spec §1).
pub trait SsAdapter {
    /// Site-wide whitelist of floors that do not require credential
    /// authorization, front door. Not consulted by the §4.4.4 reactions
    /// but must be queryable for future policies.
    fn allowed_floors_front(&self) -> Vec<i8>;

    /// Same, rear door.
    fn allowed_floors_rear(&self) -> Vec<i8>;

    /// Resolve a raw credential read to floor-access decisions.
    fn get_access_info(
        &self,
        credential_bytes: &[u8],
        credential_bit_length: u8,
    ) -> Result<AccessInfo, BridgeError>;
}

/// Default demo adapter: answers every credential with a
/// configuration-driven floor/door and the configured allow-lists, so
/// the binary is runnable end-to-end without a live backend. Mirrors
/// the original `SecuritySystemAdapterSecusys` wiring in spirit, minus
/// the live SOAP client.
pub struct StaticAdapter {
    default_floor: i8,
    default_door_type: DoorType,
    allowed_floors_front: Vec<i8>,
    allowed_floors_rear: Vec<i8>,
}

impl StaticAdapter {
    pub fn new(
        default_floor: i8,
        default_door_type: DoorType,
        allowed_floors_front: Vec<i8>,
        allowed_floors_rear: Vec<i8>,
    ) -> Self {
        Self {
            default_floor,
            default_door_type,
            allowed_floors_front,
            allowed_floors_rear,
        }
    }
}

impl SsAdapter for StaticAdapter {
    fn allowed_floors_front(&self) -> Vec<i8> {
        self.allowed_floors_front.clone()
    }

    fn allowed_floors_rear(&self) -> Vec<i8> {
        self.allowed_floors_rear.clone()
    }

    fn get_access_info(
        &self,
        _credential_bytes: &[u8],
        _credential_bit_length: u8,
    ) -> Result<AccessInfo, BridgeError> {
        Ok(AccessInfo {
            is_valid: true,
            default_floor: self.default_floor,
            default_door_type: self.default_door_type,
            allowed_floors_front: self.allowed_floors_front.clone(),
            allowed_floors_rear: self.allowed_floors_rear.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_adapter_ignores_the_credential_and_returns_configured_info() {
        let adapter = StaticAdapter::new(10, DoorType::Rear, vec![1, 2, 3], vec![]);
        let info = adapter.get_access_info(&[0x0A, 0xBB, 0xCC], 24).unwrap();
        assert!(info.is_valid);
        assert_eq!(info.default_floor, 10);
        assert_eq!(info.default_door_type, DoorType::Rear);
        assert_eq!(info.allowed_floors_front, vec![1, 2, 3]);
        assert!(info.allowed_floors_rear.is_empty());
    }

    #[test]
    fn allowed_floor_queries_match_construction() {
        let adapter = StaticAdapter::new(0, DoorType::Front, vec![1], vec![2, 3]);
        assert_eq!(adapter.allowed_floors_front(), vec![1]);
        assert_eq!(adapter.allowed_floors_rear(), vec![2, 3]);
    }
}
