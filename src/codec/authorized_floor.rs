// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DEC Security Authorized Default Floor V2 (type `0x34`) — spec §3.

use super::{BitMap256, DoorType, PacketId};
use crate::error::{BridgeError, Result};

pub const BODY_LEN: usize = 1 + 16 + 1 + 1 + 1 + 32 + 32 + 1 + 1 + 4 + 4 + 4 + 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizedDefaultFloorV2Packet {
    pub packet_id: PacketId,
    pub valid: u8,
    pub credential_number: [u8; 16],
    pub mode: u8,
    pub features: u8,
    pub reserved1: u8,
    pub authorized_front: BitMap256,
    pub authorized_rear: BitMap256,
    pub default_floor: i8,
    pub default_door: DoorType,
    pub date_time: u32,
    pub local_timezone: i32,
    pub reader_location: u32,
    pub reserved2: [u8; 3],
}

impl AuthorizedDefaultFloorV2Packet {
    pub(super) fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.valid);
        buf.extend_from_slice(&self.credential_number);
        buf.push(self.mode);
        buf.push(self.features);
        buf.push(self.reserved1);
        buf.extend_from_slice(self.authorized_front.as_bytes());
        buf.extend_from_slice(self.authorized_rear.as_bytes());
        buf.push(self.default_floor as u8);
        buf.push(self.default_door as u8);
        buf.extend_from_slice(&self.date_time.to_le_bytes());
        buf.extend_from_slice(&self.local_timezone.to_le_bytes());
        buf.extend_from_slice(&self.reader_location.to_le_bytes());
        buf.extend_from_slice(&self.reserved2);
    }
}

pub(super) fn decode(body: &[u8], packet_id: PacketId) -> Result<AuthorizedDefaultFloorV2Packet> {
    if body.len() < BODY_LEN {
        return Err(BridgeError::MalformedPacket(
            "authorized default floor v2 body too short",
        ));
    }
    let mut off = 0usize;
    let valid = body[off];
    off += 1;
    let mut credential_number = [0u8; 16];
    credential_number.copy_from_slice(&body[off..off + 16]);
    off += 16;
    let mode = body[off];
    off += 1;
    let features = body[off];
    off += 1;
    let reserved1 = body[off];
    off += 1;
    let mut front = [0u8; 32];
    front.copy_from_slice(&body[off..off + 32]);
    off += 32;
    let mut rear = [0u8; 32];
    rear.copy_from_slice(&body[off..off + 32]);
    off += 32;
    let default_floor = body[off] as i8;
    off += 1;
    let default_door = DoorType::from_u8(body[off])?;
    off += 1;
    let date_time = u32::from_le_bytes(body[off..off + 4].try_into().unwrap());
    off += 4;
    let local_timezone = i32::from_le_bytes(body[off..off + 4].try_into().unwrap());
    off += 4;
    let reader_location = u32::from_le_bytes(body[off..off + 4].try_into().unwrap());
    off += 4;
    let mut reserved2 = [0u8; 3];
    reserved2.copy_from_slice(&body[off..off + 3]);

    Ok(AuthorizedDefaultFloorV2Packet {
        packet_id,
        valid,
        credential_number,
        mode,
        features,
        reserved1,
        authorized_front: BitMap256::from_bytes(front),
        authorized_rear: BitMap256::from_bytes(rear),
        default_floor,
        default_door,
        date_time,
        local_timezone,
        reader_location,
        reserved2,
    })
}

/// Zero-pad credential bytes (up to the first 16) into the fixed
/// credentialNumber field (spec §4.4.4).
pub fn credential_number_from_bytes(bytes: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    let n = bytes.len().min(16);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}
