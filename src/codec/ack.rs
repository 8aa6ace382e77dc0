// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interactive Ack (type `0x01`) — spec §3.
//!
//! An Ack's `packetId` echoes the packet being acknowledged; it never
//! consumes a sequence number of its own.

use super::PacketId;
use crate::error::{AckType, BridgeError, Result};

pub const BODY_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPacket {
    pub packet_id: PacketId,
    pub ack_type: AckType,
}

impl AckPacket {
    pub fn new(echoed_id: PacketId, ack_type: AckType) -> Self {
        Self {
            packet_id: echoed_id,
            ack_type,
        }
    }

    pub(super) fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.ack_type as u32).to_le_bytes());
    }
}

pub(super) fn decode(body: &[u8], packet_id: PacketId) -> Result<AckPacket> {
    if body.len() < BODY_LEN {
        return Err(BridgeError::MalformedPacket("ack body too short"));
    }
    let raw = u32::from_le_bytes(body[0..4].try_into().unwrap());
    let ack_type =
        AckType::from_u32(raw).ok_or(BridgeError::MalformedPacket("unknown ack type"))?;
    Ok(AckPacket { packet_id, ack_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_body, encode, Packet, TYPE_ACK};

    #[test]
    fn roundtrip_all_ack_types_p1_p2() {
        for ack_type in [
            AckType::Unacceptable,
            AckType::Acceptable,
            AckType::Duplicate,
            AckType::Unsupported,
        ] {
            let packet = Packet::Ack(AckPacket::new(PacketId(7), ack_type));
            let bytes = encode(&packet);
            let (id, ty) = crate::codec::decode_header(&bytes).unwrap();
            assert_eq!(ty, TYPE_ACK);
            let decoded = decode_body(ty, &bytes[6..], id).unwrap();
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn too_short_is_malformed() {
        assert!(matches!(
            decode(&[0, 0], PacketId(1)),
            Err(BridgeError::MalformedPacket(_))
        ));
    }
}
