// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DEC Security Credential Data (type `0x40`) — spec §3.
//!
//! Body: `u8 decSubnetId; u8 decId; u8 credentialBitLength; N bytes
//! credentialBytes` where `N = ceil(credentialBitLength / 8)`.

use super::PacketId;
use crate::error::{BridgeError, Result};

pub const FIXED_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDataPacket {
    pub packet_id: PacketId,
    pub dec_subnet_id: u8,
    pub dec_id: u8,
    pub credential_bit_length: u8,
    pub credential_bytes: Vec<u8>,
}

impl CredentialDataPacket {
    pub(super) fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.dec_subnet_id);
        buf.push(self.dec_id);
        buf.push(self.credential_bit_length);
        buf.extend_from_slice(&self.credential_bytes);
    }
}

pub(super) fn decode(body: &[u8], packet_id: PacketId) -> Result<CredentialDataPacket> {
    if body.len() < FIXED_LEN {
        return Err(BridgeError::MalformedPacket("credential data body too short"));
    }
    let dec_subnet_id = body[0];
    let dec_id = body[1];
    let credential_bit_length = body[2];
    let n = (credential_bit_length as usize).div_ceil(8);
    if body.len() < FIXED_LEN + n {
        return Err(BridgeError::MalformedPacket(
            "credential data body shorter than declared bit length",
        ));
    }
    let credential_bytes = body[FIXED_LEN..FIXED_LEN + n].to_vec();
    Ok(CredentialDataPacket {
        packet_id,
        dec_subnet_id,
        dec_id,
        credential_bit_length,
        credential_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_body, encode, Packet, TYPE_CREDENTIAL_DATA};

    /// spec §8 S4: packetId=42, decSubnetId=5, decId=3, bitLength=24,
    /// bytes=0x0A 0xBB 0xCC.
    #[test]
    fn roundtrip_s4_credential_p1_p2() {
        let packet = Packet::CredentialData(CredentialDataPacket {
            packet_id: PacketId(42),
            dec_subnet_id: 5,
            dec_id: 3,
            credential_bit_length: 24,
            credential_bytes: vec![0x0A, 0xBB, 0xCC],
        });
        let bytes = encode(&packet);
        let (id, ty) = crate::codec::decode_header(&bytes).unwrap();
        assert_eq!(ty, TYPE_CREDENTIAL_DATA);
        let decoded = decode_body(ty, &bytes[6..], id).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn bit_length_not_byte_aligned_rounds_up() {
        // 17 bits -> ceil(17/8) = 3 bytes
        let packet = Packet::CredentialData(CredentialDataPacket {
            packet_id: PacketId(1),
            dec_subnet_id: 0,
            dec_id: 0,
            credential_bit_length: 17,
            credential_bytes: vec![0xFF, 0xFF, 0x01],
        });
        let bytes = encode(&packet);
        let (id, ty) = crate::codec::decode_header(&bytes).unwrap();
        let decoded = decode_body(ty, &bytes[6..], id).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn truncated_credential_bytes_is_malformed() {
        // declares 24 bits (3 bytes) but only supplies 2
        let body = [5u8, 3, 24, 0x0A, 0xBB];
        assert!(matches!(
            decode(&body, PacketId(1)),
            Err(BridgeError::MalformedPacket(_))
        ));
    }
}
