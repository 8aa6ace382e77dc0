// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Wire Codec (spec §4.1)
//!
//! Packs and unpacks every interactive packet variant to/from its octet
//! buffer form, little-endian throughout. Packet variants are a tagged
//! sum (`Packet`) rather than a class hierarchy with per-variant
//! `react()` overrides (spec §9 "Packet polymorphism"); the reaction
//! dispatch table lives in [`crate::reactor`].

pub mod ack;
pub mod authorized_floor;
pub mod bitset;
pub mod credential_data;
pub mod dec_online_status;
pub mod heartbeat;
pub mod operation_mode;

use crate::error::{BridgeError, Result};

pub use ack::AckPacket;
pub use authorized_floor::AuthorizedDefaultFloorV2Packet;
pub use bitset::BitMap256;
pub use credential_data::CredentialDataPacket;
pub use dec_online_status::DecOnlineStatusPacket;
pub use operation_mode::OperationModeV2Packet;

/// Monotonically increasing, per-reactor Packet ID (spec §3 "Packet ID").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId(pub u32);

impl PacketId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Door a credential was authorized through (spec §3 "Authorized Default
/// Floor V2").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DoorType {
    Front = 0,
    Rear = 1,
}

impl DoorType {
    fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Self::Front),
            1 => Ok(Self::Rear),
            _ => Err(BridgeError::MalformedPacket("unknown door type")),
        }
    }
}

pub const TYPE_ACK: u16 = 0x01;
pub const TYPE_DEC_ONLINE_STATUS: u16 = 0x17;
pub const TYPE_AUTHORIZED_DEFAULT_FLOOR_V2: u16 = 0x34;
pub const TYPE_OPERATION_MODE_V2: u16 = 0x33;
pub const TYPE_CREDENTIAL_DATA: u16 = 0x40;

/// The union of known interactive packet variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Ack(AckPacket),
    DecOnlineStatus(DecOnlineStatusPacket),
    OperationModeV2(OperationModeV2Packet),
    CredentialData(CredentialDataPacket),
    AuthorizedDefaultFloorV2(AuthorizedDefaultFloorV2Packet),
}

impl Packet {
    pub fn packet_id(&self) -> PacketId {
        match self {
            Self::Ack(p) => p.packet_id,
            Self::DecOnlineStatus(p) => p.packet_id,
            Self::OperationModeV2(p) => p.packet_id,
            Self::CredentialData(p) => p.packet_id,
            Self::AuthorizedDefaultFloorV2(p) => p.packet_id,
        }
    }

    pub fn set_packet_id(&mut self, id: PacketId) {
        match self {
            Self::Ack(p) => p.packet_id = id,
            Self::DecOnlineStatus(p) => p.packet_id = id,
            Self::OperationModeV2(p) => p.packet_id = id,
            Self::CredentialData(p) => p.packet_id = id,
            Self::AuthorizedDefaultFloorV2(p) => p.packet_id = id,
        }
    }

    pub fn packet_type(&self) -> u16 {
        match self {
            Self::Ack(_) => TYPE_ACK,
            Self::DecOnlineStatus(_) => TYPE_DEC_ONLINE_STATUS,
            Self::OperationModeV2(_) => TYPE_OPERATION_MODE_V2,
            Self::CredentialData(_) => TYPE_CREDENTIAL_DATA,
            Self::AuthorizedDefaultFloorV2(_) => TYPE_AUTHORIZED_DEFAULT_FLOOR_V2,
        }
    }
}

/// Length of the common interactive-packet prefix: `u32 packetId; u16 type`.
pub const HEADER_LEN: usize = 6;

/// Read the six-octet common prefix of an interactive packet.
///
/// Returns `MalformedPacket` if `buf` is shorter than [`HEADER_LEN`].
pub fn decode_header(buf: &[u8]) -> Result<(PacketId, u16)> {
    if buf.len() < HEADER_LEN {
        return Err(BridgeError::MalformedPacket("buffer shorter than header"));
    }
    let id = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let ty = u16::from_le_bytes(buf[4..6].try_into().unwrap());
    Ok((PacketId(id), ty))
}

/// Encode any known packet variant to its wire form, including the
/// common six-byte header.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&packet.packet_id().0.to_le_bytes());
    buf.extend_from_slice(&packet.packet_type().to_le_bytes());
    match packet {
        Packet::Ack(p) => p.encode_body(&mut buf),
        Packet::DecOnlineStatus(p) => p.encode_body(&mut buf),
        Packet::OperationModeV2(p) => p.encode_body(&mut buf),
        Packet::CredentialData(p) => p.encode_body(&mut buf),
        Packet::AuthorizedDefaultFloorV2(p) => p.encode_body(&mut buf),
    }
    buf
}

/// Decode a packet body given its type code (the header has already been
/// consumed by the caller via [`decode_header`]).
///
/// An unrecognized `packet_type` is `UnsupportedPacketType`, not a
/// decode failure (spec §4.1): the caller Acks `Unsupported` rather than
/// dropping silently.
pub fn decode_body(packet_type: u16, body: &[u8], packet_id: PacketId) -> Result<Packet> {
    match packet_type {
        TYPE_ACK => ack::decode(body, packet_id).map(Packet::Ack),
        TYPE_DEC_ONLINE_STATUS => {
            dec_online_status::decode(body, packet_id).map(Packet::DecOnlineStatus)
        }
        TYPE_OPERATION_MODE_V2 => {
            operation_mode::decode(body, packet_id).map(Packet::OperationModeV2)
        }
        TYPE_CREDENTIAL_DATA => {
            credential_data::decode(body, packet_id).map(Packet::CredentialData)
        }
        TYPE_AUTHORIZED_DEFAULT_FLOOR_V2 => {
            authorized_floor::decode(body, packet_id).map(Packet::AuthorizedDefaultFloorV2)
        }
        other => Err(BridgeError::UnsupportedPacketType(other)),
    }
}
