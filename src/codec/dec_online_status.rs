// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DEC Online Status (type `0x17`) — spec §3.

use super::{BitMap256, PacketId};
use crate::error::{BridgeError, Result};

pub const BODY_LEN: usize = 1 + 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecOnlineStatusPacket {
    pub packet_id: PacketId,
    pub dec_subnet_id: u8,
    pub online_dec_map: BitMap256,
}

impl DecOnlineStatusPacket {
    pub(super) fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.dec_subnet_id);
        buf.extend_from_slice(self.online_dec_map.as_bytes());
    }
}

pub(super) fn decode(body: &[u8], packet_id: PacketId) -> Result<DecOnlineStatusPacket> {
    if body.len() < BODY_LEN {
        return Err(BridgeError::MalformedPacket(
            "dec online status body too short",
        ));
    }
    let dec_subnet_id = body[0];
    let mut map_bytes = [0u8; 32];
    map_bytes.copy_from_slice(&body[1..33]);
    Ok(DecOnlineStatusPacket {
        packet_id,
        dec_subnet_id,
        online_dec_map: BitMap256::from_bytes(map_bytes),
    })
}
