// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-DES Interactive Reactor (spec §4.4): sequence numbers, duplicate
//! suppression, un-acked backlog with timed retry, and per-variant
//! reaction dispatch (spec §9 "Packet polymorphism").

use crate::adapter::SsAdapter;
use crate::codec::{
    self, AckPacket, AuthorizedDefaultFloorV2Packet, BitMap256, CredentialDataPacket,
    DecOnlineStatusPacket, OperationModeV2Packet, Packet, PacketId,
};
use crate::config::BridgeConfig;
use crate::error::{ack_for_error, AckType, BridgeError, Result};
use crate::reactor::walltime;
use crate::transport::{Channel, InteractiveSender};
use std::collections::{HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::time::Instant;

/// Ring buffer plus hash index over recently-seen Packet IDs (spec §9
/// "Ordered caches"): eviction pops the oldest entry once the configured
/// capacity is exceeded (spec invariant I2, property P4).
#[derive(Debug)]
struct DuplicatesCache {
    order: VecDeque<PacketId>,
    seen: HashSet<PacketId>,
    capacity: usize,
}

impl DuplicatesCache {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            seen: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    fn contains(&self, id: PacketId) -> bool {
        self.seen.contains(&id)
    }

    /// Insert `id`, evicting the oldest entry if this pushes the cache
    /// over capacity. Caller must have already checked [`Self::contains`]
    /// — re-inserting an already-present id is a no-op.
    fn insert(&mut self, id: PacketId) {
        if !self.seen.insert(id) {
            return;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }
}

/// One un-acked outbound packet, pending Ack or retry (spec §3
/// "unAckedBacklog").
#[derive(Debug, Clone)]
struct BacklogEntry {
    packet_id: PacketId,
    bytes: Vec<u8>,
    peer_ip: Ipv4Addr,
    channel: Channel,
    last_send_time: Instant,
    retry_count: u32,
}

/// Per-DES state machine (spec §3 "Reactor state", §4.4).
#[derive(Debug)]
pub struct Reactor {
    pub des_ip: Ipv4Addr,
    pub last_heartbeat_time: Instant,
    pub is_des_online: bool,
    sequence_number: u32,
    online_dec_map: BitMap256,
    duplicates_cache: DuplicatesCache,
    unacked_backlog: VecDeque<BacklogEntry>,
}

impl Reactor {
    pub fn new(des_ip: Ipv4Addr, now: Instant, duplicates_cache_capacity: usize) -> Self {
        Self {
            des_ip,
            last_heartbeat_time: now,
            is_des_online: true,
            sequence_number: 0,
            online_dec_map: BitMap256::zero(),
            duplicates_cache: DuplicatesCache::new(duplicates_cache_capacity),
            unacked_backlog: VecDeque::new(),
        }
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn backlog_len(&self) -> usize {
        self.unacked_backlog.len()
    }

    pub fn online_dec_map(&self) -> BitMap256 {
        self.online_dec_map
    }

    /// A heartbeat arrived for this DES; record it and flip online if it
    /// had lapsed (spec §4.5 "Receive").
    pub fn mark_heartbeat(&mut self, now: Instant) {
        self.last_heartbeat_time = now;
        if !self.is_des_online {
            self.is_des_online = true;
            log::info!("DES {} online", self.des_ip);
        }
    }

    /// Spec §4.5 "Liveness sweep": called once per reactor on each
    /// heartbeat-socket timeout.
    pub fn check_liveness(&mut self, now: Instant, timeout: std::time::Duration) {
        if self.is_des_online && now.duration_since(self.last_heartbeat_time) > timeout {
            self.is_des_online = false;
            log::info!("DES {} offline", self.des_ip);
        }
    }

    /// Spec §4.4.1 "Send path": stamp the next sequence number, encode,
    /// transmit, and record the backlog entry. Does **not** apply to
    /// Acks — those echo the acknowledged id and never enter the backlog
    /// (see [`Self::send_ack`]).
    pub fn send(
        &mut self,
        mut packet: Packet,
        peer_ip: Ipv4Addr,
        channel: Channel,
        now: Instant,
        sockets: &dyn InteractiveSender,
    ) -> Result<PacketId> {
        let id = PacketId(self.sequence_number);
        packet.set_packet_id(id);
        let bytes = codec::encode(&packet);
        sockets.send_interactive(channel, peer_ip, &bytes)?;
        self.unacked_backlog.push_back(BacklogEntry {
            packet_id: id,
            bytes,
            peer_ip,
            channel,
            last_send_time: now,
            retry_count: 0,
        });
        self.sequence_number = self.sequence_number.wrapping_add(1);
        Ok(id)
    }

    fn send_ack(
        &self,
        echoed_id: PacketId,
        ack_type: AckType,
        peer_ip: Ipv4Addr,
        channel: Channel,
        sockets: &dyn InteractiveSender,
    ) {
        let ack = Packet::Ack(AckPacket::new(echoed_id, ack_type));
        let bytes = codec::encode(&ack);
        if let Err(e) = sockets.send_interactive(channel, peer_ip, &bytes) {
            log::warn!("failed to send ack {ack_type:?} to {peer_ip}: {e}");
        }
    }

    /// Spec §4.4.2 "Receive path": demultiplex one incoming interactive
    /// datagram. Mirrors every sub-step (duplicate check, decode/react,
    /// echoed Ack) and never lets a single bad datagram propagate past
    /// this call (spec §7: "no exception escapes the main loop").
    #[allow(clippy::too_many_arguments)]
    pub fn handle_interactive_datagram(
        &mut self,
        bytes: &[u8],
        peer_ip: Ipv4Addr,
        channel: Channel,
        now: Instant,
        config: &BridgeConfig,
        adapter: &dyn SsAdapter,
        sockets: &dyn InteractiveSender,
    ) {
        let (packet_id, packet_type) = match codec::decode_header(bytes) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("dropping malformed interactive datagram from {peer_ip}: {e}");
                return;
            }
        };

        if self.duplicates_cache.contains(packet_id) {
            self.send_ack(packet_id, AckType::Duplicate, peer_ip, channel, sockets);
            return;
        }
        self.duplicates_cache.insert(packet_id);

        let outcome = codec::decode_body(packet_type, &bytes[codec::HEADER_LEN..], packet_id)
            .and_then(|packet| self.react(packet, peer_ip, now, config, adapter, sockets));

        let ack_type = match &outcome {
            Ok(()) => AckType::Acceptable,
            Err(e) => match ack_for_error(e) {
                Some(ack_type) => ack_type,
                None => {
                    log::warn!("packet {packet_id:?} from {peer_ip} not acked: {e}");
                    return;
                }
            },
        };
        if let Err(e) = &outcome {
            log::warn!("packet {packet_id:?} from {peer_ip}: {e}");
        }
        self.send_ack(packet_id, ack_type, peer_ip, channel, sockets);
    }

    /// Spec §4.4.4 "Reaction rules". `peer_ip` (the DEC or DES that
    /// physically sent this datagram) is threaded through for future
    /// per-DEC addressed replies; every reaction today replies to
    /// `self.des_ip` or a computed DEC address instead.
    fn react(
        &mut self,
        packet: Packet,
        _peer_ip: Ipv4Addr,
        now: Instant,
        config: &BridgeConfig,
        adapter: &dyn SsAdapter,
        sockets: &dyn InteractiveSender,
    ) -> Result<()> {
        match packet {
            Packet::Ack(p) => {
                self.clear_backlog_entry(p.packet_id);
                Ok(())
            }
            Packet::DecOnlineStatus(p) => self.react_dec_online_status(p, now, config, sockets),
            Packet::CredentialData(p) => {
                self.react_credential_data(p, now, config, adapter, sockets)
            }
            Packet::OperationModeV2(_) => Err(BridgeError::ReactionFailure(
                "Operation Mode V2 is not expected inbound",
            )),
            Packet::AuthorizedDefaultFloorV2(_) => Err(BridgeError::ReactionFailure(
                "Authorized Default Floor V2 is not expected inbound",
            )),
        }
    }

    /// 0->1 transitions bring a DEC online and get an outbound Operation
    /// Mode V2; 1->0 transitions are logged only. The map is stored
    /// after processing either way.
    fn react_dec_online_status(
        &mut self,
        p: DecOnlineStatusPacket,
        now: Instant,
        config: &BridgeConfig,
        sockets: &dyn InteractiveSender,
    ) -> Result<()> {
        let octets = self.des_ip.octets();
        for i in 0..256usize {
            let was_online = self.online_dec_map.get(i);
            let now_online = p.online_dec_map.get(i);
            if !was_online && now_online {
                let dec_ip = Ipv4Addr::new(octets[0], octets[1], p.dec_subnet_id, i as u8);
                let operation_mode = Packet::OperationModeV2(
                    OperationModeV2Packet::for_dec_bring_online(
                        PacketId(0),
                        config.dec_operation_mode,
                    ),
                );
                self.send(operation_mode, dec_ip, Channel::Dec, now, sockets)?;
            } else if was_online && !now_online {
                log::info!(
                    "DEC {}.{}.{}.{} offline",
                    octets[0],
                    octets[1],
                    p.dec_subnet_id,
                    i
                );
            }
        }
        self.online_dec_map = p.online_dec_map;
        Ok(())
    }

    /// Resolve the credential against the SS adapter and reply with an
    /// Authorized Default Floor V2 to the DES (spec §4.4.4).
    fn react_credential_data(
        &mut self,
        p: CredentialDataPacket,
        now: Instant,
        config: &BridgeConfig,
        adapter: &dyn SsAdapter,
        sockets: &dyn InteractiveSender,
    ) -> Result<()> {
        let info = adapter.get_access_info(&p.credential_bytes, p.credential_bit_length)?;

        let mut authorized_front = BitMap256::zero();
        for floor in &info.allowed_floors_front {
            authorized_front.set(floor_bit_index(*floor), true);
        }
        let mut authorized_rear = BitMap256::zero();
        for floor in &info.allowed_floors_rear {
            authorized_rear.set(floor_bit_index(*floor), true);
        }

        let reply = Packet::AuthorizedDefaultFloorV2(AuthorizedDefaultFloorV2Packet {
            packet_id: PacketId(0),
            valid: info.is_valid as u8,
            credential_number: codec::authorized_floor::credential_number_from_bytes(
                &p.credential_bytes,
            ),
            mode: config.dec_operation_mode,
            features: 0,
            reserved1: 0,
            authorized_front,
            authorized_rear,
            default_floor: info.default_floor,
            default_door: info.default_door_type,
            date_time: walltime::now_epoch_seconds(),
            local_timezone: walltime::local_utc_offset_seconds(),
            reader_location: 0,
            reserved2: [0; 3],
        });
        self.send(reply, self.des_ip, Channel::Des, now, sockets)?;
        Ok(())
    }

    fn clear_backlog_entry(&mut self, packet_id: PacketId) {
        if let Some(pos) = self
            .unacked_backlog
            .iter()
            .position(|entry| entry.packet_id == packet_id)
        {
            self.unacked_backlog.remove(pos);
        }
    }

    /// Spec §4.4.3 "Retry path": one pass over the backlog, oldest
    /// first, emitting at most one retransmission per entry (ordering
    /// guarantee O2).
    pub fn retry_due(&mut self, now: Instant, config: &BridgeConfig, sockets: &dyn InteractiveSender) {
        let retry_interval = config.interactive_send_retry_interval();
        for _ in 0..self.unacked_backlog.len() {
            let mut entry = match self.unacked_backlog.pop_front() {
                Some(entry) => entry,
                None => break,
            };
            if now.duration_since(entry.last_send_time) > retry_interval {
                if let Err(e) =
                    sockets.send_interactive(entry.channel, entry.peer_ip, &entry.bytes)
                {
                    log::warn!("retry send failed for packet {:?}: {e}", entry.packet_id);
                }
                entry.last_send_time = now;
                entry.retry_count += 1;
                if entry.retry_count < config.interactive_send_max_retries {
                    self.unacked_backlog.push_back(entry);
                } else {
                    log::warn!(
                        "dropping packet {:?} to {} after {} retries",
                        entry.packet_id,
                        entry.peer_ip,
                        entry.retry_count
                    );
                }
            } else {
                self.unacked_backlog.push_front(entry);
                break;
            }
        }
    }
}

/// Map an `i8` floor number onto a bit position in the 256-slot
/// allowed-floors map, the same two's-complement-as-index convention the
/// wire format already uses for DEC indices (spec §3's online-DEC map
/// has no sign, but floors do; this keeps basement floors addressable
/// without a second encoding).
fn floor_bit_index(floor: i8) -> usize {
    floor as u8 as usize
}
