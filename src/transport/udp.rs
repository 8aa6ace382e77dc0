// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP socket construction and datagram I/O for the bridge's three
//! physical endpoints (spec §4.2).

use super::{Channel, Datagram};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

/// Read timeout applied to every receive socket so the orchestrator loop
/// makes forward progress on all endpoints without a separate poller
/// thread (spec §4.2, §5 "Suspension points").
const READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Owns the bridge's UDP endpoints.
///
/// The heartbeat *send* is deliberately performed over the heartbeat
/// *receive* socket: it is the socket joined to the multicast group and
/// therefore eligible to send to it with correct source binding (spec
/// §4.2; preserved per §9 "source anomalies").
pub struct SocketLayer {
    heartbeat: UdpSocket,
    interactive_des: UdpSocket,
    interactive_dec: UdpSocket,
    heartbeat_send_addr: SocketAddr,
    interactive_send_port_des: u16,
    interactive_send_port_dec: u16,
}

impl SocketLayer {
    /// Bind and configure all endpoints per `config`. Fatal failures
    /// (bind, multicast-join) are surfaced immediately; callers should
    /// treat any `Err` here as [`BridgeError::SocketFatal`].
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let heartbeat = Self::bind_heartbeat_socket(config)?;
        let interactive_des = Self::bind_plain_socket(
            config.local_ip,
            config.interactive_receive_port_des,
            "interactive DES",
        )?;
        let interactive_dec = Self::bind_plain_socket(
            config.local_ip,
            config.interactive_receive_port_dec,
            "interactive DEC",
        )?;

        let heartbeat_send_addr = SocketAddr::V4(SocketAddrV4::new(
            config.heartbeat_send_mc_group,
            config.heartbeat_send_port,
        ));

        Ok(Self {
            heartbeat,
            interactive_des,
            interactive_dec,
            heartbeat_send_addr,
            interactive_send_port_des: config.interactive_send_port_des,
            interactive_send_port_dec: config.interactive_send_port_dec,
        })
    }

    fn bind_heartbeat_socket(config: &BridgeConfig) -> Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| BridgeError::SocketFatal(format!("heartbeat socket: {e}")))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| BridgeError::SocketFatal(format!("SO_REUSEADDR: {e}")))?;

        let bind_addr =
            SocketAddr::V4(SocketAddrV4::new(config.local_ip, config.heartbeat_receive_port));
        socket
            .bind(&bind_addr.into())
            .map_err(|e| BridgeError::SocketFatal(format!("bind {bind_addr}: {e}")))?;

        socket
            .join_multicast_v4(&config.heartbeat_receive_mc_group, &config.local_ip)
            .map_err(|e| {
                BridgeError::SocketFatal(format!(
                    "join {} on {}: {e}",
                    config.heartbeat_receive_mc_group, config.local_ip
                ))
            })?;
        socket
            .set_multicast_ttl_v4(u32::from(config.heartbeat_send_ttl))
            .map_err(|e| BridgeError::SocketFatal(format!("multicast TTL: {e}")))?;

        let socket: UdpSocket = socket.into();
        socket
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| BridgeError::SocketFatal(format!("read timeout: {e}")))?;
        Ok(socket)
    }

    fn bind_plain_socket(local_ip: Ipv4Addr, port: u16, label: &str) -> Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| BridgeError::SocketFatal(format!("{label} socket: {e}")))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| BridgeError::SocketFatal(format!("{label} SO_REUSEADDR: {e}")))?;

        let bind_addr = SocketAddr::V4(SocketAddrV4::new(local_ip, port));
        socket
            .bind(&bind_addr.into())
            .map_err(|e| BridgeError::SocketFatal(format!("{label} bind {bind_addr}: {e}")))?;

        let socket: UdpSocket = socket.into();
        socket
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| BridgeError::SocketFatal(format!("{label} read timeout: {e}")))?;
        Ok(socket)
    }

    /// Poll the heartbeat socket once. `Ok(None)` means the read timed
    /// out (no traffic this tick) — this is the expected, frequent case,
    /// not an error (spec §7 `SocketTransient` is consumed internally).
    pub fn recv_heartbeat(&self) -> Result<Option<Datagram>> {
        recv_once(&self.heartbeat)
    }

    /// Multicast the SS heartbeat, over the heartbeat *receive* socket.
    pub fn send_heartbeat(&self, bytes: &[u8]) -> Result<()> {
        self.heartbeat
            .send_to(bytes, self.heartbeat_send_addr)
            .map_err(|e| BridgeError::SocketTransient(e.to_string()))?;
        Ok(())
    }

    /// Poll one interactive channel once.
    pub fn recv_interactive(&self, channel: Channel) -> Result<Option<Datagram>> {
        match channel {
            Channel::Des => recv_once(&self.interactive_des),
            Channel::Dec => recv_once(&self.interactive_dec),
        }
    }

    /// Send on a channel's configured *send* port (spec §4.2: receive
    /// and send ports differ and are independently configured).
    pub fn send_interactive(&self, channel: Channel, peer_ip: Ipv4Addr, bytes: &[u8]) -> Result<()> {
        let port = match channel {
            Channel::Des => self.interactive_send_port_des,
            Channel::Dec => self.interactive_send_port_dec,
        };
        let socket = match channel {
            Channel::Des => &self.interactive_des,
            Channel::Dec => &self.interactive_dec,
        };
        let dest = SocketAddr::V4(SocketAddrV4::new(peer_ip, port));
        socket
            .send_to(bytes, dest)
            .map_err(|e| BridgeError::SocketTransient(e.to_string()))?;
        Ok(())
    }
}

fn recv_once(socket: &UdpSocket) -> Result<Option<Datagram>> {
    let mut buf = [0u8; 2048];
    match socket.recv_from(&mut buf) {
        Ok((n, SocketAddr::V4(peer))) => Ok(Some(Datagram {
            bytes: buf[..n].to_vec(),
            peer_ip: *peer.ip(),
        })),
        Ok((_, SocketAddr::V6(peer))) => Err(BridgeError::SocketTransient(format!(
            "unexpected IPv6 peer {peer}"
        ))),
        Err(e) if is_timeout(&e) => Ok(None),
        Err(e) => Err(BridgeError::SocketTransient(e.to_string())),
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_config() -> BridgeConfig {
        BridgeConfig {
            local_ip: Ipv4Addr::LOCALHOST,
            heartbeat_receive_mc_group: Ipv4Addr::new(239, 192, 1, 1),
            heartbeat_receive_port: 0,
            heartbeat_send_mc_group: Ipv4Addr::new(239, 192, 1, 1),
            heartbeat_send_port: 0,
            interactive_receive_port_des: 0,
            interactive_receive_port_dec: 0,
            interactive_send_port_des: 0,
            interactive_send_port_dec: 0,
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn recv_times_out_cleanly() {
        let layer = SocketLayer::new(&loopback_config()).expect("bind should succeed");
        assert!(layer.recv_interactive(Channel::Des).unwrap().is_none());
        assert!(layer.recv_interactive(Channel::Dec).unwrap().is_none());
        assert!(layer.recv_heartbeat().unwrap().is_none());
    }

    #[test]
    fn interactive_send_then_receive_on_same_channel() {
        let layer = SocketLayer::new(&loopback_config()).expect("bind should succeed");
        let des_port = layer.interactive_des.local_addr().unwrap().port();
        // point this layer's own "send" port at its own receive port
        let mut config = loopback_config();
        config.interactive_send_port_des = des_port;
        let sender = SocketLayer::new(&config).expect("bind should succeed");

        sender
            .send_interactive(Channel::Des, Ipv4Addr::LOCALHOST, b"hello")
            .unwrap();

        let mut received = None;
        for _ in 0..50 {
            if let Some(dg) = layer.recv_interactive(Channel::Des).unwrap() {
                received = Some(dg);
                break;
            }
        }
        let dg = received.expect("should have received the datagram within 50 polls");
        assert_eq!(dg.bytes, b"hello");
        assert_eq!(dg.peer_ip, Ipv4Addr::LOCALHOST);
    }
}
