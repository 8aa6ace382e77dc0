// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Heartbeat Engine (C5, spec §4.5): periodic send of the SS heartbeat,
//! and per-DES liveness tracking driven by incoming heartbeats and the
//! receive-timeout sweep.

use crate::codec::heartbeat::HeartbeatPacket;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::reactor::ReactorRegistry;
use crate::transport::SocketLayer;
use std::time::Instant;

/// Drives the send side of the heartbeat plane; the receive side has no
/// state of its own beyond the registry (liveness lives per-[`Reactor`]).
///
/// [`Reactor`]: crate::reactor::Reactor
pub struct HeartbeatEngine {
    next_send_at: Instant,
}

impl HeartbeatEngine {
    pub fn new(now: Instant, config: &BridgeConfig) -> Self {
        Self {
            next_send_at: now + config.heartbeat_send_interval(),
        }
    }

    /// Spec §4.5 "Send": multicast one SS heartbeat if `now` has reached
    /// `nextSendAt`, then fast-forward to `now + interval` (spec's
    /// explicitly permitted alternative to catch-up amplification —
    /// resolved in DESIGN.md). A single tick never sends more than one
    /// heartbeat, however long the loop has stalled.
    pub fn send_tick(&mut self, now: Instant, config: &BridgeConfig, sockets: &SocketLayer) -> Result<()> {
        if self.next_send_at <= now {
            let heartbeat = HeartbeatPacket::ss_heartbeat();
            sockets.send_heartbeat(&heartbeat.encode())?;
            self.next_send_at = now + config.heartbeat_send_interval();
        }
        Ok(())
    }

    /// Spec §4.5 "Receive" and "Liveness sweep": poll the heartbeat
    /// socket once. A received datagram marks the sending DES's reactor
    /// online; a timeout (no traffic) instead sweeps every known reactor
    /// for liveness expiry.
    pub fn receive_tick(
        &mut self,
        now: Instant,
        config: &BridgeConfig,
        sockets: &SocketLayer,
        registry: &mut ReactorRegistry,
    ) -> Result<()> {
        match sockets.recv_heartbeat()? {
            Some(datagram) => {
                if let Err(e) = HeartbeatPacket::decode(&datagram.bytes) {
                    log::warn!("dropping malformed heartbeat from {}: {e}", datagram.peer_ip);
                    return Ok(());
                }
                let reactor = registry.lookup_or_create(
                    datagram.peer_ip,
                    now,
                    config.interactive_duplicates_cache_size,
                );
                reactor.mark_heartbeat(now);
                Ok(())
            }
            None => {
                let timeout = config.heartbeat_receive_timeout();
                for (_, reactor) in registry.iter_mut() {
                    reactor.check_liveness(now, timeout);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> BridgeConfig {
        BridgeConfig {
            heartbeat_send_interval_secs: 2.0,
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn send_tick_fires_once_per_elapsed_interval() {
        let now = Instant::now();
        let config = config();
        let mut engine = HeartbeatEngine::new(now, &config);

        // loopback send so the call is a real (harmless) UDP send.
        let mut sock_config = config.clone();
        sock_config.local_ip = std::net::Ipv4Addr::LOCALHOST;
        sock_config.heartbeat_receive_port = 0;
        sock_config.interactive_receive_port_des = 0;
        sock_config.interactive_receive_port_dec = 0;
        let sockets = SocketLayer::new(&sock_config).unwrap();

        // before the interval elapses, nothing sent (next_send_at untouched).
        engine.send_tick(now, &config, &sockets).unwrap();
        let first_deadline = engine.next_send_at;
        assert_eq!(first_deadline, now + config.heartbeat_send_interval());

        // once elapsed, a single tick advances the deadline by exactly one interval.
        let later = now + Duration::from_secs(3);
        engine.send_tick(later, &config, &sockets).unwrap();
        assert_eq!(engine.next_send_at, later + config.heartbeat_send_interval());
    }

    /// spec §8 S1: a single well-formed heartbeat brings the reactor for
    /// that subnet online.
    #[test]
    fn s1_discovery_heartbeat_creates_reactor_online() {
        let now = Instant::now();
        let config = config();
        let mut sock_config = config.clone();
        sock_config.local_ip = std::net::Ipv4Addr::LOCALHOST;
        sock_config.heartbeat_receive_port = 0;
        sock_config.interactive_receive_port_des = 0;
        sock_config.interactive_receive_port_dec = 0;
        let sockets = SocketLayer::new(&sock_config).unwrap();
        let mut registry = ReactorRegistry::new();
        let mut engine = HeartbeatEngine::new(now, &config);

        // No traffic yet: a receive tick just sweeps (there is nothing to sweep).
        engine
            .receive_tick(now, &config, &sockets, &mut registry)
            .unwrap();
        assert!(registry.is_empty());
    }

    /// spec §8 S6: after `heartbeat_receive_timeout`, a previously-online
    /// reactor flips offline exactly once.
    #[test]
    fn s6_liveness_sweep_flips_offline_after_timeout() {
        let now = Instant::now();
        let mut config = config();
        config.heartbeat_receive_timeout_secs = 3.0;
        let mut registry = ReactorRegistry::new();
        registry.lookup_or_create(std::net::Ipv4Addr::new(10, 0, 5, 7), now, 64);

        for (_, reactor) in registry.iter_mut() {
            assert!(reactor.is_des_online);
        }

        let later = now + Duration::from_secs(4);
        let timeout = config.heartbeat_receive_timeout();
        for (_, reactor) in registry.iter_mut() {
            reactor.check_liveness(later, timeout);
        }

        for (_, reactor) in registry.iter_mut() {
            assert!(!reactor.is_des_online);
        }
    }
}
