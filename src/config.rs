// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge configuration (spec §6), loaded from a TOML file or defaults.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

/// Configuration ingested by the orchestrator at construction (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bound address for all four sockets.
    #[serde(default = "default_local_ip")]
    pub local_ip: Ipv4Addr,

    /// Multicast group joined for DES heartbeats.
    #[serde(default = "default_heartbeat_mc_group")]
    pub heartbeat_receive_mc_group: Ipv4Addr,
    /// Local port bound for heartbeat reception (and SS heartbeat send).
    #[serde(default = "default_heartbeat_receive_port")]
    pub heartbeat_receive_port: u16,
    /// DES liveness cutoff, in seconds.
    #[serde(default = "default_heartbeat_receive_timeout")]
    pub heartbeat_receive_timeout_secs: f64,

    /// Target multicast group for SS heartbeats.
    #[serde(default = "default_heartbeat_mc_group")]
    pub heartbeat_send_mc_group: Ipv4Addr,
    /// Target port for SS heartbeats.
    #[serde(default = "default_heartbeat_send_port")]
    pub heartbeat_send_port: u16,
    /// Period between SS heartbeats, in seconds.
    #[serde(default = "default_heartbeat_send_interval")]
    pub heartbeat_send_interval_secs: f64,
    /// Outbound multicast TTL for SS heartbeats.
    #[serde(default = "default_heartbeat_send_ttl")]
    pub heartbeat_send_ttl: u8,

    /// Local port for the interactive DES channel.
    #[serde(default = "default_interactive_receive_port_des")]
    pub interactive_receive_port_des: u16,
    /// Local port for the interactive DEC channel.
    #[serde(default = "default_interactive_receive_port_dec")]
    pub interactive_receive_port_dec: u16,
    /// Destination port for sends on the DES channel.
    #[serde(default = "default_interactive_send_port_des")]
    pub interactive_send_port_des: u16,
    /// Destination port for sends on the DEC channel.
    #[serde(default = "default_interactive_send_port_dec")]
    pub interactive_send_port_dec: u16,

    /// Per-reactor duplicates-cache capacity.
    #[serde(default = "default_duplicates_cache_size")]
    pub interactive_duplicates_cache_size: usize,
    /// Backoff between unacked-packet retries, in seconds.
    #[serde(default = "default_send_retry_interval")]
    pub interactive_send_retry_interval_secs: f64,
    /// Number of retries before a backlog entry is dropped.
    #[serde(default = "default_send_max_retries")]
    pub interactive_send_max_retries: u32,

    /// Value placed in the `mode` field of outgoing Operation Mode V2.
    #[serde(default = "default_dec_operation_mode")]
    pub dec_operation_mode: u8,

    /// Default floor returned by the bundled [`crate::adapter::StaticAdapter`]
    /// demo backend when no live Secusys/WebService client is wired up
    /// (spec §1 scopes that client out entirely).
    #[serde(default)]
    pub adapter_default_floor: i8,
    /// `true` routes the demo adapter's default door through Front,
    /// `false` through Rear.
    #[serde(default = "default_adapter_default_door_front")]
    pub adapter_default_door_front: bool,
    /// Site-wide whitelist the demo adapter answers every credential
    /// with, front door.
    #[serde(default)]
    pub adapter_allowed_floors_front: Vec<i8>,
    /// Same, rear door.
    #[serde(default)]
    pub adapter_allowed_floors_rear: Vec<i8>,
}

fn default_adapter_default_door_front() -> bool {
    true
}

fn default_local_ip() -> Ipv4Addr {
    Ipv4Addr::new(0, 0, 0, 0)
}
fn default_heartbeat_mc_group() -> Ipv4Addr {
    Ipv4Addr::new(239, 192, 1, 1)
}
fn default_heartbeat_receive_port() -> u16 {
    3471
}
fn default_heartbeat_receive_timeout() -> f64 {
    10.0
}
fn default_heartbeat_send_port() -> u16 {
    3471
}
fn default_heartbeat_send_interval() -> f64 {
    2.0
}
fn default_heartbeat_send_ttl() -> u8 {
    255
}
fn default_interactive_receive_port_des() -> u16 {
    3472
}
fn default_interactive_receive_port_dec() -> u16 {
    3473
}
fn default_interactive_send_port_des() -> u16 {
    3474
}
fn default_interactive_send_port_dec() -> u16 {
    3475
}
fn default_duplicates_cache_size() -> usize {
    64
}
fn default_send_retry_interval() -> f64 {
    1.0
}
fn default_send_max_retries() -> u32 {
    5
}
fn default_dec_operation_mode() -> u8 {
    3
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            local_ip: default_local_ip(),
            heartbeat_receive_mc_group: default_heartbeat_mc_group(),
            heartbeat_receive_port: default_heartbeat_receive_port(),
            heartbeat_receive_timeout_secs: default_heartbeat_receive_timeout(),
            heartbeat_send_mc_group: default_heartbeat_mc_group(),
            heartbeat_send_port: default_heartbeat_send_port(),
            heartbeat_send_interval_secs: default_heartbeat_send_interval(),
            heartbeat_send_ttl: default_heartbeat_send_ttl(),
            interactive_receive_port_des: default_interactive_receive_port_des(),
            interactive_receive_port_dec: default_interactive_receive_port_dec(),
            interactive_send_port_des: default_interactive_send_port_des(),
            interactive_send_port_dec: default_interactive_send_port_dec(),
            interactive_duplicates_cache_size: default_duplicates_cache_size(),
            interactive_send_retry_interval_secs: default_send_retry_interval(),
            interactive_send_max_retries: default_send_max_retries(),
            dec_operation_mode: default_dec_operation_mode(),
            adapter_default_floor: 0,
            adapter_default_door_front: default_adapter_default_door_front(),
            adapter_allowed_floors_front: Vec::new(),
            adapter_allowed_floors_rear: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BridgeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("reading {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BridgeError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.interactive_duplicates_cache_size == 0 {
            return Err(BridgeError::Config(
                "interactive_duplicates_cache_size must be >= 1".into(),
            ));
        }
        if self.interactive_send_max_retries == 0 {
            return Err(BridgeError::Config(
                "interactive_send_max_retries must be >= 1".into(),
            ));
        }
        if !(1..=4).contains(&self.dec_operation_mode) {
            return Err(BridgeError::Config(
                "dec_operation_mode must be in 1..=4".into(),
            ));
        }
        if self.heartbeat_receive_timeout_secs <= 0.0 {
            return Err(BridgeError::Config(
                "heartbeat_receive_timeout_secs must be positive".into(),
            ));
        }
        if self.heartbeat_send_interval_secs <= 0.0 {
            return Err(BridgeError::Config(
                "heartbeat_send_interval_secs must be positive".into(),
            ));
        }
        if self.interactive_send_retry_interval_secs <= 0.0 {
            return Err(BridgeError::Config(
                "interactive_send_retry_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn heartbeat_receive_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.heartbeat_receive_timeout_secs)
    }

    pub fn heartbeat_send_interval(&self) -> Duration {
        Duration::from_secs_f64(self.heartbeat_send_interval_secs)
    }

    pub fn interactive_send_retry_interval(&self) -> Duration {
        Duration::from_secs_f64(self.interactive_send_retry_interval_secs)
    }
}
