// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the bridge (spec §7).
//!
//! Every per-packet failure path is represented here so the reactor can
//! map it to the right `AckType` without propagating panics.

use std::fmt;

/// Errors that can arise while decoding, reacting to, or acknowledging
/// a single interactive packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Decode failed, or the buffer was shorter than the declared layout.
    MalformedPacket(&'static str),
    /// Known header, unrecognized type code.
    UnsupportedPacketType(u16),
    /// Packet ID was seen recently and is present in the duplicates cache.
    DuplicatePacket,
    /// A variant's reaction failed (returned an error or violated a precondition).
    ReactionFailure(&'static str),
    /// The external access-control backend failed to resolve a credential.
    AdapterError(String),
    /// A socket operation failed in a way that does not end the worker
    /// (timeouts are handled before reaching this point).
    SocketTransient(String),
    /// Bind or multicast-group-join failed; surfaced from `start()`.
    SocketFatal(String),
    /// A configuration file could not be read or parsed.
    Config(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPacket(reason) => write!(f, "malformed packet: {reason}"),
            Self::UnsupportedPacketType(ty) => write!(f, "unsupported packet type: 0x{ty:04x}"),
            Self::DuplicatePacket => write!(f, "duplicate packet"),
            Self::ReactionFailure(reason) => write!(f, "reaction failed: {reason}"),
            Self::AdapterError(reason) => write!(f, "adapter error: {reason}"),
            Self::SocketTransient(reason) => write!(f, "transient socket error: {reason}"),
            Self::SocketFatal(reason) => write!(f, "fatal socket error: {reason}"),
            Self::Config(reason) => write!(f, "config error: {reason}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        Self::SocketFatal(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// The outcome of acknowledging one received interactive packet, per
/// spec §3 "Interactive Ack".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AckType {
    Unacceptable = 0,
    Acceptable = 1,
    Duplicate = 2,
    Unsupported = 3,
}

impl AckType {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Unacceptable),
            1 => Some(Self::Acceptable),
            2 => Some(Self::Duplicate),
            3 => Some(Self::Unsupported),
            _ => None,
        }
    }
}

/// Maps a per-packet processing error to the Ack outcome the peer receives,
/// per spec §7's policy table.
pub fn ack_for_error(err: &BridgeError) -> Option<AckType> {
    match err {
        BridgeError::MalformedPacket(_) => None,
        BridgeError::UnsupportedPacketType(_) => Some(AckType::Unsupported),
        BridgeError::DuplicatePacket => Some(AckType::Duplicate),
        BridgeError::ReactionFailure(_) | BridgeError::AdapterError(_) => {
            Some(AckType::Unacceptable)
        }
        BridgeError::SocketTransient(_) | BridgeError::SocketFatal(_) | BridgeError::Config(_) => {
            None
        }
    }
}
