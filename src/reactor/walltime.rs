// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wall-clock helpers for the `dateTime`/`localTimezone` fields of
//! Authorized Default Floor V2 (spec §9 "Time source"): the only place
//! in the bridge that is not driven by a monotonic clock.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as seconds-since-epoch, truncated to `u32` per the wire
/// layout (spec §3).
pub fn now_epoch_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Host's local UTC offset, in seconds, east-positive.
#[cfg(unix)]
pub fn local_utc_offset_seconds() -> i32 {
    // SAFETY: `time` is a stack-local `libc::time_t` populated by
    // `libc::time`; `localtime_r` writes into a stack-local `tm` we own
    // and pass a valid pointer to. Both are standard libc calls with no
    // preconditions beyond valid pointers, which these are.
    unsafe {
        let t: libc::time_t = libc::time(std::ptr::null_mut());
        let mut tm: libc::tm = std::mem::zeroed();
        libc::localtime_r(&t, &mut tm);
        tm.tm_gmtoff as i32
    }
}

#[cfg(not(unix))]
pub fn local_utc_offset_seconds() -> i32 {
    0
}
