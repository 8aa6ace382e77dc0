// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Communicator Orchestrator (C6, spec §4.6): the single poll loop
//! binding the socket layer, reactor registry, and heartbeat engine
//! together, plus start/stop lifecycle.

use crate::adapter::SsAdapter;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::heartbeat::HeartbeatEngine;
use crate::reactor::ReactorRegistry;
use crate::transport::{Channel, SocketLayer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

/// Owns the worker thread and every piece of mutable state it touches.
/// All reactor/registry/heartbeat state is exclusive to that thread
/// (spec §5 "Scheduling"); `start`/`stop` synchronize through
/// [`AtomicBool`] plus a join, never a lock on the hot path.
pub struct Communicator {
    config: Arc<BridgeConfig>,
    adapter: Arc<dyn SsAdapter + Send + Sync>,
    should_run: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Communicator {
    pub fn new(config: BridgeConfig, adapter: Arc<dyn SsAdapter + Send + Sync>) -> Self {
        Self {
            config: Arc::new(config),
            adapter,
            should_run: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Bind all four sockets and spawn the worker thread. Idempotent
    /// against repeated calls while already running: logs a warning and
    /// returns `Ok(())` rather than rebinding (spec §4.6).
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock().expect("worker mutex poisoned");
        if worker.is_some() {
            log::warn!("start() called while already running; ignoring");
            return Ok(());
        }

        let sockets = SocketLayer::new(&self.config)?;
        let config = Arc::clone(&self.config);
        let adapter = Arc::clone(&self.adapter);
        let should_run = Arc::clone(&self.should_run);
        should_run.store(true, Ordering::SeqCst);

        *worker = Some(std::thread::spawn(move || {
            run_loop(sockets, config, adapter, should_run);
        }));
        Ok(())
    }

    /// Signal the worker to exit at the top of its next iteration and
    /// join it. Sockets close when `run_loop` returns and `sockets` is
    /// dropped.
    pub fn stop(&self) {
        self.should_run.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().expect("worker mutex poisoned").take();
        if let Some(handle) = handle {
            if let Err(e) = handle.join() {
                log::warn!("worker thread panicked during shutdown: {e:?}");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().expect("worker mutex poisoned").is_some()
            && self.should_run.load(Ordering::SeqCst)
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spec §4.6's loop body, run until `should_run` flips false. Every
/// per-packet path inside a tick is already exception-safe (spec §7: "no
/// exception escapes the main loop"), so this function itself never
/// returns early on a single bad datagram.
fn run_loop(
    sockets: SocketLayer,
    config: Arc<BridgeConfig>,
    adapter: Arc<dyn SsAdapter + Send + Sync>,
    should_run: Arc<AtomicBool>,
) {
    let mut registry = ReactorRegistry::new();
    let now = Instant::now();
    let mut heartbeat = HeartbeatEngine::new(now, &config);

    while should_run.load(Ordering::SeqCst) {
        let now = Instant::now();

        if let Err(e) = heartbeat.send_tick(now, &config, &sockets) {
            log::warn!("heartbeat send tick failed: {e}");
        }
        if let Err(e) = heartbeat.receive_tick(now, &config, &sockets, &mut registry) {
            log::warn!("heartbeat receive tick failed: {e}");
        }
        interactive_tick(Channel::Des, now, &config, &sockets, &adapter, &mut registry);
        interactive_tick(Channel::Dec, now, &config, &sockets, &adapter, &mut registry);

        for (_, reactor) in registry.iter_mut() {
            reactor.retry_due(now, &config, &sockets);
        }
    }
}

/// One channel's worth of spec §4.4.2/§4.4.3: receive (if anything
/// arrived) and dispatch to the owning reactor. Spec §9 flags the
/// source's interactive handler for reading the wrong socket regardless
/// of which channel the loop intended to service; `channel` here is
/// always the argument, never implicitly DES (the corrected behavior).
fn interactive_tick(
    channel: Channel,
    now: Instant,
    config: &BridgeConfig,
    sockets: &SocketLayer,
    adapter: &Arc<dyn SsAdapter + Send + Sync>,
    registry: &mut ReactorRegistry,
) {
    let datagram = match sockets.recv_interactive(channel) {
        Ok(Some(datagram)) => datagram,
        Ok(None) => return,
        Err(e) => {
            log::warn!("interactive {channel:?} receive failed: {e}");
            return;
        }
    };

    match registry.lookup(datagram.peer_ip) {
        Some(reactor) => reactor.handle_interactive_datagram(
            &datagram.bytes,
            datagram.peer_ip,
            channel,
            now,
            config,
            adapter.as_ref(),
            sockets,
        ),
        None => log::warn!(
            "interactive {channel:?} datagram from {} with no prior heartbeat on its subnet; dropping",
            datagram.peer_ip
        ),
    }
}
