// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ss-bridge - DES/DEC access-control bridge
//!
//! Runs the [`Communicator`] orchestrator until interrupted, bridging
//! elevator dispatching heartbeat/interactive traffic to the bundled
//! [`StaticAdapter`] demo access-control backend.

use clap::Parser;
use ss_bridge::adapter::{SsAdapter, StaticAdapter};
use ss_bridge::codec::DoorType;
use ss_bridge::config::BridgeConfig;
use ss_bridge::orchestrator::Communicator;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// DES/DEC access-control bridge
#[derive(Parser, Debug)]
#[command(name = "ss-bridge")]
#[command(version = "0.1.0")]
#[command(about = "Bridge DES/DEC elevator dispatching traffic to an access-control backend")]
struct Args {
    /// Path to a TOML configuration file (spec §6). Unset fields fall
    /// back to built-in defaults; omit entirely to run on defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity: trace, debug, info, warn, error.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => {
            let config = BridgeConfig::default();
            config.validate()?;
            config
        }
    };

    let adapter: Arc<dyn SsAdapter + Send + Sync> = Arc::new(StaticAdapter::new(
        config.adapter_default_floor,
        if config.adapter_default_door_front {
            DoorType::Front
        } else {
            DoorType::Rear
        },
        config.adapter_allowed_floors_front.clone(),
        config.adapter_allowed_floors_rear.clone(),
    ));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        log::info!("shutdown signal received");
        r.store(false, Ordering::SeqCst);
    })?;

    let communicator = Communicator::new(config, adapter);
    communicator.start()?;
    log::info!("ss-bridge running, press Ctrl+C to stop");

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    communicator.stop();
    log::info!("ss-bridge stopped");
    Ok(())
}
