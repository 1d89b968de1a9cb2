//! Sub-GHz Capture - consumer RF packet decoder
//!
//! Pulls binary symbol streams from a recorded file or a UDP socket,
//! decodes the pulse-width OOK doorbell protocol or Manchester-encoded
//! Z-Wave frames, and hands validated records to the emitter.

mod capture;
mod config;
mod doorbell;
mod emitter;
mod source;
mod zwave;

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use capture::SymbolCapture;
use config::Config;
use emitter::FrameEmitter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("===========================================");
    info!("   Sub-GHz Capture");
    info!("   doorbell OOK / Z-Wave decoder");
    info!("===========================================");

    // Load and validate configuration
    let config = Config::from_env();
    let input = config.input()?;

    info!("Configuration:");
    info!("  Protocol: {:?}", config.protocol);
    info!("  Input: {:?}", input);
    info!("  Emit format: {:?}", config.emit_format);
    info!("  Stats interval: {}s", config.stats_interval_secs);

    // Start the capture thread
    let capture = SymbolCapture::new(config.clone());
    let frame_rx = capture.start()?;
    let emitter = FrameEmitter::new(config.emit_format);

    // Ctrl+C flips the shutdown flag; the capture loop observes it at
    // the next batch boundary
    let running = capture.running_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, exiting...");
            running.store(false, Ordering::SeqCst);
        }
    });

    info!("Capture running. Press Ctrl+C to stop.");

    // Main loop - emit frames in the order they were decoded
    let mut frames_emitted = 0u64;
    loop {
        match frame_rx.recv_timeout(Duration::from_millis(500)) {
            Ok(frame) => {
                frames_emitted += 1;
                emitter.emit(&frame);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if !capture.is_running() {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    capture.stop();
    info!("Shutdown complete. Frames emitted: {}", frames_emitted);
    Ok(())
}
