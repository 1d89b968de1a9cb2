//! Configuration loaded from environment variables

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::warn;

use crate::emitter::EmitFormat;
use crate::source::SymbolInput;

/// Which protocol decoder to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Pulse-width OOK doorbell (315 MHz)
    Doorbell,
    /// Manchester-encoded Z-Wave (R1/R2)
    ZWave,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Protocol decoder selection
    pub protocol: Protocol,

    /// Recorded symbol file to play back
    pub input_file: Option<PathBuf>,

    /// UDP port to receive symbol datagrams on
    pub udp_port: Option<u16>,

    /// Frame rendering at the record sink
    pub emit_format: EmitFormat,

    /// Capture statistics reporting interval in seconds
    pub stats_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            protocol: match std::env::var("PROTOCOL").as_deref() {
                Ok("doorbell") => Protocol::Doorbell,
                Ok("zwave") | Err(_) => Protocol::ZWave,
                Ok(other) => {
                    warn!("unknown PROTOCOL '{}', defaulting to zwave", other);
                    Protocol::ZWave
                }
            },

            input_file: std::env::var("INPUT_FILE").ok().map(PathBuf::from),

            udp_port: std::env::var("UDP_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),

            emit_format: match std::env::var("EMIT_FORMAT").as_deref() {
                Ok("json") => EmitFormat::Json,
                _ => EmitFormat::Text,
            },

            stats_interval_secs: std::env::var("STATS_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Resolve the configured symbol input. Exactly one of INPUT_FILE and
    /// UDP_PORT must be set.
    pub fn input(&self) -> Result<SymbolInput> {
        match (&self.input_file, self.udp_port) {
            (Some(path), None) => Ok(SymbolInput::File(path.clone())),
            (None, Some(port)) => Ok(SymbolInput::Udp(port)),
            _ => bail!("illegal combination of arguments: set exactly one of INPUT_FILE and UDP_PORT"),
        }
    }
}
