//! Frame emitter - the record sink
//!
//! Pure hand-off: takes a completed frame and renders it, either as
//! operator-readable log lines or as one JSON object per line for
//! machine consumption. No transformation of field values.

use serde::Serialize;
use tracing::{info, warn};

use crate::capture::DecodedFrame;

/// Output rendering for decoded frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitFormat {
    Text,
    Json,
}

/// Emitted JSON record: the frame fields plus a wall-clock timestamp
#[derive(Serialize)]
struct Record<'a> {
    timestamp_ms: u64,
    #[serde(flatten)]
    frame: &'a DecodedFrame,
}

/// Record sink for decoded frames
pub struct FrameEmitter {
    format: EmitFormat,
}

impl FrameEmitter {
    pub fn new(format: EmitFormat) -> Self {
        Self { format }
    }

    pub fn emit(&self, frame: &DecodedFrame) {
        match self.format {
            EmitFormat::Text => self.emit_text(frame),
            EmitFormat::Json => self.emit_json(frame),
        }
    }

    fn emit_text(&self, frame: &DecodedFrame) {
        match frame {
            DecodedFrame::Doorbell(f) => {
                info!("Doorbell: button {}, tone {}", f.button_id, f.tone);
            }
            DecodedFrame::ZWave(f) => {
                info!("Z-Wave: received packet:");
                info!("  Length           {}", f.length);
                info!("  Home/Network ID  0x{:08X}", f.home_id);
                info!("  Source ID        0x{:02X}", f.source_id);
                info!("  Destination ID   0x{:02X}", f.destination_id);
                info!("  Frame Control    0x{:02X}", f.control_flags());
                info!("  Sequence Number  {}", f.sequence_number());
                info!("  Command Class    {}", f.command_class);
                info!("  Subcommand       {}", f.command);
                info!("  Payload          {}", hex::encode(&f.payload));
                info!("  CRC OK?          {}", f.crc_ok);
            }
        }
    }

    fn emit_json(&self, frame: &DecodedFrame) {
        let record = Record {
            timestamp_ms: chrono::Utc::now().timestamp_millis() as u64,
            frame,
        };
        match serde_json::to_string(&record) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("failed to serialize frame: {}", e),
        }
    }
}
