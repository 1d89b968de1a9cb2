//! Z-Wave frame types

use serde::Serialize;

/// Decoded Z-Wave frame (Node Information Frame level: header fields,
/// payload bytes and checksum only; no command-class interpretation)
#[derive(Debug, Clone, Serialize)]
pub struct ZWaveFrame {
    /// 32-bit home/network ID
    pub home_id: u32,

    /// Source node ID
    pub source_id: u8,

    /// Frame control field: control flags in the high byte,
    /// sequence number in the low byte
    pub frame_control: u16,

    /// Frame length in octets, as transmitted
    pub length: u8,

    /// Destination node ID
    pub destination_id: u8,

    /// Command class
    pub command_class: u8,

    /// Command (subcommand within the class)
    pub command: u8,

    /// Payload bytes following the fixed header
    pub payload: Vec<u8>,

    /// Computed XOR checksum
    pub crc: u8,

    /// Whether the computed checksum matched the transmitted one
    pub crc_ok: bool,
}

impl ZWaveFrame {
    /// Frame control flags (high byte of the frame control field)
    pub fn control_flags(&self) -> u8 {
        ((self.frame_control >> 8) & 0xFF) as u8
    }

    /// Sequence number (low byte of the frame control field)
    pub fn sequence_number(&self) -> u8 {
        (self.frame_control & 0xFF) as u8
    }
}
