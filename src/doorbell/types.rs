//! Doorbell frame type

use serde::Serialize;

/// Decoded doorbell button press
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DoorbellFrame {
    /// 8-bit button/transmitter ID
    pub button_id: u8,

    /// 4-bit chime tone selector
    pub tone: u8,
}

impl DoorbellFrame {
    /// Reconstruct the frame from 13 classified bits.
    ///
    /// Bit 0 is a framing bit. Bits 1-8 carry the button ID and bits 9-12
    /// the tone, both transmitted least-significant-bit first: each step
    /// shifts the value right and inserts the next bit at the top, so the
    /// original value comes back exactly.
    pub fn from_bits(bits: &[u8; 13]) -> Self {
        let mut button_id: u8 = 0;
        for b in 0..8 {
            button_id >>= 1;
            button_id |= (bits[b + 1] & 1) << 7;
        }

        let mut tone: u8 = 0;
        for b in 0..4 {
            tone >>= 1;
            tone |= (bits[b + 9] & 1) << 3;
        }

        Self { button_id, tone }
    }
}
