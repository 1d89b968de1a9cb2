//! Pulse-width bit classification for the doorbell protocol
//!
//! The transmitter keys the carrier on for a short burst (bit 1) or a
//! long burst (bit 0). After thresholding, the receiver sees a binary
//! level stream; the elapsed samples between edges classify each bit.
//! A bit is decided only on a high-to-low transition, where the elapsed
//! time is the width of the burst just ended.

use tracing::trace;

use super::types::DoorbellFrame;

/// A burst of at most this many samples classifies as bit 1
const SHORT_PULSE_MAX: u64 = 4;

/// An inter-edge gap beyond this many samples is idle air: the candidate
/// frame is discarded and accumulation starts over
const RESYNC_GAP: u64 = 50;

/// Fixed frame length in classified bits
const FRAME_BITS: usize = 13;

/// Decoder statistics
#[derive(Debug, Default)]
pub struct DecoderStats {
    pub symbols_processed: u64,
    pub edges: u64,
    pub resyncs: u64,
    pub frames_decoded: u64,
}

/// Pulse-width bit decoder.
///
/// Owns its accumulator exclusively. Feed it threshold symbols in arrival
/// order; it tracks the absolute stream index internally and always
/// consumes the whole batch. Malformed timing never raises: it just fails
/// to produce a 13th bit and classification continues.
pub struct TimingBitDecoder {
    last_level: u8,
    last_transition: u64,
    sample_counter: u64,
    bits: Vec<u8>,
    pub stats: DecoderStats,
}

impl TimingBitDecoder {
    pub fn new() -> Self {
        Self {
            last_level: 0,
            last_transition: 0,
            sample_counter: 0,
            bits: Vec::with_capacity(FRAME_BITS),
            stats: DecoderStats::default(),
        }
    }

    /// Process a batch of threshold symbols and return completed frames
    /// in the order their final bit was classified. Each byte is taken
    /// as one binary symbol.
    pub fn process_buffer(&mut self, symbols: &[u8]) -> Vec<DoorbellFrame> {
        let mut frames = Vec::new();

        for (x, &sym) in symbols.iter().enumerate() {
            let level = sym & 1;
            if level == self.last_level {
                continue;
            }

            // Elapsed samples since the previous level transition
            let index = self.sample_counter + x as u64;
            let elapsed = index - self.last_transition;
            self.last_transition = index;
            self.last_level = level;
            self.stats.edges += 1;

            if elapsed > RESYNC_GAP {
                if !self.bits.is_empty() {
                    trace!(elapsed, dropped = self.bits.len(), "sync lost, resetting accumulator");
                    self.stats.resyncs += 1;
                }
                self.bits.clear();
            }

            // Only a falling edge ends a burst and decides a bit
            if level == 0 {
                let bit = if elapsed <= SHORT_PULSE_MAX { 1 } else { 0 };
                self.bits.push(bit);

                if self.bits.len() == FRAME_BITS {
                    let mut frame_bits = [0u8; FRAME_BITS];
                    frame_bits.copy_from_slice(&self.bits);
                    frames.push(DoorbellFrame::from_bits(&frame_bits));
                    self.stats.frames_decoded += 1;
                    self.bits.clear();
                }
            }
        }

        self.sample_counter += symbols.len() as u64;
        self.stats.symbols_processed += symbols.len() as u64;

        frames
    }
}

impl Default for TimingBitDecoder {
    fn default() -> Self {
        Self::new()
    }
}
