//! Z-Wave frame synchronization
//!
//! Scans the raw symbol stream for the preamble, then the start-of-frame
//! delimiter, over a bounded sliding window:
//! 1. Buffer incoming symbols (capacity = one search window)
//! 2. Match the 32-symbol preamble at the window head
//! 3. Match the 16-symbol SFD at the window head
//! 4. Manchester-decode the window, truncate at the first violation
//! 5. Parse header fields and verify the checksum
//!
//! A miss in either state slips the window by one symbol, so memory stays
//! bounded and the search always makes forward progress.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::manchester;
use super::parser::parse_frame;
use super::types::ZWaveFrame;

/// Maximum MAC frame length in octets
pub const MTU: usize = 170;
/// Extra margin for the preamble, in octets
pub const MTU_MARGIN: usize = 40;
/// Search window size (and buffer capacity) in symbols
pub const WINDOW_SYMBOLS: usize = 8 * (MTU + MTU_MARGIN);

/// Preamble: eight repetitions of 1,1,0,0
const PREAMBLE: [u8; 32] = [
    1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0,
    1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0,
];

/// Start-of-frame delimiter: 1,0 repeated four times, then 0,1 repeated
/// four times (Manchester for 0xF0)
const SFD: [u8; 16] = [1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 1];

/// Decoded bits occupied by the SFD remnant at the head of a window
const SFD_BITS: usize = SFD.len() / 2;

/// Give up on the SFD and fall back to preamble search after this many
/// unmatched attempts
const SFD_SEARCH_LIMIT: u32 = 1000;

/// Bounded sliding window over the raw symbol stream.
///
/// O(1) append at the tail and removal at the head. When the buffer is
/// full and no frame has been located, the head symbol is evicted: the
/// search window slips rather than failing.
#[derive(Debug)]
pub struct SymbolBuffer {
    symbols: VecDeque<u8>,
    capacity: usize,
}

impl SymbolBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            symbols: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_full(&self) -> bool {
        self.symbols.len() >= self.capacity
    }

    pub fn push(&mut self, symbol: u8) {
        self.symbols.push_back(symbol & 1);
    }

    /// Drop the head symbol (window slip)
    pub fn evict(&mut self) {
        self.symbols.pop_front();
    }

    /// Compare the leading symbols against a pattern
    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.symbols.len() >= pattern.len()
            && self.symbols.iter().take(pattern.len()).eq(pattern.iter())
    }

    /// Copy out up to `n` leading symbols
    pub fn window(&self, n: usize) -> Vec<u8> {
        self.symbols.iter().take(n).copied().collect()
    }

    /// Remove up to `n` symbols from the head
    pub fn drain_front(&mut self, n: usize) {
        let n = n.min(self.symbols.len());
        self.symbols.drain(..n);
    }
}

/// Synchronizer search state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    SearchingPreamble,
    SearchingDelimiter,
}

/// Synchronizer statistics
#[derive(Debug, Default)]
pub struct SyncStats {
    pub symbols_processed: u64,
    pub preambles_detected: u64,
    pub delimiters_detected: u64,
    pub frames_decoded: u64,
    pub crc_errors: u64,
    pub decode_errors: u64,
    pub resyncs: u64,
}

/// Z-Wave frame synchronizer.
///
/// Owns its symbol buffer exclusively; callers feed symbol batches in
/// arrival order and collect any frames whose terminating condition was
/// detected within the batch. Runs indefinitely - there is no terminal
/// state.
pub struct FrameSynchronizer {
    buffer: SymbolBuffer,
    state: SyncState,
    sfd_attempts: u32,
    pub stats: SyncStats,
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self {
            buffer: SymbolBuffer::new(WINDOW_SYMBOLS),
            state: SyncState::SearchingPreamble,
            sfd_attempts: 0,
            stats: SyncStats::default(),
        }
    }

    /// Number of symbols currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Process a batch of symbols and return completed frames in the
    /// order their end was detected. Each byte is taken as one binary
    /// symbol.
    pub fn process_buffer(&mut self, symbols: &[u8]) -> Vec<ZWaveFrame> {
        let mut frames = Vec::new();
        for &s in symbols {
            self.buffer.push(s);
            self.stats.symbols_processed += 1;
            if let Some(frame) = self.advance() {
                frames.push(frame);
            }
        }
        frames
    }

    /// One cycle of the search state machine: run the current state
    /// against the buffer head, then slip the window if it is full.
    fn advance(&mut self) -> Option<ZWaveFrame> {
        let frame = match self.state {
            SyncState::SearchingPreamble => {
                self.search_preamble();
                None
            }
            SyncState::SearchingDelimiter => self.search_delimiter(),
        };

        if self.buffer.is_full() {
            self.buffer.evict();
        }

        frame
    }

    /// Look for the preamble once a full search window is buffered
    fn search_preamble(&mut self) {
        if self.buffer.len() >= WINDOW_SYMBOLS && self.buffer.starts_with(&PREAMBLE) {
            trace!("preamble found");
            self.stats.preambles_detected += 1;
            self.sfd_attempts = 0;
            self.state = SyncState::SearchingDelimiter;
        }
    }

    /// Look for the SFD at the window head; on a hit, decode the window
    fn search_delimiter(&mut self) -> Option<ZWaveFrame> {
        if self.sfd_attempts > SFD_SEARCH_LIMIT {
            debug!(attempts = self.sfd_attempts, "bailing from SFD search");
            self.stats.resyncs += 1;
            self.state = SyncState::SearchingPreamble;
            return None;
        }

        if !self.buffer.starts_with(&SFD) {
            self.sfd_attempts += 1;
            return None;
        }

        trace!("SFD found");
        self.stats.delimiters_detected += 1;

        // Decode the full leading window. The first Manchester violation
        // is idle air past the end of the frame; the bits before it,
        // minus the SFD remnant, are the packet.
        let window = self.buffer.window(WINDOW_SYMBOLS);
        let decoded = manchester::decode(&window);
        let packet: Vec<u8> = decoded.iter().map_while(|b| b.value()).collect();

        let frame = parse_frame(packet.get(SFD_BITS..).unwrap_or(&[]));
        match &frame {
            Some(f) => {
                self.stats.frames_decoded += 1;
                if !f.crc_ok {
                    self.stats.crc_errors += 1;
                }
            }
            None => {
                debug!(bits = packet.len(), "decoding error: packet too short");
                self.stats.decode_errors += 1;
            }
        }

        // One buffered symbol is consumed per decoded bit entry
        self.buffer.drain_front(decoded.len());
        self.state = SyncState::SearchingPreamble;

        frame
    }
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Manchester-encode bytes MSB-first into a chip sequence
    fn encode_chips(bytes: &[u8]) -> Vec<u8> {
        let mut chips = Vec::with_capacity(bytes.len() * 16);
        for &byte in bytes {
            for i in (0..8).rev() {
                if (byte >> i) & 1 == 1 {
                    chips.extend_from_slice(&[1, 0]);
                } else {
                    chips.extend_from_slice(&[0, 1]);
                }
            }
        }
        chips
    }

    /// 13-byte frame with a valid checksum: 11-byte header, one payload
    /// byte, checksum byte
    fn sample_frame_bytes() -> Vec<u8> {
        let mut bytes = hex::decode("DEADBEEF01410C0D010502").unwrap();
        bytes.push(0x42);
        let crc = bytes.iter().fold(0xFFu8, |crc, &b| crc ^ b);
        bytes.push(crc);
        bytes
    }

    /// Symbol stream: preamble, SFD, encoded frame, idle zeros. Padded
    /// past one window plus the preamble length so the head slides onto
    /// the SFD.
    fn sample_stream() -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(&PREAMBLE);
        stream.extend_from_slice(&SFD);
        stream.extend(encode_chips(&sample_frame_bytes()));
        stream.resize(WINDOW_SYMBOLS + PREAMBLE.len(), 0);
        stream
    }

    #[test]
    fn test_buffer_bound_without_preamble() {
        let mut sync = FrameSynchronizer::new();
        for chunk in vec![0u8; 5 * WINDOW_SYMBOLS].chunks(97) {
            let frames = sync.process_buffer(chunk);
            assert!(frames.is_empty());
            assert!(sync.buffered() <= WINDOW_SYMBOLS);
        }
        assert_eq!(sync.stats.preambles_detected, 0);
    }

    #[test]
    fn test_buffer_starts_with_and_drain() {
        let mut buf = SymbolBuffer::new(8);
        for s in [1, 1, 0, 0, 1] {
            buf.push(s);
        }
        assert!(buf.starts_with(&[1, 1, 0]));
        assert!(!buf.starts_with(&[1, 0]));
        assert!(!buf.starts_with(&[1, 1, 0, 0, 1, 1])); // longer than contents
        buf.drain_front(3);
        assert_eq!(buf.len(), 2);
        assert!(buf.starts_with(&[0, 1]));
    }

    #[test]
    fn test_synchronizes_on_synthetic_stream() {
        let mut sync = FrameSynchronizer::new();
        let frames = sync.process_buffer(&sample_stream());

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.home_id, 0xDEADBEEF);
        assert_eq!(frame.source_id, 0x01);
        assert_eq!(frame.length, 13);
        assert_eq!(frame.command_class, 0x05);
        assert!(frame.crc_ok);

        assert_eq!(sync.stats.preambles_detected, 1);
        assert_eq!(sync.stats.delimiters_detected, 1);
        assert_eq!(sync.stats.frames_decoded, 1);
        assert_eq!(sync.stats.crc_errors, 0);
    }

    #[test]
    fn test_corrupted_checksum_still_emitted() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&PREAMBLE);
        stream.extend_from_slice(&SFD);
        let mut bytes = sample_frame_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xA5;
        stream.extend(encode_chips(&bytes));
        stream.resize(WINDOW_SYMBOLS + PREAMBLE.len(), 0);

        let mut sync = FrameSynchronizer::new();
        let frames = sync.process_buffer(&stream);

        assert_eq!(frames.len(), 1);
        assert!(!frames[0].crc_ok);
        assert_eq!(sync.stats.crc_errors, 1);
    }

    #[test]
    fn test_sfd_search_bails_out() {
        // Preamble at the head of a full window, then nothing but idle:
        // the delimiter search must give up and resume preamble search
        let mut stream = Vec::new();
        stream.extend_from_slice(&PREAMBLE);
        stream.resize(WINDOW_SYMBOLS + 1100, 0);

        let mut sync = FrameSynchronizer::new();
        let frames = sync.process_buffer(&stream);

        assert!(frames.is_empty());
        assert_eq!(sync.stats.preambles_detected, 1);
        assert_eq!(sync.stats.resyncs, 1);
        assert_eq!(sync.stats.delimiters_detected, 0);
    }

    #[test]
    fn test_short_window_counts_decode_error() {
        // SFD followed immediately by idle: no header to parse
        let mut stream = Vec::new();
        stream.extend_from_slice(&PREAMBLE);
        stream.extend_from_slice(&SFD);
        stream.resize(WINDOW_SYMBOLS + PREAMBLE.len(), 0);

        let mut sync = FrameSynchronizer::new();
        let frames = sync.process_buffer(&stream);

        assert!(frames.is_empty());
        assert_eq!(sync.stats.decode_errors, 1);
    }
}
