//! XOR checksum for Z-Wave R1/R2 frames

/// Checksum seed value
const CHECKSUM_SEED: u8 = 0xFF;

/// Compute the frame checksum: XOR over bytes [0, length-1), seeded with 0xFF.
///
/// `length` comes from the frame's own length field, not from the buffer
/// size (trust-but-verify). The range is clamped to the bytes actually
/// decoded so a lying length field cannot read past the frame.
pub fn frame_checksum(frame: &[u8], length: usize) -> u8 {
    let end = length.saturating_sub(1).min(frame.len());
    frame[..end].iter().fold(CHECKSUM_SEED, |crc, &b| crc ^ b)
}

/// Check a frame's checksum against its final byte.
/// Returns (computed, matches). An empty frame never matches.
pub fn check_checksum(frame: &[u8], length: usize) -> (u8, bool) {
    let crc = frame_checksum(frame, length);
    match frame.last() {
        Some(&last) => (crc, crc == last),
        None => (crc, false),
    }
}
