//! Z-Wave field extraction
//!
//! Slices a decoded bit sequence into the fixed-offset header fields and
//! the trailing payload, then checks the XOR checksum. The length field
//! bounds the checksum range; a mismatch is reported in `crc_ok`, never
//! rejected here.

use super::crc::check_checksum;
use super::types::ZWaveFrame;

/// Fixed header size in bits. Packets at or below this size carry no
/// parseable fields.
pub const HEADER_BITS: usize = 88;

// Header field offsets (bit position, width)
const HOME_ID: (usize, usize) = (0, 32);
const SOURCE_ID: (usize, usize) = (32, 8);
const FRAME_CONTROL: (usize, usize) = (40, 16);
const LENGTH: (usize, usize) = (56, 8);
const DESTINATION_ID: (usize, usize) = (64, 8);
const COMMAND_CLASS: (usize, usize) = (72, 8);
const COMMAND: (usize, usize) = (80, 8);

/// Extract an unsigned value from `width` bits starting at `offset`,
/// most-significant bit first.
fn field(bits: &[u8], (offset, width): (usize, usize)) -> u64 {
    bits[offset..offset + width]
        .iter()
        .fold(0u64, |acc, &b| (acc << 1) | u64::from(b & 1))
}

/// Group a bit sequence into bytes, MSB first. Trailing bits that do not
/// fill a whole byte are dropped.
fn to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|byte| byte.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

/// Parse a packet bit sequence into a Z-Wave frame.
///
/// Returns None when the packet is too short to hold the fixed header
/// (structural short) - the caller treats that as a decode failure for
/// this window and moves on.
pub fn parse_frame(packet: &[u8]) -> Option<ZWaveFrame> {
    if packet.len() <= HEADER_BITS {
        return None;
    }

    let frame = to_bytes(packet);
    let length = field(packet, LENGTH) as u8;
    let (crc, crc_ok) = check_checksum(&frame, length as usize);

    Some(ZWaveFrame {
        home_id: field(packet, HOME_ID) as u32,
        source_id: field(packet, SOURCE_ID) as u8,
        frame_control: field(packet, FRAME_CONTROL) as u16,
        length,
        destination_id: field(packet, DESTINATION_ID) as u8,
        command_class: field(packet, COMMAND_CLASS) as u8,
        command: field(packet, COMMAND) as u8,
        payload: to_bytes(&packet[HEADER_BITS..]),
        crc,
        crc_ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expand bytes into an MSB-first bit sequence
    fn to_bits(bytes: &[u8]) -> Vec<u8> {
        let mut bits = Vec::with_capacity(bytes.len() * 8);
        for &byte in bytes {
            for i in (0..8).rev() {
                bits.push((byte >> i) & 1);
            }
        }
        bits
    }

    /// Build a 13-byte frame (11-byte header, one payload byte, checksum)
    /// with a valid checksum and a truthful length field
    fn sample_frame() -> Vec<u8> {
        let mut bytes = hex::decode("DEADBEEF01410C0D010502").unwrap();
        bytes.push(0x42); // one payload byte
        let crc = bytes.iter().fold(0xFFu8, |crc, &b| crc ^ b);
        bytes.push(crc);
        bytes
    }

    #[test]
    fn test_parse_full_frame() {
        let bytes = sample_frame();
        let frame = parse_frame(&to_bits(&bytes)).unwrap();

        assert_eq!(frame.home_id, 0xDEADBEEF);
        assert_eq!(frame.source_id, 0x01);
        assert_eq!(frame.frame_control, 0x410C);
        assert_eq!(frame.control_flags(), 0x41);
        assert_eq!(frame.sequence_number(), 0x0C);
        assert_eq!(frame.length, 13);
        assert_eq!(frame.destination_id, 0x01);
        assert_eq!(frame.command_class, 0x05);
        assert_eq!(frame.command, 0x02);
        assert_eq!(frame.payload, vec![0x42, frame.crc]);
        assert!(frame.crc_ok);
    }

    #[test]
    fn test_checksum_range_follows_length_field() {
        // A length field shorter than the decoded buffer shrinks the
        // checksum range accordingly
        let mut bytes = sample_frame();
        bytes[7] = 12;
        let crc = bytes[..11].iter().fold(0xFFu8, |crc, &b| crc ^ b);
        let last = bytes.len() - 1;
        bytes[last] = crc;

        let frame = parse_frame(&to_bits(&bytes)).unwrap();
        assert_eq!(frame.crc, crc);
        assert!(frame.crc_ok);
    }

    #[test]
    fn test_checksum_mismatch_still_parses() {
        let mut bytes = sample_frame();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xA5; // corrupt the transmitted checksum

        let frame = parse_frame(&to_bits(&bytes)).unwrap();
        assert!(!frame.crc_ok);
        assert_eq!(frame.home_id, 0xDEADBEEF);
    }

    #[test]
    fn test_minimum_length_boundary() {
        // Exactly 88 bits: no fields
        assert!(parse_frame(&vec![0u8; 88]).is_none());
        assert!(parse_frame(&vec![0u8; 17]).is_none());
        assert!(parse_frame(&[]).is_none());

        // 89 bits: fields parse, payload has no whole byte
        let frame = parse_frame(&vec![0u8; 89]).unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_partial_payload_bits_dropped() {
        // 11 header+crc bytes plus 5 stray bits
        let mut bits = to_bits(&sample_frame());
        bits.extend_from_slice(&[1, 0, 1, 0, 1]);
        let frame = parse_frame(&bits).unwrap();
        assert_eq!(frame.payload.len(), 2);
    }
}
