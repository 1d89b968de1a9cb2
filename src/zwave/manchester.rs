//! Manchester chip-pair decoding
//!
//! Z-Wave R1/R2 transmit each bit as two chips. A falling chip pair (1,0)
//! carries a one, a rising pair (0,1) carries a zero. Any other pair is a
//! coding violation, which in practice marks idle air after the frame.

/// Result of decoding one chip pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
    /// Manchester violation (idle or noise)
    Invalid,
}

impl Bit {
    /// Binary value of a valid bit, None for a violation
    pub fn value(self) -> Option<u8> {
        match self {
            Bit::Zero => Some(0),
            Bit::One => Some(1),
            Bit::Invalid => None,
        }
    }
}

/// Decode a single chip pair
pub fn decode_pair(a: u8, b: u8) -> Bit {
    match (a, b) {
        (0, 1) => Bit::Zero,
        (1, 0) => Bit::One,
        _ => Bit::Invalid,
    }
}

/// Decode a chip window two chips at a time. A trailing odd chip is ignored.
pub fn decode(chips: &[u8]) -> Vec<Bit> {
    chips
        .chunks_exact(2)
        .map(|pair| decode_pair(pair[0], pair[1]))
        .collect()
}
