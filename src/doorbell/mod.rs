//! Doorbell OOK symbol-stream decoding
//!
//! Pipeline: thresholded binary symbols → inter-edge timing
//! classification → 13-bit frame accumulation → LSB-first field
//! reconstruction.

mod decoder;
mod types;

pub use decoder::TimingBitDecoder;
pub use types::DoorbellFrame;
