//! Z-Wave symbol-stream decoding
//!
//! Pipeline: raw binary symbols → sliding-window preamble/SFD search →
//! Manchester chip decoding → fixed-offset field extraction → checksum
//! verification.

mod crc;
pub mod manchester;
pub mod parser;
mod sync;
mod types;

pub use sync::{FrameSynchronizer, SyncStats, WINDOW_SYMBOLS};
pub use types::ZWaveFrame;
