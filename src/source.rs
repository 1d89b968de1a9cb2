//! Symbol sources: file playback and UDP datagram ingestion
//!
//! Both sources deliver raw symbol bytes in batches. Each byte is one
//! binary symbol; raw 0/1 values and ASCII '0'/'1' are both accepted
//! downstream (only the low bit is significant).

use std::fs::File;
use std::io::{self, Read};
use std::net::UdpSocket;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Where the symbol stream comes from
#[derive(Debug, Clone)]
pub enum SymbolInput {
    /// Recorded symbol file, one byte per symbol
    File(PathBuf),
    /// Non-blocking UDP socket on localhost
    Udp(u16),
}

/// Symbol source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open input file {path}: {source}")]
    Open {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        source: io::Error,
    },

    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of one source poll
#[derive(Debug, PartialEq, Eq)]
pub enum Poll {
    /// `n` symbol bytes were written to the front of the batch buffer
    Data(usize),
    /// Nothing available this cycle; try again
    Pending,
    /// The source is exhausted (file fully played back)
    Finished,
}

/// Pull-based producer of symbol batches
pub trait SymbolSource: Send {
    /// Fill `buf` with as many symbol bytes as are available right now
    fn poll(&mut self, buf: &mut [u8]) -> Result<Poll, SourceError>;
}

/// Open the configured symbol source
pub fn open(input: &SymbolInput) -> Result<Box<dyn SymbolSource>, SourceError> {
    match input {
        SymbolInput::File(path) => Ok(Box::new(FileSource::open(path)?)),
        SymbolInput::Udp(port) => Ok(Box::new(UdpSource::bind(*port)?)),
    }
}

/// Chunked playback of a recorded symbol file
pub struct FileSource {
    file: File,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        info!("reading symbols from {}", path.display());
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { file })
    }
}

impl SymbolSource for FileSource {
    fn poll(&mut self, buf: &mut [u8]) -> Result<Poll, SourceError> {
        match self.file.read(buf)? {
            0 => Ok(Poll::Finished),
            n => Ok(Poll::Data(n)),
        }
    }
}

/// Non-blocking UDP datagram source. A cycle with no datagram pending is
/// not an error; the capture loop simply re-polls.
pub struct UdpSource {
    socket: UdpSocket,
}

impl UdpSource {
    pub fn bind(port: u16) -> Result<Self, SourceError> {
        let socket = UdpSocket::bind(("127.0.0.1", port))
            .map_err(|source| SourceError::Bind { port, source })?;
        socket
            .set_nonblocking(true)
            .map_err(|source| SourceError::Bind { port, source })?;
        info!("listening for symbols on udp/{}", port);
        Ok(Self { socket })
    }
}

impl SymbolSource for UdpSource {
    fn poll(&mut self, buf: &mut [u8]) -> Result<Poll, SourceError> {
        match self.socket.recv(buf) {
            Ok(n) => Ok(Poll::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Poll::Pending),
            Err(e) => Err(e.into()),
        }
    }
}
