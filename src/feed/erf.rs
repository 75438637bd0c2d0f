//! ERF capture framing: fixed 16-byte record headers followed by the
//! captured frame bytes, iterated off a buffered file handle.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::warn;
use zerocopy::byteorder::{BigEndian, LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::FeedError;

/// Size of the ERF record header.
pub const ERF_HEADER_LEN: usize = 16;

/// ERF record header. The record length is big-endian; the timestamp words
/// are little-endian.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ErfHeader {
    /// Nanosecond part of the capture timestamp.
    pub ts_nanos: U32<LittleEndian>,
    /// Second part of the capture timestamp.
    pub ts_seconds: U32<LittleEndian>,
    /// ERF record type.
    pub rec_type: u8,
    /// ERF flags.
    pub flags: u8,
    /// Record length including this header, big-endian.
    pub rlen: U16<BigEndian>,
    /// Loss counter / color field, unused here.
    pub color: U16<LittleEndian>,
    /// Wire length, unused here.
    pub wlen: U16<LittleEndian>,
}

impl ErfHeader {
    /// Capture timestamp in nanoseconds since the epoch.
    pub fn timestamp(&self) -> i64 {
        i64::from(self.ts_seconds.get()) * 1_000_000_000 + i64::from(self.ts_nanos.get())
    }
}

/// One captured record: timestamp plus the frame bytes that followed the
/// header (the first two payload bytes are link padding, left to the
/// caller to strip).
#[derive(Debug, Clone)]
pub struct ErfRecord {
    /// Capture timestamp in nanoseconds since the epoch.
    pub ts: i64,
    /// Frame bytes, `rlen - 16` of them.
    pub payload: Vec<u8>,
}

/// Iterator over the records of an ERF capture file.
///
/// A truncated trailing record ends iteration with a warning, mirroring
/// how capture tails are usually cut mid-write; a hard I/O error is
/// surfaced as [`FeedError::Read`].
#[derive(Debug)]
pub struct ErfReader {
    path: PathBuf,
    file: BufReader<File>,
}

impl ErfReader {
    /// Open a capture file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| FeedError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            file: BufReader::new(file),
        })
    }

    fn read_record(&mut self) -> Result<Option<ErfRecord>, FeedError> {
        let mut header_bytes = [0u8; ERF_HEADER_LEN];
        let got = self.read_full(&mut header_bytes)?;
        if got == 0 {
            return Ok(None);
        }
        if got < ERF_HEADER_LEN {
            warn!(path = %self.path.display(), "capture ends mid record header");
            return Ok(None);
        }

        let Ok(header) = ErfHeader::read_from_bytes(&header_bytes) else {
            return Ok(None);
        };
        let rlen = header.rlen.get() as usize;
        if rlen < ERF_HEADER_LEN {
            warn!(
                path = %self.path.display(),
                rlen, "capture record shorter than its header"
            );
            return Ok(None);
        }

        let mut payload = vec![0u8; rlen - ERF_HEADER_LEN];
        let got = self.read_full(&mut payload)?;
        if got < payload.len() {
            warn!(path = %self.path.display(), "capture ends mid record");
            return Ok(None);
        }

        Ok(Some(ErfRecord {
            ts: header.timestamp(),
            payload,
        }))
    }

    /// Read into `buf` until full or end of file, returning the byte count.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, FeedError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .file
                .read(&mut buf[filled..])
                .map_err(|source| FeedError::Read {
                    path: self.path.clone(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

impl Iterator for ErfReader {
    type Item = Result<ErfRecord, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
