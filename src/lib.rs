//! Streaming decompression of raw DEFLATE (RFC 1951) and DEFLATE64 streams.
//!
//! The decoder is driven with caller-supplied buffers of arbitrary size and
//! suspends cleanly at any boundary: input may arrive one byte at a time,
//! output may be accepted one byte at a time, and resuming never changes
//! the decoded bytes. There is no container handling - feed it the raw bit
//! stream, not a zlib, gzip or ZIP wrapper.
//!
//! ```
//! use streaming_inflate64_rs::InflateStream;
//!
//! // A stored block holding "Hi".
//! let compressed = [0x01, 0x02, 0x00, 0xFD, 0xFF, 0x48, 0x69];
//!
//! let mut stream = InflateStream::new();
//! let mut output = [0u8; 64];
//! let result = stream.inflate(&compressed, &mut output).unwrap();
//!
//! assert!(result.eof);
//! assert_eq!(&output[..result.written], b"Hi");
//! ```
//!
//! A stream object allocates its Huffman tables and 64k history window once
//! in [`InflateStream::new`]; [`InflateStream::reset`] returns it to the
//! freshly created state without reallocating, and also unbinds the
//! Deflate/Deflate64 choice so the same object can decode the other flavor
//! next.

#[macro_use]
extern crate static_assertions;

mod bitstream;
mod decode_blocks;
mod deflate_constants;
pub mod errors;
mod huffman_tree;
mod window;

use decode_blocks::BlockDecoder;
pub use errors::{DataErrorKind, InflateError};

/// Which flavor of the bit stream a [`InflateStream`] decodes. The two
/// differ only in the interpretation of length symbol 285 and in whether
/// distance symbols 30/31 are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateMode {
    Deflate,
    Deflate64,
}

/// Progress made by a single [`InflateStream::inflate`] /
/// [`InflateStream::inflate64`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateResult {
    /// Bytes of the input slice that were consumed. The caller re-slices
    /// its input past this count before the next call.
    pub consumed: usize,
    /// Bytes of the output slice that now hold decoded data.
    pub written: usize,
    /// The final block has been fully decoded and delivered. Further calls
    /// keep reporting `eof` without touching either buffer.
    pub eof: bool,
}

/// A resumable Deflate/Deflate64 decoder.
///
/// All state lives inside the stream object; the input and output buffers
/// are only borrowed for the duration of one call, so the caller is free to
/// move, reuse or grow them between calls.
pub struct InflateStream {
    decoder: BlockDecoder,
    mode: Option<InflateMode>,
    total_in: u64,
    total_out: u64,
}

impl InflateStream {
    /// Create a stream, performing all allocations it will ever need.
    pub fn new() -> Self {
        Self {
            decoder: BlockDecoder::new(),
            mode: None,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Return the stream to its post-[`new`](Self::new) state without
    /// reallocating. Required after a data error; also clears the bound
    /// mode so the stream can switch between `inflate` and `inflate64`.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.mode = None;
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Decode a raw Deflate stream. Consumes input and produces output
    /// until one of them runs out, the stream ends or the data is invalid.
    pub fn inflate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<InflateResult, InflateError> {
        self.drive(InflateMode::Deflate, input, output)
    }

    /// Decode a raw Deflate64 stream. See [`inflate`](Self::inflate).
    pub fn inflate64(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<InflateResult, InflateError> {
        self.drive(InflateMode::Deflate64, input, output)
    }

    /// Total input bytes consumed since creation or the last reset. Updated
    /// even by calls that end in a data error.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total output bytes produced since creation or the last reset.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// The mode the stream got bound to by its first decode call, if any.
    pub fn mode(&self) -> Option<InflateMode> {
        self.mode
    }

    fn drive(
        &mut self,
        mode: InflateMode,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<InflateResult, InflateError> {
        /* The first decode call binds the stream to one flavor; mixing them
         * mid-stream would decode garbage, so it is rejected outright. */
        match self.mode {
            None => self.mode = Some(mode),
            Some(InflateMode::Deflate) if mode == InflateMode::Deflate64 => {
                return Err(InflateError::Arg(
                    "stream is bound to Deflate; reset it before calling inflate64",
                ));
            }
            Some(InflateMode::Deflate64) if mode == InflateMode::Deflate => {
                return Err(InflateError::Arg(
                    "stream is bound to Deflate64; reset it before calling inflate",
                ));
            }
            Some(_) => {}
        }

        let mut cursor = input;
        let mut written = 0usize;
        let outcome = self.decoder.run(mode, &mut cursor, output, &mut written);

        /* Counters reflect best-effort progress, also when the call ends in
         * a data error. */
        let consumed = input.len() - cursor.len();
        self.total_in += consumed as u64;
        self.total_out += written as u64;

        let eof = outcome?;
        Ok(InflateResult {
            consumed,
            written,
            eof,
        })
    }
}

impl Default for InflateStream {
    fn default() -> Self {
        Self::new()
    }
}
