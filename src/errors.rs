use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Error returned by [`InflateStream::inflate`] and
/// [`InflateStream::inflate64`].
///
/// [`InflateStream::inflate`]: crate::InflateStream::inflate
/// [`InflateStream::inflate64`]: crate::InflateStream::inflate64
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateError {
    /// The stream was driven in an invalid sequence, e.g. `inflate64` was
    /// called on a stream already bound to `inflate`. The stream itself is
    /// left unchanged.
    Arg(&'static str),
    /// The input is not a valid Deflate/Deflate64 stream. The stream is in
    /// an unspecified state and must be reset before further use.
    Data(DataErrorKind),
}

/// A structural inconsistency found in the compressed data. Each variant
/// carries the offending values so the rendered message can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataErrorKind {
    /// BTYPE was the reserved value 3.
    BadBlockType(u16),
    /// A stored block's LEN field did not match the one's complement NLEN.
    StoredLenMismatch { len: u16, nlen: u16 },
    /// A code-length vector assigns more codes of some length than that
    /// length can represent.
    OversubscribedLength {
        length: usize,
        count: u16,
        first_code: u16,
    },
    /// The consumed bit sequence matches no assigned codeword.
    UnassignedCode { bits: u16, bit_count: u32 },
    /// A previous-length repeat code (16) appeared before any length.
    RepeatWithoutPrevious,
    /// A previous-length repeat code would run past the expected number of
    /// code lengths.
    LengthRepeatOverflow { repeat: u16, remaining: u16 },
    /// A zero repeat code (17/18) would run past the expected number of
    /// code lengths.
    ZeroRepeatOverflow { repeat: u16, remaining: u16 },
    /// A literal/length symbol above 285 was decoded.
    BadLitLenSymbol(u16),
    /// Distance symbol 30 or 31 was decoded from a Deflate stream.
    BadDistanceSymbol(u16),
    /// A back-reference reaches behind the bytes decoded so far.
    DistanceTooFar { distance: u32, total_bytes: u64 },
}

impl Display for DataErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::BadBlockType(btype) => write!(f, "Unexpected block type '{btype}'"),
            Self::StoredLenMismatch { len, nlen } => write!(
                f,
                "Uncompressed block length ({len:04X}) does not match its encoded \
                 one's complement value ({nlen:04X})"
            ),
            Self::OversubscribedLength {
                length,
                count,
                first_code,
            } => write!(
                f,
                "Too many symbols with code length {length}. {count} symbols starting at \
                 {first_code:#X} exceeds the specified number of bits"
            ),
            Self::UnassignedCode { bits, bit_count } => write!(
                f,
                "Input bit sequence {bits:#X} ({bit_count} bits) is not a valid Huffman \
                 code for the encoded table"
            ),
            Self::RepeatWithoutPrevious => {
                write!(f, "Code length repeat code encountered at beginning of data")
            }
            Self::LengthRepeatOverflow { repeat, remaining } => write!(
                f,
                "Code length repeat code specifies {repeat} repetitions, but only \
                 {remaining} codes remain"
            ),
            Self::ZeroRepeatOverflow { repeat, remaining } => write!(
                f,
                "Zero repeat code specifies {repeat} repetitions, but only {remaining} \
                 codes remain"
            ),
            Self::BadLitLenSymbol(symbol) => {
                write!(f, "Invalid symbol '{symbol}' from literal/length tree")
            }
            Self::BadDistanceSymbol(symbol) => {
                write!(f, "Invalid distance symbol '{symbol}' for a Deflate stream")
            }
            Self::DistanceTooFar {
                distance,
                total_bytes,
            } => write!(
                f,
                "Compressed block has a distance '{distance}' which exceeds the size of \
                 the window ({total_bytes} bytes)"
            ),
        }
    }
}

impl Display for InflateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arg(msg) => f.write_str(msg),
            Self::Data(kind) => Display::fmt(kind, f),
        }
    }
}

impl Error for InflateError {}

impl From<DataErrorKind> for InflateError {
    fn from(kind: DataErrorKind) -> Self {
        Self::Data(kind)
    }
}
