use crate::bitstream::BitStream;
use crate::deflate_constants::*;
use crate::errors::{DataErrorKind, InflateError};
use crate::huffman_tree::HuffmanTree;
use crate::window::Window;
use crate::InflateMode;
use log::debug;
use nightly_quirks::branch_pred::{likely, unlikely};

const_assert!(DEFLATE_NUM_LITLEN_SYMS == ((1 << 5) - 1) + 257);
const_assert!(DEFLATE_NUM_DIST_SYMS == ((1 << 5) - 1) + 1);
const_assert!(DEFLATE_NUM_PRECODE_SYMS == ((1 << 4) - 1) + 4);

/* The literal/length and distance code lengths of a dynamic block arrive as
 * one run-length-encoded sequence, so they share one scratch array. */
const DYNAMIC_LENS_SCRATCH: usize = DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_DIST_SYMS;

/*
 * Where the decoder is inside the stream. Every variant is a point at which
 * a call may have suspended for more input or output space, and carries
 * exactly the scratch that state needs to resume.
 */
pub(crate) enum DecodeState {
    /* Start of a block. */
    ReadBfinal,
    ReadBtype,

    /* Stored (uncompressed) blocks. */
    StoredLen,
    StoredNlen { len: u16 },
    StoredData { remaining: u16 },

    /* Dynamic block header. */
    DynHlit,
    DynHdist { hlit: u16 },
    DynHclen { hlit: u16, hdist: u16 },
    DynCodeLenCodes {
        hlit: u16,
        hdist: u16,
        hclen: u16,
        index: u16,
        lens: [u8; DEFLATE_NUM_PRECODE_SYMS],
    },
    DynTreeCodes {
        hlit: u16,
        hdist: u16,
        index: u16,
        /* A repeat code whose extra bits are still unread. */
        repeat: Option<u8>,
        lens: [u8; DYNAMIC_LENS_SCRATCH],
    },

    /* Compressed data, static or dynamic. */
    LitLenCode,
    DecodeLitLen { symbol: u16 },
    LengthExtra { length: u32, extra_bits: u8 },
    DistCode { length: u32 },
    DistExtra {
        length: u32,
        distance: u32,
        extra_bits: u8,
    },
    BackRefCopy { length: u32, distance: u32 },

    /* End of block: the window still has to reach the output. */
    BlockEnd,

    /* Final block fully decoded and drained. */
    Eof,
}

enum Flow {
    Continue,
    Suspend,
    Eof,
}

pub(crate) struct BlockDecoder {
    state: DecodeState,
    bfinal: bool,
    bitstream: BitStream,
    window: Window,
    code_length_tree: HuffmanTree,
    literal_length_tree: HuffmanTree,
    distance_tree: HuffmanTree,
    static_tables_loaded: bool,
}

impl BlockDecoder {
    pub fn new() -> Self {
        Self {
            state: DecodeState::ReadBfinal,
            bfinal: false,
            bitstream: BitStream::new(),
            window: Window::new(),
            code_length_tree: HuffmanTree::for_code_length(),
            literal_length_tree: HuffmanTree::for_literal_length(),
            distance_tree: HuffmanTree::for_distance(),
            static_tables_loaded: false,
        }
    }

    pub fn reset(&mut self) {
        self.state = DecodeState::ReadBfinal;
        self.bfinal = false;
        self.bitstream.reset();
        self.window.reset();
        // The trees rebuild on demand; their allocations are reused as-is.
        self.static_tables_loaded = false;
    }

    /*
     * Advance decoding until the input runs dry, the output fills up, the
     * stream ends (Ok(true)) or the data turns out to be invalid. `input`
     * is advanced past consumed bytes and `written` counts output bytes,
     * both also when the call ends in an error.
     */
    pub fn run(
        &mut self,
        mode: InflateMode,
        input: &mut &[u8],
        output: &mut [u8],
        written: &mut usize,
    ) -> Result<bool, InflateError> {
        let result = loop {
            match self.step(mode, input, output, written) {
                Ok(Flow::Continue) => continue,
                other => break other,
            }
        };

        // Surface whatever the window already holds, even on failure.
        *written += self.window.drain_to(&mut output[*written..]);

        match result {
            Ok(Flow::Suspend) => {
                /* A lone unread byte cannot satisfy a 16-bit read or a long
                 * codeword, so park it; otherwise one-byte-at-a-time
                 * callers would never see it consumed. */
                if input.len() == 1 && self.bitstream.can_cache_byte() {
                    self.bitstream.cache_byte(input);
                }
                Ok(false)
            }
            Ok(Flow::Eof) => Ok(true),
            Ok(Flow::Continue) => unreachable!(),
            Err(err) => Err(err),
        }
    }

    /* One state transition. Ok(Flow::Continue) means the state advanced. */
    fn step(
        &mut self,
        mode: InflateMode,
        input: &mut &[u8],
        output: &mut [u8],
        written: &mut usize,
    ) -> Result<Flow, InflateError> {
        let flow = match self.state {
            DecodeState::ReadBfinal => match self.bitstream.read_bits(input, 1) {
                Some(bit) => {
                    self.bfinal = bit != 0;
                    self.state = DecodeState::ReadBtype;
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::ReadBtype => match self.bitstream.read_bits(input, 2) {
                Some(btype) => {
                    debug!("block header: bfinal={} btype={}", self.bfinal, btype);
                    match btype {
                        DEFLATE_BLOCKTYPE_UNCOMPRESSED => {
                            /* LEN starts at the next byte boundary. Aligning
                             * never suspends, so it needs no state. */
                            self.bitstream.byte_align();
                            self.state = DecodeState::StoredLen;
                        }
                        DEFLATE_BLOCKTYPE_STATIC_HUFFMAN => {
                            /* Skip the rebuild when the static tables are
                             * still in place from an earlier static block;
                             * runs of tiny static blocks are common in
                             * degenerate streams. */
                            if !self.static_tables_loaded {
                                self.load_static_tables();
                                self.static_tables_loaded = true;
                            }
                            self.state = DecodeState::LitLenCode;
                        }
                        DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN => {
                            self.static_tables_loaded = false;
                            self.state = DecodeState::DynHlit;
                        }
                        _ => return Err(DataErrorKind::BadBlockType(btype).into()),
                    }
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::StoredLen => match self.bitstream.read_bits(input, 16) {
                Some(len) => {
                    self.state = DecodeState::StoredNlen { len };
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::StoredNlen { len } => match self.bitstream.read_bits(input, 16) {
                Some(nlen) => {
                    if len != !nlen {
                        return Err(DataErrorKind::StoredLenMismatch { len, nlen }.into());
                    }
                    self.state = DecodeState::StoredData { remaining: len };
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::StoredData { ref mut remaining } => {
                /* `unconsumed + remaining` only ever shrinks, so the copy
                 * always fits the window. */
                let copied =
                    self.window
                        .copy_from_input(&mut self.bitstream, input, *remaining as usize);
                *remaining -= copied as u16;
                *written += self.window.drain_to(&mut output[*written..]);

                if *remaining == 0 && self.window.unconsumed() == 0 {
                    self.state = if self.bfinal {
                        DecodeState::Eof
                    } else {
                        DecodeState::ReadBfinal
                    };
                    Flow::Continue
                } else {
                    Flow::Suspend
                }
            }

            DecodeState::DynHlit => match self.bitstream.read_bits(input, 5) {
                Some(value) => {
                    self.state = DecodeState::DynHdist { hlit: value + 257 };
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::DynHdist { hlit } => match self.bitstream.read_bits(input, 5) {
                Some(value) => {
                    self.state = DecodeState::DynHclen {
                        hlit,
                        hdist: value + 1,
                    };
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::DynHclen { hlit, hdist } => match self.bitstream.read_bits(input, 4) {
                Some(value) => {
                    self.state = DecodeState::DynCodeLenCodes {
                        hlit,
                        hdist,
                        hclen: value + 4,
                        index: 0,
                        lens: [0; DEFLATE_NUM_PRECODE_SYMS],
                    };
                    Flow::Continue
                }
                None => Flow::Suspend,
            },

            DecodeState::DynCodeLenCodes {
                hlit,
                hdist,
                hclen,
                ref mut index,
                ref mut lens,
            } => {
                while *index < hclen {
                    match self.bitstream.read_bits(input, 3) {
                        Some(len) => {
                            lens[PRECODE_LENS_PERMUTATION[*index as usize] as usize] = len as u8;
                            *index += 1;
                        }
                        None => return Ok(Flow::Suspend),
                    }
                }
                /* Entries beyond HCLEN keep length zero. */

                debug!("dynamic block header: hlit={hlit} hdist={hdist} hclen={hclen}");
                self.code_length_tree.rebuild(&lens[..])?;
                self.state = DecodeState::DynTreeCodes {
                    hlit,
                    hdist,
                    index: 0,
                    repeat: None,
                    lens: [0; DYNAMIC_LENS_SCRATCH],
                };
                Flow::Continue
            }

            DecodeState::DynTreeCodes {
                hlit,
                hdist,
                ref mut index,
                ref mut repeat,
                ref mut lens,
            } => {
                let total = hlit + hdist;
                while *index < total {
                    let code = match *repeat {
                        Some(code) => code,
                        None => {
                            match self.code_length_tree.lookup(&mut self.bitstream, input)? {
                                Some(symbol) => symbol as u8,
                                None => return Ok(Flow::Suspend),
                            }
                        }
                    };

                    if code <= 15 {
                        /* Explicit code length. */
                        lens[*index as usize] = code;
                        *index += 1;
                        *repeat = None;
                        continue;
                    }

                    /* Run-length encoded lengths. Remember the symbol so a
                     * suspended extra-bits read resumes without decoding it
                     * again. */
                    *repeat = Some(code);
                    let (extra_bits, repeat_base) = match code {
                        16 => (2, 3u16),
                        17 => (3, 3),
                        _ => (7, 11),
                    };
                    let extra = match self.bitstream.read_bits(input, extra_bits) {
                        Some(extra) => extra,
                        None => return Ok(Flow::Suspend),
                    };
                    let count = repeat_base + extra;

                    if code == 16 {
                        /* Repeat the previous code length 3-6 times. */
                        if *index == 0 {
                            return Err(DataErrorKind::RepeatWithoutPrevious.into());
                        }
                        if *index + count > total {
                            return Err(DataErrorKind::LengthRepeatOverflow {
                                repeat: count,
                                remaining: total - *index,
                            }
                            .into());
                        }
                        let previous = lens[*index as usize - 1];
                        for _ in 0..count {
                            lens[*index as usize] = previous;
                            *index += 1;
                        }
                    } else {
                        /* Repeat zero 3-10 (code 17) or 11-138 (18) times. */
                        if *index + count > total {
                            return Err(DataErrorKind::ZeroRepeatOverflow {
                                repeat: count,
                                remaining: total - *index,
                            }
                            .into());
                        }
                        for _ in 0..count {
                            lens[*index as usize] = 0;
                            *index += 1;
                        }
                    }
                    *repeat = None;
                }

                self.literal_length_tree.rebuild(&lens[..hlit as usize])?;
                self.distance_tree
                    .rebuild(&lens[hlit as usize..total as usize])?;
                self.state = DecodeState::LitLenCode;
                Flow::Continue
            }

            DecodeState::LitLenCode => {
                let fast_margin = match mode {
                    InflateMode::Deflate => FAST_PATH_MIN_INPUT,
                    InflateMode::Deflate64 => FAST_PATH_MIN_INPUT64,
                };
                let symbol = if likely(input.len() >= fast_margin) {
                    self.literal_length_tree
                        .lookup_unchecked(&mut self.bitstream, input)?
                } else {
                    match self.literal_length_tree.lookup(&mut self.bitstream, input)? {
                        Some(symbol) => symbol,
                        None => return Ok(Flow::Suspend),
                    }
                };
                self.state = DecodeState::DecodeLitLen { symbol };
                Flow::Continue
            }

            DecodeState::DecodeLitLen { symbol } => {
                if likely(symbol < 256) {
                    let byte = symbol as u8;
                    if self.window.unconsumed() == 0 && *written < output.len() {
                        /* Nothing is queued, so the literal can go straight
                         * to the output while still entering the history. */
                        output[*written] = byte;
                        *written += 1;
                        self.window.write_byte_consumed(byte);
                    } else if !self.window.write_byte(byte) {
                        let drained = self.window.drain_to(&mut output[*written..]);
                        *written += drained;
                        if drained == 0 {
                            return Ok(Flow::Suspend);
                        }
                        let ok = self.window.write_byte(byte);
                        debug_assert!(ok);
                    }
                    self.state = DecodeState::LitLenCode;
                    Flow::Continue
                } else if symbol == 256 {
                    self.state = DecodeState::BlockEnd;
                    Flow::Continue
                } else if unlikely(symbol > 285) {
                    return Err(DataErrorKind::BadLitLenSymbol(symbol).into());
                } else {
                    let entry = (symbol - 257) as usize;
                    let (base, extra_bits) = match mode {
                        InflateMode::Deflate => (LENGTH_BASE[entry], LENGTH_EXTRA_BITS[entry]),
                        InflateMode::Deflate64 => {
                            (LENGTH_BASE64[entry], LENGTH_EXTRA_BITS64[entry])
                        }
                    };
                    self.state = DecodeState::LengthExtra {
                        length: base as u32,
                        extra_bits,
                    };
                    Flow::Continue
                }
            }

            DecodeState::LengthExtra { length, extra_bits } => {
                if extra_bits == 0 {
                    self.state = DecodeState::DistCode { length };
                    Flow::Continue
                } else {
                    /* Two whole bytes cover any read of up to 16 bits. */
                    let extra = if likely(input.len() >= 2) {
                        self.bitstream.read_bits_unchecked(input, extra_bits as u32)
                    } else {
                        match self.bitstream.read_bits(input, extra_bits as u32) {
                            Some(extra) => extra,
                            None => return Ok(Flow::Suspend),
                        }
                    };
                    self.state = DecodeState::DistCode {
                        length: length + extra as u32,
                    };
                    Flow::Continue
                }
            }

            DecodeState::DistCode { length } => {
                let symbol = if likely(input.len() >= 2) {
                    self.distance_tree
                        .lookup_unchecked(&mut self.bitstream, input)?
                } else {
                    match self.distance_tree.lookup(&mut self.bitstream, input)? {
                        Some(symbol) => symbol,
                        None => return Ok(Flow::Suspend),
                    }
                };

                if mode == InflateMode::Deflate && unlikely(symbol > DEFLATE_MAX_DIST_SYM) {
                    return Err(DataErrorKind::BadDistanceSymbol(symbol).into());
                }
                debug_assert!(symbol <= DEFLATE64_MAX_DIST_SYM);

                let entry = symbol as usize;
                self.state = DecodeState::DistExtra {
                    length,
                    distance: DISTANCE_BASE[entry] as u32,
                    extra_bits: DISTANCE_EXTRA_BITS[entry],
                };
                Flow::Continue
            }

            DecodeState::DistExtra {
                length,
                distance,
                extra_bits,
            } => {
                if extra_bits == 0 {
                    self.state = DecodeState::BackRefCopy { length, distance };
                    Flow::Continue
                } else {
                    let extra = if likely(input.len() >= 2) {
                        self.bitstream.read_bits_unchecked(input, extra_bits as u32)
                    } else {
                        match self.bitstream.read_bits(input, extra_bits as u32) {
                            Some(extra) => extra,
                            None => return Ok(Flow::Suspend),
                        }
                    };
                    self.state = DecodeState::BackRefCopy {
                        length,
                        distance: distance + extra as u32,
                    };
                    Flow::Continue
                }
            }

            DecodeState::BackRefCopy {
                ref mut length,
                distance,
            } => {
                /* A Deflate64 length can exceed the window size, so the
                 * copy may need several rounds with drains in between. */
                match self.window.copy_back_reference(distance, *length) {
                    None => {
                        return Err(DataErrorKind::DistanceTooFar {
                            distance,
                            total_bytes: self.window.total_written(),
                        }
                        .into());
                    }
                    Some(copied) => {
                        *length -= copied as u32;
                        *written += self.window.drain_to(&mut output[*written..]);

                        if *length == 0 && self.window.unconsumed() == 0 {
                            self.state = DecodeState::LitLenCode;
                            Flow::Continue
                        } else if *written == output.len() {
                            Flow::Suspend
                        } else {
                            /* The drain freed window space; copy again. */
                            Flow::Continue
                        }
                    }
                }
            }

            DecodeState::BlockEnd => {
                *written += self.window.drain_to(&mut output[*written..]);
                if self.window.unconsumed() == 0 {
                    debug!("block end: bfinal={}", self.bfinal);
                    self.state = if self.bfinal {
                        DecodeState::Eof
                    } else {
                        DecodeState::ReadBfinal
                    };
                    Flow::Continue
                } else {
                    Flow::Suspend
                }
            }

            DecodeState::Eof => Flow::Eof,
        };

        Ok(flow)
    }

    /* RFC 1951, section 3.2.6: the fixed code lengths for BTYPE=1 blocks,
     * rebuilt into the same structures the dynamic path uses. */
    fn load_static_tables(&mut self) {
        let mut lens = [0u8; DEFLATE_NUM_LITLEN_SYMS];
        lens[..144].fill(8);
        lens[144..256].fill(9);
        lens[256..280].fill(7);
        lens[280..].fill(8);

        // Fixed inputs; neither rebuild can fail.
        let result = self.literal_length_tree.rebuild(&lens);
        debug_assert!(result.is_ok());
        let result = self.distance_tree.rebuild(&[5u8; DEFLATE_NUM_DIST_SYMS]);
        debug_assert!(result.is_ok());
    }
}
