/*
 * Constants shared by the block decoder and the Huffman table builder. The
 * numbers come straight from RFC 1951 sections 3.2.5 - 3.2.7, plus the two
 * Deflate64 extensions (the alternate entry for length symbol 285 and the
 * two extra distance symbols).
 */

/* Block types, as they appear on the wire (BTYPE). */
pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u16 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC_HUFFMAN: u16 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u16 = 2;

/* Alphabet sizes.
 *
 * RFC 1951 defines a maximum literal/length symbol of 285, however HLIT is
 * represented using 5 bits, so 257 + 31 = 288 code lengths are representable
 * in a dynamic header. We size for that representable maximum and instead
 * validate each decoded symbol, which avoids rejecting streams that merely
 * assign (unused) codes to symbols 286/287. */
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_DIST_SYMS: usize = 32;
pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;

/* Codeword length limits: lengths read through the code-length alphabet are
 * at most 15 bits, the code-length codes themselves at most 7 (3-bit
 * fields). */
pub const DEFLATE_MAX_CODEWORD_LEN: usize = 15;
pub const DEFLATE_MAX_PRE_CODEWORD_LEN: usize = 7;

/* Deflate64 allows distances and lengths up to a full 64k, so the history
 * window is 65536 bytes for both modes. Cursors are u16 values that wrap on
 * overflow. */
pub const DEFLATE64_WINDOW_SIZE: usize = 1 << 16;

const_assert!(DEFLATE64_WINDOW_SIZE == u16::MAX as usize + 1);

/* The order in which the code-length code lengths are stored in a dynamic
 * block header (RFC 1951, section 3.2.7). */
pub const PRECODE_LENS_PERMUTATION: [u8; DEFLATE_NUM_PRECODE_SYMS] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/* Length data for symbols 257..285: the match length is
 * LENGTH_BASE[sym - 257] + read_bits(LENGTH_EXTRA_BITS[sym - 257]).
 *
 * Deflate and Deflate64 differ only in the final entry: symbol 285 decodes
 * to a fixed 258 in Deflate, but to base 3 with 16 extra bits in Deflate64
 * (maximum length 3 + 65535 = 65538). */
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

pub const LENGTH_BASE64: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 3,
];
pub const LENGTH_EXTRA_BITS64: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 16,
];

/* Distance data for symbols 0..31: the distance is
 * DISTANCE_BASE[sym] + read_bits(DISTANCE_EXTRA_BITS[sym]).
 *
 * Symbols 30 and 31 exist only in Deflate64; decoding one of them from a
 * Deflate stream is a data error. */
pub const DISTANCE_BASE: [u16; DEFLATE_NUM_DIST_SYMS] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577, 32769, 49153,
];
pub const DISTANCE_EXTRA_BITS: [u8; DEFLATE_NUM_DIST_SYMS] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13, 14, 14,
];

/* Highest valid distance symbol per mode. */
pub const DEFLATE_MAX_DIST_SYM: u16 = 29;
pub const DEFLATE64_MAX_DIST_SYM: u16 = 31;

/* Input margins for the unchecked decode path: with at least this many
 * whole bytes remaining, one literal/length codeword, its extra bits, one
 * distance codeword and its extra bits can all be read without
 * insufficiency checks. */
pub const FAST_PATH_MIN_INPUT: usize = 6;
pub const FAST_PATH_MIN_INPUT64: usize = 8;

const_assert!(FAST_PATH_MIN_INPUT * 8 >= 15 + 5 + 15 + 13);
const_assert!(FAST_PATH_MIN_INPUT64 * 8 >= 15 + 16 + 15 + 14);
