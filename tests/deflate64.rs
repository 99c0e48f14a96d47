/*
 * Deflate64-specific coverage. The reference encoder cannot author streams
 * that use distance symbols 30/31 or the 16-extra-bit length symbol, so
 * these tests build their blocks with a small bit writer instead.
 */

use streaming_inflate64_rs::{DataErrorKind, InflateError, InflateMode, InflateStream};

struct BitWriter {
    bytes: Vec<u8>,
    used_bits: usize,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            used_bits: 0,
        }
    }

    fn push_bit(&mut self, bit: u8) {
        if self.used_bits % 8 == 0 {
            self.bytes.push(0);
        }
        let last = self.bytes.len() - 1;
        self.bytes[last] |= bit << (self.used_bits % 8);
        self.used_bits += 1;
    }

    /* Header-style field: LSB first. */
    fn write_bits(&mut self, value: u16, count: u32) {
        for i in 0..count {
            self.push_bit(((value >> i) & 1) as u8);
        }
    }

    /* Huffman codeword: MSB first. */
    fn write_code(&mut self, code: u16, count: u32) {
        for i in (0..count).rev() {
            self.push_bit(((code >> i) & 1) as u8);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/* RFC 1951, section 3.2.6 fixed literal/length codes. */
fn fixed_literal(writer: &mut BitWriter, symbol: u16) {
    match symbol {
        0..=143 => writer.write_code(0x30 + symbol, 8),
        144..=255 => writer.write_code(0x190 + symbol - 144, 9),
        256..=279 => writer.write_code(symbol - 256, 7),
        _ => writer.write_code(0xC0 + symbol - 280, 8),
    }
}

fn decode(
    mode: InflateMode,
    input: &[u8],
    write_stride: usize,
) -> Result<Vec<u8>, InflateError> {
    let mut stream = InflateStream::new();
    let mut decoded = Vec::new();
    let mut buf = vec![0u8; write_stride];
    let mut pos = 0usize;

    loop {
        let result = match mode {
            InflateMode::Deflate => stream.inflate(&input[pos..], &mut buf),
            InflateMode::Deflate64 => stream.inflate64(&input[pos..], &mut buf),
        }?;
        pos += result.consumed;
        decoded.extend_from_slice(&buf[..result.written]);
        if result.eof {
            return Ok(decoded);
        }
        assert!(
            result.consumed > 0 || result.written > 0,
            "decoder stalled at {pos}"
        );
    }
}

#[test]
fn hand_built_dynamic_block() {
    /* A dynamic block whose literal/length code has exactly two 1-bit
     * codewords ('A' and end-of-block) and an empty distance code. */
    const PERMUTATION: [usize; 19] = [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

    let mut writer = BitWriter::new();
    writer.write_bits(1, 1); // BFINAL
    writer.write_bits(2, 2); // dynamic
    writer.write_bits(0, 5); // HLIT -> 257
    writer.write_bits(0, 5); // HDIST -> 1
    writer.write_bits(15, 4); // HCLEN -> 19

    /* Code-length code: symbols 0, 1, 17, 18 all 2 bits long, giving the
     * canonical codes 00, 01, 10 and 11 in that order. */
    for symbol in PERMUTATION {
        let len = match symbol {
            0 | 1 | 17 | 18 => 2,
            _ => 0,
        };
        writer.write_bits(len, 3);
    }

    let emit_len_one = |w: &mut BitWriter| w.write_code(0b01, 2);
    let emit_zero_run = |w: &mut BitWriter, run: u16| {
        w.write_code(0b11, 2);
        w.write_bits(run - 11, 7);
    };

    emit_zero_run(&mut writer, 65); // symbols 0..=64 unused
    emit_len_one(&mut writer); // 'A'
    emit_zero_run(&mut writer, 138);
    emit_zero_run(&mut writer, 52); // symbols 66..=255 unused
    emit_len_one(&mut writer); // end of block
    writer.write_code(0b00, 2); // the single (unused) distance length

    for _ in 0..5 {
        writer.write_code(0, 1); // 'A'
    }
    writer.write_code(1, 1); // end of block
    let stream_bytes = writer.finish();

    /* The construction above stays inside the common subset, so both
     * flavors must decode it identically. */
    assert_eq!(decode(InflateMode::Deflate, &stream_bytes, 512).unwrap(), b"AAAAA");
    assert_eq!(decode(InflateMode::Deflate64, &stream_bytes, 512).unwrap(), b"AAAAA");
}

#[test]
fn distance_symbol_30_reaches_past_32k() {
    const LITERALS: usize = 33_000;

    let mut writer = BitWriter::new();
    writer.write_bits(1, 1);
    writer.write_bits(1, 2); // static
    for i in 0..LITERALS {
        fixed_literal(&mut writer, (i % 144) as u16);
    }
    fixed_literal(&mut writer, 264); // length 10, no extra bits
    writer.write_code(30, 5); // distance base 32769
    writer.write_bits(0, 14);
    fixed_literal(&mut writer, 256);
    let stream_bytes = writer.finish();

    let decoded = decode(InflateMode::Deflate64, &stream_bytes, 4096).unwrap();
    assert_eq!(decoded.len(), LITERALS + 10);

    let source = LITERALS - 32769;
    assert_eq!(decoded[LITERALS..], decoded[source..source + 10]);

    /* Plain Deflate stops at the very same symbol. */
    assert_eq!(
        decode(InflateMode::Deflate, &stream_bytes, 4096),
        Err(InflateError::Data(DataErrorKind::BadDistanceSymbol(30)))
    );
}

#[test]
fn distance_symbol_31_spans_the_whole_window() {
    const LITERALS: usize = 65_600;

    let mut writer = BitWriter::new();
    writer.write_bits(1, 1);
    writer.write_bits(1, 2);
    for i in 0..LITERALS {
        fixed_literal(&mut writer, (i % 251) as u16);
    }
    fixed_literal(&mut writer, 257); // length 3
    writer.write_code(31, 5); // distance base 49153
    writer.write_bits(16383, 14); // + 16383 = 65536, the full window
    fixed_literal(&mut writer, 256);
    let stream_bytes = writer.finish();

    let decoded = decode(InflateMode::Deflate64, &stream_bytes, 8192).unwrap();
    assert_eq!(decoded.len(), LITERALS + 3);

    let source = LITERALS - 65536;
    assert_eq!(decoded[LITERALS..], decoded[source..source + 3]);

    assert_eq!(
        decode(InflateMode::Deflate, &stream_bytes, 8192),
        Err(InflateError::Data(DataErrorKind::BadDistanceSymbol(31)))
    );
}

#[test]
fn length_symbol_285_extra_bits_values() {
    /* Symbol 285 takes 16 extra bits in Deflate64; spot-check a few runs
     * between the minimum and the 65538 maximum. */
    for (extra, run) in [(0u16, 3usize), (97, 100), (65535, 65538)] {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1);
        writer.write_bits(1, 2);
        fixed_literal(&mut writer, b'q' as u16);
        fixed_literal(&mut writer, 285);
        writer.write_bits(extra, 16);
        writer.write_code(0, 5); // distance 1
        fixed_literal(&mut writer, 256);
        let stream_bytes = writer.finish();

        let decoded = decode(InflateMode::Deflate64, &stream_bytes, 4096).unwrap();
        assert_eq!(decoded.len(), 1 + run, "extra value {extra}");
        assert!(decoded.iter().all(|&byte| byte == b'q'));
    }
}
