use filebuffer::FileBuffer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;
use streaming_inflate64_rs::{InflateResult, InflateStream};
use structopt::StructOpt;

#[derive(StructOpt)]
struct InflateParams {
    /// Raw .deflate / .deflate64 input file (no container framing)
    input: PathBuf,
    /// Output file; defaults to the input path without its extension
    output: Option<PathBuf>,
    /// Decode without writing the output anywhere
    #[structopt(short)]
    simulate: bool,
    /// Treat the input as Deflate64 instead of Deflate
    #[structopt(long)]
    deflate64: bool,
    /// Input chunk size used to feed the stream
    #[structopt(long, default_value = "524288")]
    chunk_size: usize,
}

fn inflate_file(
    params: &InflateParams,
    mut sink: impl FnMut(&[u8]) -> std::io::Result<()>,
) -> Result<(u64, u64), String> {
    let data = FileBuffer::open(&params.input)
        .map_err(|err| format!("cannot open {}: {err}", params.input.display()))?;

    let mut stream = InflateStream::new();
    let mut out_buf = vec![0u8; params.chunk_size.max(1)];
    let mut pos = 0usize;

    loop {
        let end = (pos + params.chunk_size.max(1)).min(data.len());
        let step = match params.deflate64 {
            true => stream.inflate64(&data[pos..end], &mut out_buf),
            false => stream.inflate(&data[pos..end], &mut out_buf),
        };
        let InflateResult {
            consumed,
            written,
            eof,
        } = step.map_err(|err| err.to_string())?;

        pos += consumed;
        sink(&out_buf[..written]).map_err(|err| format!("write failed: {err}"))?;

        if eof {
            return Ok((stream.total_in(), stream.total_out()));
        }
        if consumed == 0 && written == 0 && end == data.len() {
            return Err("input ended in the middle of the stream".to_string());
        }
    }
}

fn main() {
    let params: InflateParams = InflateParams::from_args();

    let result = if params.simulate {
        inflate_file(&params, |_| Ok(()))
    } else {
        let path = params
            .output
            .clone()
            .unwrap_or_else(|| params.input.with_extension(""));
        let mut write_file = BufWriter::new(File::create(path).unwrap());
        let result = inflate_file(&params, |data| write_file.write_all(data));
        if result.is_ok() {
            write_file.flush().unwrap();
        }
        result
    };

    match result {
        Ok((total_in, total_out)) => {
            eprintln!("{total_in} bytes in, {total_out} bytes out");
        }
        Err(message) => {
            eprintln!("error: {message}");
            exit(1);
        }
    }
}
