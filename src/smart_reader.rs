use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

const MAX_DEPTH: usize = 4;

/// `None` and `-` both mean standard input.
pub fn is_stdio(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

/// Opens a path (or stdin) and transparently peels off GZIP/BGZF layers to
/// expose the underlying raw data stream.
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = match path {
        Some(path) if !is_stdio(Some(path)) => Box::new(BufReader::new(File::open(path)?)),
        _ => Box::new(BufReader::new(io::stdin())),
    };
    decompress(reader)
}

/// Unwrap gzip members until the stream no longer starts with the gzip magic.
pub fn decompress(mut reader: Box<dyn BufRead>) -> io::Result<Box<dyn BufRead>> {
    for _ in 0..MAX_DEPTH {
        let is_gzip = {
            let buf = reader.fill_buf()?;
            // GZIP magic: 1f 8b
            buf.len() >= 2 && buf[0] == 0x1f && buf[1] == 0x8b
        };

        if !is_gzip {
            break;
        }

        tracing::debug!("detected GZIP/BGZF layer");
        // MultiGzDecoder reads every BGZF block, not only the first member
        reader = Box::new(BufReader::new(MultiGzDecoder::new(reader)));
    }
    Ok(reader)
}
