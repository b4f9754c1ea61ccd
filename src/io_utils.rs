//! CSV plumbing shared by the tabular provider and the commands.
//!
//! - `-` routes through stdin/stdout.
//! - Delimiters default from the extension (`.tsv` → tab, otherwise comma).
//! - Input is decoded and output transcoded with `encoding_rs`, defaulting to
//!   UTF-8.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

fn delimiter_for_extension(path: &Path) -> Option<u8> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Some(DEFAULT_TSV_DELIMITER),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(DEFAULT_CSV_DELIMITER),
        _ => None,
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided
        .or_else(|| delimiter_for_extension(path))
        .unwrap_or(DEFAULT_CSV_DELIMITER)
}

pub fn resolve_output_delimiter(path: &Path, provided: Option<u8>, fallback: u8) -> u8 {
    provided
        .or_else(|| delimiter_for_extension(path))
        .unwrap_or(fallback)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
    has_headers: bool,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(delimiter)
        .flexible(false)
        .from_reader(reader))
}

pub fn open_csv_writer(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = if is_dash(path) {
        Box::new(io::stdout())
    } else {
        Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ))
    };
    let writer: Box<dyn Write> = if encoding == UTF_8 {
        base
    } else {
        Box::new(TranscodingWriter::new(base, encoding))
    };
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer))
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            if had_errors {
                Err(anyhow!("Failed to decode text with encoding {}", encoding.name()))
            } else {
                Ok(text.into_owned())
            }
        })
        .collect()
}

/// Buffers UTF-8 output and re-encodes complete characters on the way out.
struct TranscodingWriter<W: Write> {
    inner: W,
    encoding: &'static Encoding,
    pending: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::new(),
        }
    }

    fn drain_complete(&mut self, at_end: bool) -> io::Result<()> {
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_some() => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Invalid UTF-8 sequence in output stream",
                ));
            }
            Err(err) => err.valid_up_to(),
        };
        if at_end && valid_up_to < self.pending.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Incomplete UTF-8 sequence at end of output stream",
            ));
        }
        if valid_up_to == 0 {
            return Ok(());
        }
        let chunk: Vec<u8> = self.pending.drain(..valid_up_to).collect();
        let text = std::str::from_utf8(&chunk)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let (encoded, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to encode text using {}", self.encoding.name()),
            ));
        }
        self.inner.write_all(&encoded)
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_complete(false)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_complete(true)?;
        self.inner.flush()
    }
}
