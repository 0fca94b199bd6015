use std::io::{self, BufRead, Read};
use std::path::Path;

use clap::ValueEnum;
use noodles::bcf;
use noodles::vcf::{self, variant::RecordBuf};

use crate::smart_reader;

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum InputFormat {
    /// Variant Call Format, optionally gzip/BGZF compressed
    Vcf,
    /// Binary Call Format, compressed or not
    Bcf,
    /// Detect format from the decompressed stream
    Auto,
}

impl InputFormat {
    /// Inspect the start of a decompressed stream. BCF begins with the
    /// bytes `BCF`; anything else is read as VCF text.
    pub fn detect<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let buf = reader.fill_buf()?;
        if buf.starts_with(b"BCF") {
            Ok(Self::Bcf)
        } else {
            Ok(Self::Vcf)
        }
    }
}

/// Trait for a source of genomic variants, read one record at a time into a
/// caller-owned buffer.
pub trait VariantSource {
    fn header(&self) -> &vcf::Header;

    /// Read the next record into `record`. Returns `false` at end of stream.
    fn next_variant(&mut self, record: &mut RecordBuf) -> io::Result<bool>;
}

impl<T: VariantSource + ?Sized> VariantSource for Box<T> {
    fn header(&self) -> &vcf::Header {
        (**self).header()
    }

    fn next_variant(&mut self, record: &mut RecordBuf) -> io::Result<bool> {
        (**self).next_variant(record)
    }
}

/// Adapter for reading VCF text.
pub struct VcfSource<R> {
    reader: vcf::io::Reader<R>,
    header: vcf::Header,
}

impl<R: BufRead> VcfSource<R> {
    pub fn new(inner: R) -> io::Result<Self> {
        let mut reader = vcf::io::Reader::new(inner);
        let header = reader.read_header()?;
        Ok(Self { reader, header })
    }
}

impl<R: BufRead> VariantSource for VcfSource<R> {
    fn header(&self) -> &vcf::Header {
        &self.header
    }

    fn next_variant(&mut self, record: &mut RecordBuf) -> io::Result<bool> {
        Ok(self.reader.read_record_buf(&self.header, record)? != 0)
    }
}

/// Adapter for reading a decompressed BCF stream.
pub struct BcfSource<R> {
    reader: bcf::io::Reader<R>,
    header: vcf::Header,
}

impl<R: Read> BcfSource<R> {
    pub fn new(inner: R) -> io::Result<Self> {
        let mut reader = bcf::io::Reader::from(inner);
        let header = reader.read_header()?;
        Ok(Self { reader, header })
    }
}

impl<R: Read> VariantSource for BcfSource<R> {
    fn header(&self) -> &vcf::Header {
        &self.header
    }

    fn next_variant(&mut self, record: &mut RecordBuf) -> io::Result<bool> {
        Ok(self.reader.read_record_buf(&self.header, record)? != 0)
    }
}

/// Open a path (or stdin for `None`/`-`) and read its header.
pub fn open_source(
    path: Option<&Path>,
    format: InputFormat,
) -> io::Result<Box<dyn VariantSource>> {
    let mut reader = smart_reader::open_input(path)?;

    let format = match format {
        InputFormat::Auto => InputFormat::detect(&mut reader)?,
        explicit => explicit,
    };
    tracing::debug!(?format, "opening variant source");

    match format {
        InputFormat::Bcf => Ok(Box::new(BcfSource::new(reader)?)),
        _ => Ok(Box::new(VcfSource::new(reader)?)),
    }
}
