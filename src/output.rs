use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use noodles::bcf;
use noodles::bgzf;
use noodles::vcf::{
    self as vcf,
    variant::{RecordBuf, io::Write as VariantRecordWrite},
};

use crate::smart_reader::is_stdio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Uncompressed VCF
    #[value(name = "vcf")]
    Vcf,
    /// BGZF-compressed VCF
    #[value(name = "vcf.gz")]
    VcfGz,
    /// BGZF-compressed BCF
    #[value(name = "bcf")]
    Bcf,
    /// Uncompressed BCF
    #[value(name = "ubcf")]
    Ubcf,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Vcf => "vcf",
            Self::VcfGz => "vcf.gz",
            Self::Bcf => "bcf",
            Self::Ubcf => "ubcf",
        }
    }
}

/// Sink for rewritten records, written in input order.
pub trait VariantWriter {
    fn write_header(&mut self, header: &vcf::Header) -> io::Result<()>;

    fn write_variant(&mut self, header: &vcf::Header, record: &RecordBuf) -> io::Result<()>;

    /// Flush everything buffered so far; an error here fails the run.
    fn finish(&mut self) -> io::Result<()>;
}

impl<W> VariantWriter for vcf::io::Writer<W>
where
    W: io::Write,
{
    fn write_header(&mut self, header: &vcf::Header) -> io::Result<()> {
        VariantRecordWrite::write_variant_header(self, header)
    }

    fn write_variant(&mut self, header: &vcf::Header, record: &RecordBuf) -> io::Result<()> {
        VariantRecordWrite::write_variant_record(self, header, record)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.get_mut().flush()
    }
}

impl<W> VariantWriter for bcf::io::Writer<W>
where
    W: io::Write,
{
    fn write_header(&mut self, header: &vcf::Header) -> io::Result<()> {
        VariantRecordWrite::write_variant_header(self, header)
    }

    fn write_variant(&mut self, header: &vcf::Header, record: &RecordBuf) -> io::Result<()> {
        VariantRecordWrite::write_variant_record(self, header, record)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.get_mut().flush()
    }
}

/// Sink over a BGZF stream. `finish` writes the EOF block and flushes the
/// destination; the wrapped writer is consumed there, so nothing is left for
/// `Drop` to write.
pub struct BgzfSink<T> {
    writer: Option<T>,
}

impl<T> BgzfSink<T> {
    pub fn new(writer: T) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    fn writer(&mut self) -> io::Result<&mut T> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("write after output was finished"))
    }
}

impl<W: Write> VariantWriter for BgzfSink<vcf::io::Writer<bgzf::io::Writer<W>>> {
    fn write_header(&mut self, header: &vcf::Header) -> io::Result<()> {
        VariantWriter::write_header(self.writer()?, header)
    }

    fn write_variant(&mut self, header: &vcf::Header, record: &RecordBuf) -> io::Result<()> {
        VariantWriter::write_variant(self.writer()?, header, record)
    }

    fn finish(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(writer) => writer.into_inner().finish()?.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> VariantWriter for BgzfSink<bcf::io::Writer<bgzf::io::Writer<W>>> {
    fn write_header(&mut self, header: &vcf::Header) -> io::Result<()> {
        VariantWriter::write_header(self.writer()?, header)
    }

    fn write_variant(&mut self, header: &vcf::Header, record: &RecordBuf) -> io::Result<()> {
        VariantWriter::write_variant(self.writer()?, header, record)
    }

    fn finish(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(writer) => writer.into_inner().finish()?.flush(),
            None => Ok(()),
        }
    }
}

fn open_destination(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) if !is_stdio(Some(path)) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Create a writer for `format` at `path` (or stdout for `None`/`-`).
pub fn open_sink(path: Option<&Path>, format: OutputFormat) -> io::Result<Box<dyn VariantWriter>> {
    let destination = open_destination(path)?;

    let writer: Box<dyn VariantWriter> = match format {
        OutputFormat::Vcf => Box::new(vcf::io::Writer::new(destination)),
        OutputFormat::VcfGz => Box::new(BgzfSink::new(vcf::io::Writer::new(
            bgzf::io::Writer::new(destination),
        ))),
        OutputFormat::Bcf => Box::new(BgzfSink::new(bcf::io::Writer::new(destination))),
        OutputFormat::Ubcf => Box::new(bcf::io::Writer::from(destination)),
    };

    Ok(writer)
}
