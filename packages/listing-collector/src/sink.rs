//! CSV output for scraped listings, and reading it back.
//!
//! The sink writes the header as soon as it is opened and then one record
//! per listing as cards are extracted, so a crawl stopped half way still
//! leaves a well-formed file behind.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{CollectError, CollectResult};
use crate::types::{RawListing, CSV_HEADER};

/// Streaming CSV writer for [`RawListing`] rows.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

impl CsvSink<File> {
    /// Create (or truncate) a CSV file at `path`.
    pub fn create(path: impl AsRef<Path>) -> CollectResult<Self> {
        let file = File::create(path.as_ref())?;
        Self::new(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(inner: W) -> CollectResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Append one listing.
    pub fn write(&mut self, listing: &RawListing) -> CollectResult<()> {
        self.writer.write_record(listing.as_record())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Push buffered rows to the underlying writer.
    pub fn flush(&mut self) -> CollectResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Rows written so far (header excluded).
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> CollectResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| CollectError::Io(e.into_error()))
    }
}

/// Listings read back from a raw CSV, plus the records that could not be.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    pub listings: Vec<RawListing>,
    /// Records skipped for a wrong field count or undecodable text.
    pub malformed_records: usize,
}

/// Read a raw dataset file.
pub fn read_listings(path: impl AsRef<Path>) -> CollectResult<RawDataset> {
    let file = File::open(path.as_ref())?;
    read_listings_from(file)
}

/// Read raw listings from any reader.
///
/// Header names and values are trimmed, so files written with a spaced
/// header (`Car Name, Transmission, ...`) load the same way. A record that
/// does not decode into a listing is skipped and counted; only I/O errors
/// abort the read.
pub fn read_listings_from<R: Read>(reader: R) -> CollectResult<RawDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut dataset = RawDataset::default();
    for record in rdr.records() {
        match record.and_then(|r| r.deserialize::<RawListing>(Some(&headers))) {
            Ok(listing) => dataset.listings.push(listing),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                warn!(
                    line = e.position().map(|p| p.line()),
                    error = %e,
                    "Skipping malformed record"
                );
                dataset.malformed_records += 1;
            }
        }
    }
    Ok(dataset)
}
