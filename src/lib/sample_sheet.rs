use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use fgoxide::io::Io;
use itertools::Itertools;
use thiserror::Error;

use crate::sample_metadata::SampleSheetRecord;

/// The optional line number from the sample sheet where an error ocurred.
#[derive(Debug)]
pub struct ErrorLine(pub Option<usize>);

impl Display for ErrorLine {
    /// Writes the line number if present, nothing if it is not None.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(number) => write!(f, "Line {}", number),
            None => Ok(()),
        }
    }
}

/// The error that may occur when reading or converting a sample sheet.
#[derive(Error, Debug)]
pub enum SampleSheetError {
    #[error("Io error occurred")]
    Io(#[from] std::io::Error),

    #[error("Io error occurred")]
    FgError(#[from] fgoxide::FgError),

    #[error("The sample on line {line_number} had {actual} fields, expected at least {expected} fields, for line: {line}")]
    SampleInvalidNumberOfColumns {
        actual: usize,
        expected: usize,
        line_number: usize,
        line: String,
    },

    #[error(transparent)]
    Deserialize(#[from] csv::Error),

    #[error("There is more than one FCID in the sample sheet {path}: {ids}")]
    MultipleFlowcellIds { path: String, ids: String },

    #[error(
        "No barcode id was assigned to `{barcode}` for sample {sample_id} in lane {lane}. {line}"
    )]
    UnassignedBarcode { barcode: String, sample_id: String, lane: String, line: ErrorLine },

    #[error("Unable to write the run info")]
    Yaml(#[from] serde_yaml::Error),
}

/// Reads [`SampleSheetRecord`]s one at a time from a comma-separated sample sheet.
///
/// The first line is a header and is skipped without inspection, even when it is blank.  Empty
/// rows after the header are skipped.  Every other row must have at least five fields.  The
/// underlying file is closed when the reader is dropped.
pub struct SampleSheetReader<R: BufRead> {
    reader: csv::Reader<R>,
    record: StringRecord,
    header_skipped: bool,
    finished: bool,
}

impl SampleSheetReader<BufReader<Box<dyn Read>>> {
    /// Opens the sample sheet at the given path.  Gzip compressed files are decompressed
    /// transparently.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SampleSheetError> {
        let io = Io::default();
        Ok(Self::new(io.new_reader(&path)?))
    }
}

impl<R: BufRead> SampleSheetReader<R> {
    /// Builds a new reader over the given CSV data.
    pub fn new(reader: R) -> Self {
        // the csv reader skips blank lines before choosing a header, so the header line is
        // consumed directly from the input instead
        let reader = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(false)
            .quoting(true)
            .flexible(true)
            .from_reader(reader);
        Self { reader, record: StringRecord::new(), header_skipped: false, finished: false }
    }

    /// Discards the first physical line of the input.
    fn skip_header(&mut self) -> Result<(), SampleSheetError> {
        let mut header = Vec::new();
        self.reader.get_mut().read_until(b'\n', &mut header)?;
        Ok(())
    }
}

impl<R: BufRead> Iterator for SampleSheetReader<R> {
    type Item = Result<SampleSheetRecord, SampleSheetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header_skipped {
            self.header_skipped = true;
            if let Err(err) = self.skip_header() {
                self.finished = true;
                return Some(Err(err));
            }
        }
        if self.finished {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(false) => {
                self.finished = true;
                None
            }
            Ok(true) => {
                // line numbers count the header line
                let line_number = self.record.position().map_or(0, |p| p.line() as usize + 1);
                let result = SampleSheetRecord::from_string_record(&self.record, line_number);
                self.finished = result.is_err();
                Some(result)
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err.into()))
            }
        }
    }
}

/// Returns the distinct flowcell identifiers found in the sample sheet at the given path.
pub fn flowcell_ids<P: AsRef<Path>>(path: P) -> Result<BTreeSet<String>, SampleSheetError> {
    SampleSheetReader::from_path(path)?.map_ok(|record| record.flowcell_id).collect()
}

/// Returns the unique flowcell identifier of the sample sheet at the given path, or `None` if
/// the sheet has no samples.
///
/// # Errors
///
/// - [`SampleSheetError::MultipleFlowcellIds`] if more than one flowcell identifier is present
pub fn flowcell_id<P: AsRef<Path>>(path: P) -> Result<Option<String>, SampleSheetError> {
    let ids = flowcell_ids(&path)?;
    ensure_single_flowcell(ids, path.as_ref())
}

/// Checks that at most one flowcell identifier was seen in the sample sheet at `path`.
pub(crate) fn ensure_single_flowcell(
    ids: BTreeSet<String>,
    path: &Path,
) -> Result<Option<String>, SampleSheetError> {
    if ids.len() > 1 {
        return Err(SampleSheetError::MultipleFlowcellIds {
            path: path.to_string_lossy().to_string(),
            ids: ids.iter().join(", "),
        });
    }
    Ok(ids.into_iter().next())
}
