#![forbid(unsafe_code)]
#![allow(clippy::must_use_candidate)]

use csv::StringRecord;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::sample_sheet::SampleSheetError;

/// The number of leading columns read from each sample sheet row.  Any further columns are
/// ignored.
pub const NUM_SAMPLE_SHEET_COLUMNS: usize = 5;

/// A single row from a sample sheet.
///
/// The columns are positional: flowcell id, lane, sample id, genome build, and barcode sequence.
/// The header row is never consulted, so the names in the header are free-form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash, Eq)]
pub struct SampleSheetRecord {
    /// The flowcell identifier (FCID) of the run this sample was sequenced on.
    pub flowcell_id: String,

    /// The lane the sample was loaded on.
    pub lane: String,

    /// The identifier of the sample.
    pub sample_id: String,

    /// The genome build (organism) to analyze the sample against.
    pub genome_build: String,

    /// The sample barcode sequence, empty for samples that are not multiplexed.
    pub barcode: String,

    /// The line number in the input in which this sample was defined
    #[serde(skip)]
    pub line_number: Option<usize>,
}

impl SampleSheetRecord {
    /// Create a new [`SampleSheetRecord`] from its five column values.
    pub fn new(
        flowcell_id: &str,
        lane: &str,
        sample_id: &str,
        genome_build: &str,
        barcode: &str,
    ) -> Self {
        Self {
            flowcell_id: flowcell_id.to_string(),
            lane: lane.to_string(),
            sample_id: sample_id.to_string(),
            genome_build: genome_build.to_string(),
            barcode: barcode.to_string(),
            line_number: None,
        }
    }

    /// Builds a [`SampleSheetRecord`] from the first five fields of a row.
    ///
    /// # Errors
    ///
    /// - [`SampleSheetError::SampleInvalidNumberOfColumns`] if the row has fewer than five fields
    pub fn from_string_record(
        record: &StringRecord,
        line_number: usize,
    ) -> Result<Self, SampleSheetError> {
        if record.len() < NUM_SAMPLE_SHEET_COLUMNS {
            return Err(SampleSheetError::SampleInvalidNumberOfColumns {
                actual: record.len(),
                expected: NUM_SAMPLE_SHEET_COLUMNS,
                line_number,
                line: record.iter().join(","),
            });
        }
        Ok(Self {
            flowcell_id: record[0].to_string(),
            lane: record[1].to_string(),
            sample_id: record[2].to_string(),
            genome_build: record[3].to_string(),
            barcode: record[4].to_string(),
            line_number: Some(line_number),
        })
    }

    /// The key rows are grouped by when organizing lanes.
    pub fn lane_key(&self) -> (&str, &str) {
        (&self.lane, &self.genome_build)
    }

    /// True if this sample has no barcode sequence.
    pub fn is_unbarcoded(&self) -> bool {
        self.barcode.is_empty()
    }
}

/// Implementation of AsRef trait for [`SampleSheetRecord`] to convert `SampleSheetRecord` to
/// `&SampleSheetRecord`.
impl AsRef<SampleSheetRecord> for SampleSheetRecord {
    fn as_ref(&self) -> &SampleSheetRecord {
        self
    }
}
