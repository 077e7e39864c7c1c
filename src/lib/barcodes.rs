//! Assignment of numeric identifiers to sample barcode sequences.
#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use crate::sample_metadata::SampleSheetRecord;

/// The barcode type reported for every barcode read from a sample sheet.
pub const SAMPLE_SHEET_BARCODE_TYPE: &str = "SampleSheet";

/// The type and numeric identifier assigned to a barcode sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeId {
    pub barcode_type: &'static str,
    pub index: usize,
}

/// A mapping from barcode sequence to [`BarcodeId`].
///
/// Identifiers are assigned starting at 1 in lexicographic order of the distinct barcode
/// sequences, so the assignment depends only on the set of sequences and not on the order or
/// number of times they occur.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarcodeAssignment {
    ids: BTreeMap<String, BarcodeId>,
}

impl BarcodeAssignment {
    /// Builds the assignment from the barcodes of the given records.
    ///
    /// The empty barcode (from samples that are not multiplexed) is treated like any other
    /// sequence, so when present it sorts first and receives identifier 1.  Set `skip_empty` to
    /// leave it unassigned instead.
    pub fn from_records<I, S>(records: I, skip_empty: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<SampleSheetRecord>,
    {
        let mut barcodes = BTreeSet::new();
        for record in records {
            let record = record.as_ref();
            if !(skip_empty && record.is_unbarcoded()) && !barcodes.contains(&record.barcode) {
                barcodes.insert(record.barcode.clone());
            }
        }
        Self::from_barcodes(barcodes)
    }

    /// Builds the assignment from a set of distinct barcode sequences.
    pub fn from_barcodes(barcodes: BTreeSet<String>) -> Self {
        let ids = barcodes
            .into_iter()
            .enumerate()
            .map(|(i, barcode)| {
                (barcode, BarcodeId { barcode_type: SAMPLE_SHEET_BARCODE_TYPE, index: i + 1 })
            })
            .collect();
        Self { ids }
    }

    /// The identifier for the given barcode sequence, if one was assigned.
    pub fn get(&self, barcode: &str) -> Option<&BarcodeId> {
        self.ids.get(barcode)
    }

    /// The number of distinct barcodes with an assigned identifier.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over the barcodes and their identifiers in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BarcodeId)> {
        self.ids.iter().map(|(barcode, id)| (barcode.as_str(), id))
    }
}
