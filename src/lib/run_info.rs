//! Conversion of a sample sheet into the nested `run_info.yaml` description of a run.
#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use fgoxide::io::Io;
use itertools::{process_results, Itertools};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::barcodes::BarcodeAssignment;
use crate::sample_metadata::SampleSheetRecord;
use crate::sample_sheet::{ensure_single_flowcell, ErrorLine, SampleSheetError, SampleSheetReader};

/// The analysis requested for every lane.
pub const STANDARD_ANALYSIS: &str = "Standard";

/// The extension given to the run info written next to a sample sheet.
pub const RUN_INFO_EXTENSION: &str = "yaml";

/// A barcoded sample within a multiplexed lane.
///
/// Fields are declared in alphabetical order, which is the order they are written in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultiplexEntry {
    pub barcode_id: usize,
    pub barcode_type: String,
    pub name: String,
    pub sequence: String,
}

/// The samples sequenced on a lane against a single genome build.
///
/// `multiplex` is only present when more than one sample shares the lane and genome build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaneEntry {
    pub analysis: String,
    pub description: String,
    pub genome_build: String,
    pub lane: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplex: Option<Vec<MultiplexEntry>>,
}

impl LaneEntry {
    /// Builds the entry for one group of contiguous records sharing a lane and genome build.
    fn from_group(
        lane: String,
        genome_build: String,
        group: Vec<SampleSheetRecord>,
        barcode_ids: &BarcodeAssignment,
    ) -> Result<Self, SampleSheetError> {
        let (description, multiplex) = if group.len() == 1 {
            (group[0].sample_id.clone(), None)
        } else {
            let multiplex = group
                .into_iter()
                .map(|record| {
                    let id = barcode_ids.get(&record.barcode).ok_or_else(|| {
                        SampleSheetError::UnassignedBarcode {
                            barcode: record.barcode.clone(),
                            sample_id: record.sample_id.clone(),
                            lane: record.lane.clone(),
                            line: ErrorLine(record.line_number),
                        }
                    })?;
                    Ok(MultiplexEntry {
                        barcode_id: id.index,
                        barcode_type: id.barcode_type.to_string(),
                        name: record.sample_id,
                        sequence: record.barcode,
                    })
                })
                .collect::<Result<Vec<_>, SampleSheetError>>()?;
            (format!("Barcoded {}", lane), Some(multiplex))
        };
        Ok(Self {
            analysis: STANDARD_ANALYSIS.to_string(),
            description,
            genome_build,
            lane,
            multiplex,
        })
    }
}

/// Organizes flat sample sheet records into one [`LaneEntry`] per lane and genome build.
///
/// Records are grouped as they stream by: a group is a maximal run of consecutive records with
/// the same lane and genome build.  Records for the same lane and genome build that are not
/// adjacent in the input therefore produce separate entries.  Entries are returned in the order
/// their first record was seen.
///
/// # Errors
///
/// - [`SampleSheetError::UnassignedBarcode`] if a record in a multiplexed group has a barcode
///   with no identifier in `barcode_ids`
pub fn organize_lanes<I>(
    records: I,
    barcode_ids: &BarcodeAssignment,
) -> Result<Vec<LaneEntry>, SampleSheetError>
where
    I: IntoIterator<Item = SampleSheetRecord>,
{
    let mut lanes = vec![];
    let groups = records.into_iter().group_by(|r| {
        let (lane, genome_build) = r.lane_key();
        (lane.to_string(), genome_build.to_string())
    });
    for ((lane, genome_build), group) in &groups {
        lanes.push(LaneEntry::from_group(lane, genome_build, group.collect(), barcode_ids)?);
    }
    Ok(lanes)
}

/// Reads the sample sheet at `path` and builds its run description.
///
/// The sheet is read twice: once to assign barcode identifiers and check that the sheet
/// describes a single flowcell, and once to organize the lanes.
///
/// # Errors
///
/// - [`SampleSheetError::MultipleFlowcellIds`] if the sheet has more than one flowcell id
/// - any error reading or parsing the sheet
pub fn read_run_info<P: AsRef<Path>>(
    path: P,
    skip_empty_barcodes: bool,
) -> Result<Vec<LaneEntry>, SampleSheetError> {
    let path = path.as_ref();

    let mut flowcell_ids = BTreeSet::new();
    let barcode_ids = process_results(SampleSheetReader::from_path(path)?, |records| {
        let records = records.inspect(|record| {
            if !flowcell_ids.contains(&record.flowcell_id) {
                flowcell_ids.insert(record.flowcell_id.clone());
            }
        });
        BarcodeAssignment::from_records(records, skip_empty_barcodes)
    })?;
    let flowcell_id = ensure_single_flowcell(flowcell_ids, path)?;
    debug!(
        "Assigned ids to {} distinct barcodes for flowcell {}",
        barcode_ids.len(),
        flowcell_id.unwrap_or_default()
    );

    process_results(SampleSheetReader::from_path(path)?, |records| {
        organize_lanes(records, &barcode_ids)
    })?
}

/// Writes the run description to `path` as block-style YAML.
pub fn write_run_info<P: AsRef<Path>>(
    path: P,
    lanes: &[LaneEntry],
) -> Result<(), SampleSheetError> {
    let io = Io::default();
    let mut writer = io.new_writer(&path)?;
    serde_yaml::to_writer(&mut writer, lanes)?;
    writer.flush()?;
    Ok(())
}

/// The path the run info is written to when no output path is given: the sample sheet path with
/// its extension replaced.
pub fn default_output_path<P: AsRef<Path>>(sample_sheet: P) -> PathBuf {
    sample_sheet.as_ref().with_extension(RUN_INFO_EXTENSION)
}

/// Converts the sample sheet at `sample_sheet` into a `run_info.yaml` style document.
///
/// Nothing is written if the sample sheet cannot be converted.  Returns the path written to.
pub fn sample_sheet_to_run_info<P: AsRef<Path>>(
    sample_sheet: P,
    output: Option<PathBuf>,
    skip_empty_barcodes: bool,
) -> Result<PathBuf, SampleSheetError> {
    let output = output.unwrap_or_else(|| default_output_path(&sample_sheet));
    let lanes = read_run_info(&sample_sheet, skip_empty_barcodes)?;
    write_run_info(&output, &lanes)?;
    info!(
        "Wrote {} lane(s) from {} to {}",
        lanes.len(),
        sample_sheet.as_ref().to_string_lossy(),
        output.to_string_lossy()
    );
    Ok(output)
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use matches::assert_matches;

    use crate::barcodes::BarcodeAssignment;
    use crate::run_info::{
        default_output_path, organize_lanes, read_run_info, sample_sheet_to_run_info, LaneEntry,
        MultiplexEntry,
    };
    use crate::sample_metadata::SampleSheetRecord;
    use crate::sample_sheet::SampleSheetError;

    const HEADER: &str = "FCID,Lane,SampleID,SampleRef,Index,Description,Control,Recipe,Operator";

    fn write_sheet(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("SampleSheet.csv");
        let mut lines = vec![HEADER];
        lines.extend_from_slice(rows);
        std::fs::write(&path, lines.join("\n")).expect("Failed to write sample sheet to file.");
        path
    }

    fn multiplex_entry(barcode_id: usize, sequence: &str, name: &str) -> MultiplexEntry {
        MultiplexEntry {
            barcode_id,
            barcode_type: String::from("SampleSheet"),
            name: name.to_string(),
            sequence: sequence.to_string(),
        }
    }

    #[test]
    fn test_single_record_lane_has_no_multiplex() {
        let records = vec![SampleSheetRecord::new("FC1", "1", "S1", "hg19", "")];
        let assignment = BarcodeAssignment::from_records(&records, false);
        let lanes = organize_lanes(records, &assignment).unwrap();
        assert_eq!(
            lanes,
            vec![LaneEntry {
                analysis: String::from("Standard"),
                description: String::from("S1"),
                genome_build: String::from("hg19"),
                lane: String::from("1"),
                multiplex: None,
            }]
        );
    }

    #[test]
    fn test_groups_keep_input_order() {
        let records = vec![
            SampleSheetRecord::new("FC1", "2", "S1", "hg19", "TTTT"),
            SampleSheetRecord::new("FC1", "2", "S2", "hg19", "AAAA"),
            SampleSheetRecord::new("FC1", "2", "S3", "mm9", ""),
            SampleSheetRecord::new("FC1", "1", "S4", "hg19", "CCCC"),
            SampleSheetRecord::new("FC1", "1", "S5", "hg19", "GGGG"),
            SampleSheetRecord::new("FC1", "1", "S6", "hg19", "AAAA"),
        ];
        let assignment = BarcodeAssignment::from_records(&records, false);
        let lanes = organize_lanes(records, &assignment).unwrap();

        assert_eq!(lanes.len(), 3);
        assert_eq!(
            lanes.iter().map(|l| (l.lane.as_str(), l.genome_build.as_str())).collect::<Vec<_>>(),
            vec![("2", "hg19"), ("2", "mm9"), ("1", "hg19")]
        );
        assert_eq!(lanes[0].description, "Barcoded 2");
        assert_eq!(
            lanes[0].multiplex,
            Some(vec![multiplex_entry(5, "TTTT", "S1"), multiplex_entry(2, "AAAA", "S2")])
        );
        assert_eq!(lanes[1].description, "S3");
        assert_eq!(lanes[1].multiplex, None);
        assert_eq!(lanes[2].description, "Barcoded 1");
        assert_eq!(
            lanes[2]
                .multiplex
                .as_ref()
                .map(|m| m.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()),
            Some(vec!["S4", "S5", "S6"])
        );
    }

    #[test]
    fn test_non_contiguous_lane_forms_separate_groups() {
        let records = vec![
            SampleSheetRecord::new("FC1", "1", "S1", "hg19", "AAAA"),
            SampleSheetRecord::new("FC1", "2", "S2", "hg19", ""),
            SampleSheetRecord::new("FC1", "1", "S3", "hg19", "CCCC"),
        ];
        let assignment = BarcodeAssignment::from_records(&records, false);
        let lanes = organize_lanes(records, &assignment).unwrap();
        assert_eq!(lanes.len(), 3);
        assert!(lanes.iter().all(|l| l.multiplex.is_none()));
        assert_eq!(lanes[0].description, "S1");
        assert_eq!(lanes[2].description, "S3");
    }

    #[test]
    fn test_unassigned_barcode() {
        let records = vec![
            SampleSheetRecord::new("FC1", "1", "S1", "hg19", "AAAA"),
            SampleSheetRecord::new("FC1", "1", "S2", "hg19", "CCCC"),
        ];
        let assignment = BarcodeAssignment::from_records(&records[..1], false);
        let result = organize_lanes(records, &assignment);
        assert_matches!(result, Err(SampleSheetError::UnassignedBarcode { .. }));
        if let Err(SampleSheetError::UnassignedBarcode { barcode, sample_id, .. }) = result {
            assert_eq!(barcode, "CCCC");
            assert_eq!(sample_id, "S2");
        }
    }

    #[test]
    fn test_read_run_info_with_empty_barcode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sheet(
            dir.path(),
            &["FC1,L1,S1,hg19,", "FC1,L1,S2,hg19,ACGT", "FC1,L1,S3,hg19,TTTT"],
        );
        let lanes = read_run_info(&path, false).unwrap();
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes[0].lane, "L1");
        assert_eq!(lanes[0].description, "Barcoded L1");
        assert_eq!(
            lanes[0].multiplex,
            Some(vec![
                multiplex_entry(1, "", "S1"),
                multiplex_entry(2, "ACGT", "S2"),
                multiplex_entry(3, "TTTT", "S3"),
            ])
        );
    }

    #[test]
    fn test_read_run_info_skipping_empty_barcode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sheet(
            dir.path(),
            &["FC1,L1,S2,hg19,ACGT", "FC1,L1,S3,hg19,TTTT", "FC1,L2,S1,hg19,"],
        );
        let lanes = read_run_info(&path, true).unwrap();
        assert_eq!(lanes.len(), 2);
        assert_eq!(
            lanes[0].multiplex,
            Some(vec![multiplex_entry(1, "ACGT", "S2"), multiplex_entry(2, "TTTT", "S3")])
        );
        assert_eq!(lanes[1].description, "S1");

        // an empty barcode within a multiplexed lane has no id when skipped
        let path = write_sheet(
            dir.path(),
            &["FC1,L1,S1,hg19,", "FC1,L1,S2,hg19,ACGT", "FC1,L1,S3,hg19,TTTT"],
        );
        assert_matches!(
            read_run_info(&path, true),
            Err(SampleSheetError::UnassignedBarcode { .. })
        );
    }

    #[test]
    fn test_convert_writes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sheet(
            dir.path(),
            &[
                "FC1,1,S1,hg19,,Note,N,R1,Me",
                "FC1,2,S2,hg19,ACGT,Note,N,R1,Me",
                "",
                "FC1,2,S3,hg19,TTTT,Note,N,R1,Me",
            ],
        );
        let output = sample_sheet_to_run_info(&path, None, false).unwrap();
        assert_eq!(output, dir.path().join("SampleSheet.yaml"));

        let contents = std::fs::read_to_string(&output).unwrap();
        let expected = "\
- analysis: Standard
  description: S1
  genome_build: hg19
  lane: '1'
- analysis: Standard
  description: Barcoded 2
  genome_build: hg19
  lane: '2'
  multiplex:
  - barcode_id: 2
    barcode_type: SampleSheet
    name: S2
    sequence: ACGT
  - barcode_id: 3
    barcode_type: SampleSheet
    name: S3
    sequence: TTTT
";
        assert_eq!(contents, expected);

        let lanes: Vec<LaneEntry> = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(lanes, read_run_info(&path, false).unwrap());
    }

    #[test]
    fn test_convert_multiple_flowcells_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sheet(dir.path(), &["FC1,1,S1,hg19,", "FC2,2,S2,hg19,"]);
        let output = dir.path().join("out.yaml");
        let result = sample_sheet_to_run_info(&path, Some(output.clone()), false);
        assert_matches!(result, Err(SampleSheetError::MultipleFlowcellIds { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path("/runs/SampleSheet.csv"),
            PathBuf::from("/runs/SampleSheet.yaml")
        );
        assert_eq!(default_output_path("sheet"), PathBuf::from("sheet.yaml"));
    }
}
