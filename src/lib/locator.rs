//! Finds the sample sheet that belongs to a sequencing run.
//!
//! Sample sheets are searched for in a configured list of directories.  Each sheet is indexed
//! by its flowcell identifier, and the flowcell name of the run is matched approximately against
//! the identifiers, since identifiers are typed into sheets by hand and may contain typos or be
//! truncated.
#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fgoxide::io::Io;
use glob::{glob_with, MatchOptions, Pattern};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flowcell::{get_flowcell_info, FlowcellError};
use crate::sample_sheet::{ensure_single_flowcell, flowcell_ids, SampleSheetError};
use crate::similarity::{get_close_matches, SimilarityError, DEFAULT_SIMILARITY_CUTOFF};

/// The pattern, within each sample sheet directory, that sample sheets are found with.
pub const SAMPLE_SHEET_GLOB: &str = "*.csv";

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error(transparent)]
    SampleSheet(#[from] SampleSheetError),

    #[error("Io error occurred")]
    FgError(#[from] fgoxide::FgError),

    #[error("Unable to parse the configuration")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid sample sheet pattern")]
    Pattern(#[from] glob::PatternError),

    #[error("Unable to list sample sheets")]
    Glob(#[from] glob::GlobError),

    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    Flowcell(#[from] FlowcellError),
}

/// Configuration for locating sample sheets.
///
/// Typically read from the same YAML file as other pipeline settings; any other keys are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocatorConfig {
    /// The directories to search for sample sheets, in order.
    #[serde(default)]
    pub samplesheet_directories: Vec<PathBuf>,
}

impl LocatorConfig {
    /// Reads the configuration from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LocatorError> {
        let io = Io::default();
        let reader = io.new_reader(&path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Searches sample sheet directories for the sheet of a given flowcell.
#[derive(Debug, Clone)]
pub struct SampleSheetLocator {
    directories: Vec<PathBuf>,
    min_similarity: f64,
}

impl SampleSheetLocator {
    /// Builds a locator over the directories in the configuration, using the default similarity
    /// cutoff.
    pub fn new(config: &LocatorConfig) -> Self {
        Self {
            directories: config.samplesheet_directories.clone(),
            min_similarity: DEFAULT_SIMILARITY_CUTOFF,
        }
    }

    /// Sets the minimum similarity between the flowcell name and a sample sheet's flowcell
    /// identifier for the sheet to match.
    #[must_use]
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Hidden files, such as editor lock files, are not candidates.
    fn match_options() -> MatchOptions {
        MatchOptions { require_literal_leading_dot: true, ..MatchOptions::default() }
    }

    /// Lists the candidate sample sheets in each directory that exists, in directory order.
    pub fn candidate_sheets(&self) -> Result<Vec<PathBuf>, LocatorError> {
        let mut sheets = vec![];
        for dir in self.directories.iter().filter(|d| d.exists()) {
            // escape the directory so only the file name is treated as a pattern
            let pattern =
                Path::new(&Pattern::escape(&dir.to_string_lossy())).join(SAMPLE_SHEET_GLOB);
            for path in glob_with(&pattern.to_string_lossy(), Self::match_options())? {
                let path = path?;
                if path.is_file() {
                    sheets.push(path);
                }
            }
        }
        Ok(sheets)
    }

    /// Maps the flowcell identifier of each candidate sample sheet to its path.
    ///
    /// Sheets without samples, or with an empty identifier, are not indexed.  When two sheets
    /// have the same identifier the one found last is kept.
    ///
    /// # Errors
    ///
    /// - [`SampleSheetError::MultipleFlowcellIds`] if any sheet has more than one flowcell id
    pub fn index(&self) -> Result<BTreeMap<String, PathBuf>, LocatorError> {
        let mut index = BTreeMap::new();
        for sheet in self.candidate_sheets()? {
            let flowcell_id = ensure_single_flowcell(flowcell_ids(&sheet)?, &sheet)?;
            debug!(
                "Found flowcell {} in {}",
                flowcell_id.as_deref().unwrap_or("<none>"),
                sheet.to_string_lossy()
            );
            if let Some(flowcell_id) = flowcell_id.filter(|id| !id.is_empty()) {
                index.insert(flowcell_id, sheet);
            }
        }
        Ok(index)
    }

    /// Returns the path to the sample sheet whose flowcell identifier best matches
    /// `flowcell_name`, or `None` if no identifier is similar enough.
    ///
    /// Among equally similar identifiers the lexicographically smallest is chosen.
    pub fn locate(&self, flowcell_name: &str) -> Result<Option<PathBuf>, LocatorError> {
        let index = self.index()?;
        let matches = get_close_matches(
            flowcell_name,
            index.keys().map(String::as_str),
            1,
            self.min_similarity,
        )?;
        match matches.first() {
            Some(flowcell_id) => {
                info!(
                    "Matched flowcell {} to sample sheet flowcell {}",
                    flowcell_name, flowcell_id
                );
                Ok(index.get(*flowcell_id).cloned())
            }
            None => {
                debug!(
                    "No sample sheet flowcell among {} is similar to {}",
                    index.len(),
                    flowcell_name
                );
                Ok(None)
            }
        }
    }
}

/// Returns the sample sheet for the run in `run_dir`, if there is one.
///
/// The flowcell name is taken from `flowcell_name` when given, otherwise it is parsed from the
/// run directory name.
pub fn locate_run_samplesheet<P: AsRef<Path>>(
    run_dir: P,
    flowcell_name: Option<&str>,
    config: &LocatorConfig,
    min_similarity: f64,
) -> Result<Option<PathBuf>, LocatorError> {
    let flowcell_name = match flowcell_name {
        Some(name) => name.to_string(),
        None => get_flowcell_info(run_dir)?.name,
    };
    info!(
        "Searching {} sample sheet directories for flowcell {}",
        config.samplesheet_directories.len(),
        flowcell_name
    );
    SampleSheetLocator::new(config).with_min_similarity(min_similarity).locate(&flowcell_name)
}

/// Returns the sample sheet for the run in `run_dir`, if there is one, using the flowcell name
/// encoded in the run directory name.
pub fn run_has_samplesheet<P: AsRef<Path>>(
    run_dir: P,
    config: &LocatorConfig,
) -> Result<Option<PathBuf>, LocatorError> {
    locate_run_samplesheet(run_dir, None, config, DEFAULT_SIMILARITY_CUTOFF)
}
