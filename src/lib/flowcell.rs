#![forbid(unsafe_code)]

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlowcellError {
    #[error("Did not find flowcell name and date in run directory: {0}")]
    NotFound(String),
}

/// The flowcell name and run date encoded in a run directory name, e.g.
/// `110106_SN150_0123_A80AJAABXX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowcellInfo {
    pub name: String,
    pub date: String,
}

/// Parses the flowcell name and date from the final component of a run directory.
///
/// The directory name is split on `_`.  The part ending in `XX` (or `xx`) is the flowcell name,
/// and a six digit part is the date.  When several parts qualify the last one wins.
pub fn get_flowcell_info<P: AsRef<Path>>(run_dir: P) -> Result<FlowcellInfo, FlowcellError> {
    let dir_name = run_dir
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut name = None;
    let mut date = None;
    for part in dir_name.split('_') {
        if part.ends_with("XX") || part.ends_with("xx") {
            name = Some(part.to_string());
        } else if part.len() == 6 && part.bytes().all(|b| b.is_ascii_digit()) {
            date = Some(part.to_string());
        }
    }

    match (name, date) {
        (Some(name), Some(date)) => Ok(FlowcellInfo { name, date }),
        _ => Err(FlowcellError::NotFound(dir_name)),
    }
}
