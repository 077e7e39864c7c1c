use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use log::info;

use crate::{
    locator::locate_run_samplesheet,
    opts::{Command, ConvertOpts, LocateOpts, Opts},
    run_info::sample_sheet_to_run_info,
};

/// Converts the sample sheet to run info, returning the path the run info was written to.
pub fn convert(opts: &ConvertOpts) -> Result<PathBuf> {
    ensure!(
        opts.sample_sheet.exists(),
        "Sample sheet does not exist: {}",
        opts.sample_sheet.to_string_lossy()
    );
    sample_sheet_to_run_info(&opts.sample_sheet, opts.output.clone(), opts.skip_empty_barcodes)
        .with_context(|| {
            format!("Unable to convert sample sheet: {}", opts.sample_sheet.to_string_lossy())
        })
}

/// Finds the sample sheet for the run, returning `None` if there is no matching sample sheet.
pub fn locate(opts: &LocateOpts) -> Result<Option<PathBuf>> {
    let config = opts.locator_config()?;
    locate_run_samplesheet(
        &opts.run_dir,
        opts.flowcell_name.as_deref(),
        &config,
        opts.min_similarity,
    )
    .with_context(|| {
        format!("Unable to locate the sample sheet for run: {}", opts.run_dir.to_string_lossy())
    })
}

/// Run the command given on the command line.
pub fn run(opts: Opts) -> Result<(), anyhow::Error> {
    match opts.command {
        Command::Convert(opts) => {
            convert(&opts)?;
        }
        Command::Locate(opts) => match locate(&opts)? {
            Some(sheet) => println!("{}", sheet.to_string_lossy()),
            None => info!("No sample sheet found for run: {}", opts.run_dir.to_string_lossy()),
        },
    }
    Ok(())
}
