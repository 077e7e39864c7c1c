#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;

use crate::{locator::LocatorConfig, similarity::DEFAULT_SIMILARITY_CUTOFF, utils::built_info};

pub static TOOL_NAME: &str = "runinfo";

static SHORT_USAGE: &str =
    "Converts sample sheets to run info YAML and finds the sample sheet for a run.";

static LONG_USAGE: &str = "
Converts sample sheets to run info YAML and finds the sample sheet for a run.

The sample sheet is a CSV file with a header line.  Each following line describes one sample
with the columns: flowcell id, lane, sample id, genome build, and barcode sequence.  Any further
columns are ignored.  All samples in a sample sheet must be from the same flowcell.

`convert` groups the samples by lane and genome build.  Lanes with more than one sample are
written as multiplexed lanes, with a numeric id assigned to each barcode sequence.

`locate` searches the sample sheet directories for the sample sheet whose flowcell id is most
similar to the flowcell name of the run, and prints its path.  Nothing is printed when no
sample sheet is similar enough.

Example invocations:

runinfo convert \\
  --sample-sheet SampleSheet.csv \\
  --output run_info.yaml

runinfo locate \\
  --run-dir /runs/110106_SN150_0123_A80AJAABXX \\
  --config post_process.yaml
";

#[derive(Parser, Debug, Clone)]
#[clap(name = TOOL_NAME, version = built_info::VERSION.as_str(), about=SHORT_USAGE, long_about=LONG_USAGE, term_width=0)]
pub struct Opts {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Converts a sample sheet to run info YAML.
    Convert(ConvertOpts),
    /// Finds the sample sheet for a run directory.
    Locate(LocateOpts),
}

#[derive(Args, Debug, Clone)]
pub struct ConvertOpts {
    /// Path to the sample sheet.
    #[clap(long, short = 's', display_order = 1)]
    pub sample_sheet: PathBuf,

    /// Path to write the run info to.
    ///
    /// [default: the sample sheet path with a `.yaml` extension]
    #[clap(long, short = 'o', display_order = 2)]
    pub output: Option<PathBuf>,

    /// Do not assign a barcode id to samples without a barcode sequence.
    ///
    /// By default the empty barcode is assigned an id like any other sequence, and since it
    /// sorts first it receives id 1.
    #[clap(long, display_order = 11)]
    pub skip_empty_barcodes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LocateOpts {
    /// Path to the run directory.
    #[clap(long, short = 'r', display_order = 1)]
    pub run_dir: PathBuf,

    /// The flowcell name to search for.
    ///
    /// [default: parsed from the run directory name]
    #[clap(long, short = 'f', display_order = 2)]
    pub flowcell_name: Option<String>,

    /// YAML configuration listing the `samplesheet_directories` to search.
    #[clap(long, short = 'c', display_order = 3)]
    pub config: Option<PathBuf>,

    /// Directories to search after those in the configuration.
    #[clap(long, short = 'd', display_order = 4, multiple_values = true)]
    pub samplesheet_dirs: Vec<PathBuf>,

    /// Minimum similarity between the flowcell name and a sample sheet's flowcell id.
    #[clap(long, short = 'm', default_value_t = DEFAULT_SIMILARITY_CUTOFF, display_order = 11)]
    pub min_similarity: f64,
}

impl LocateOpts {
    /// Builds the [`LocatorConfig`] from the configuration file, if any, followed by the
    /// directories given on the command line.
    pub fn locator_config(&self) -> Result<LocatorConfig> {
        let mut config = match &self.config {
            Some(path) => LocatorConfig::from_path(path).with_context(|| {
                format!("Unable to read configuration: {}", path.to_string_lossy())
            })?,
            None => LocatorConfig::default(),
        };
        config.samplesheet_directories.extend(self.samplesheet_dirs.iter().cloned());
        Ok(config)
    }
}

/// Parse args and set up logging / tracing
pub fn setup() -> Opts {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    Opts::parse()
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Command, LocateOpts, Opts};
    use crate::similarity::DEFAULT_SIMILARITY_CUTOFF;

    #[test]
    fn test_parse_convert() {
        let opts = Opts::try_parse_from([
            "runinfo",
            "convert",
            "-s",
            "SampleSheet.csv",
            "--skip-empty-barcodes",
        ])
        .unwrap();
        match opts.command {
            Command::Convert(convert) => {
                assert_eq!(convert.sample_sheet, PathBuf::from("SampleSheet.csv"));
                assert_eq!(convert.output, None);
                assert!(convert.skip_empty_barcodes);
            }
            Command::Locate(_) => panic!("Expected the convert command"),
        }
    }

    #[test]
    fn test_parse_locate() {
        let opts = Opts::try_parse_from([
            "runinfo",
            "locate",
            "--run-dir",
            "/runs/110106_SN150_0123_A80AJAABXX",
            "--samplesheet-dirs",
            "/a",
            "/b",
        ])
        .unwrap();
        match opts.command {
            Command::Locate(locate) => {
                assert_eq!(locate.flowcell_name, None);
                assert_eq!(locate.samplesheet_dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
                assert!((locate.min_similarity - DEFAULT_SIMILARITY_CUTOFF).abs() < f64::EPSILON);
            }
            Command::Convert(_) => panic!("Expected the locate command"),
        }
    }

    #[test]
    fn test_parse_requires_command() {
        assert!(Opts::try_parse_from(["runinfo"]).is_err());
        assert!(Opts::try_parse_from(["runinfo", "convert"]).is_err());
    }

    #[test]
    fn test_locator_config_appends_command_line_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("post_process.yaml");
        std::fs::write(&config, "samplesheet_directories:\n  - /data/sheets\n").unwrap();
        let opts = LocateOpts {
            run_dir: PathBuf::from("/runs/110106_SN150_0123_A80AJAABXX"),
            flowcell_name: None,
            config: Some(config),
            samplesheet_dirs: vec![PathBuf::from("/more/sheets")],
            min_similarity: 0.6,
        };
        assert_eq!(
            opts.locator_config().unwrap().samplesheet_directories,
            vec![PathBuf::from("/data/sheets"), PathBuf::from("/more/sheets")]
        );
    }
}
