//! A library for converting sequencing sample sheets to run info and locating the sample sheet
//! for a run.
//!
//! # Overview
//!
//! The flow of data is as follows:
//!
//! - The [`sample_sheet::SampleSheetReader`] reads [`sample_metadata::SampleSheetRecord`]s from
//!   a sample sheet CSV, one at a time.
//! - A [`barcodes::BarcodeAssignment`] assigns a numeric id to each distinct barcode sequence.
//! - [`run_info::organize_lanes`] groups records by lane and genome build into
//!   [`run_info::LaneEntry`]s, which are written as YAML by
//!   [`run_info::sample_sheet_to_run_info`].
//! - The [`locator::SampleSheetLocator`] indexes the sample sheets in a set of directories by
//!   flowcell id and finds the one most [`similarity`] similar to the flowcell name of a run.
#![deny(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]
pub mod barcodes;
pub mod flowcell;
pub mod locator;
pub mod opts;
pub mod run;
pub mod run_info;
pub mod sample_metadata;
pub mod sample_sheet;
pub mod similarity;
pub mod utils;
