//! Output module for harvested files and run reports
//!
//! This module handles:
//! - Planning local paths that mirror remote URL layouts
//! - Claiming files without overwriting anything already on disk
//! - Recording run statistics and printing the end-of-run summary

mod paths;
mod report;

pub use paths::{
    create_unique, sanitize_filename, write_unique, FileTarget, PathPlanner,
    DOCUMENT_PLACEHOLDER, MAX_NAME_CHARS,
};
pub use report::{Failure, RunRecorder, RunReport};
