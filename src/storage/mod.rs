//! Scan report persistence.
//!
//! Each report is written as its own JSON file in the reports directory.

mod json_store;

pub use json_store::ReportStore;
