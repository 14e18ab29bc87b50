//! User-initiated workflows

pub mod create_report;

pub use create_report::{DraftState, ReportFlow, ValidationError};
