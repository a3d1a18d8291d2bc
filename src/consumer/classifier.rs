//! Result classifier reported to the mesh after every echo call.

use crate::mesh::report::{DoneInfo, ReportInfoAnalyzer, RetStatus};

/// Map a call outcome to `(status, code)`.
///
/// No error is a success with code 0. Any error is a failure carrying the
/// numeric gRPC status code.
pub fn classify(info: &DoneInfo<'_>) -> (RetStatus, u32) {
    match info.err {
        Some(status) => (RetStatus::Fail, status.code() as u32),
        None => (RetStatus::Success, 0),
    }
}

/// [`classify`] as an injectable analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl ReportInfoAnalyzer for Classifier {
    fn analyze(&self, info: &DoneInfo<'_>) -> (RetStatus, u32) {
        classify(info)
    }
}
