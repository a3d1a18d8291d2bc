//! Call result reporting.
//!
//! After every call the connection hands a [`DoneInfo`] to the registered
//! [`ReportInfoAnalyzer`]; the returned [`RetStatus`] drives the selected
//! instance's circuit breaker.

use std::net::SocketAddr;
use std::time::Duration;
use tonic::Status;

/// Simplified outcome of a call as seen by health tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetStatus {
    Success,
    Fail,
}

impl RetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetStatus::Success => "success",
            RetStatus::Fail => "fail",
        }
    }
}

/// Everything known about a finished call.
#[derive(Debug, Clone, Copy)]
pub struct DoneInfo<'a> {
    /// Error returned by the call, if it failed.
    pub err: Option<&'a Status>,
    /// Instance the call was routed to. `None` when no instance was available.
    pub instance: Option<SocketAddr>,
    /// Wall time spent on the call.
    pub elapsed: Duration,
}

/// Classifies call outcomes into `(status, code)`.
pub trait ReportInfoAnalyzer: Send + Sync {
    fn analyze(&self, info: &DoneInfo<'_>) -> (RetStatus, u32);
}

impl<F> ReportInfoAnalyzer for F
where
    F: Fn(&DoneInfo<'_>) -> (RetStatus, u32) + Send + Sync,
{
    fn analyze(&self, info: &DoneInfo<'_>) -> (RetStatus, u32) {
        self(info)
    }
}

/// Analyzer used when none is injected: any error is a failure carrying
/// its gRPC status code.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnalyzer;

impl ReportInfoAnalyzer for DefaultAnalyzer {
    fn analyze(&self, info: &DoneInfo<'_>) -> (RetStatus, u32) {
        match info.err {
            Some(status) => (RetStatus::Fail, status.code() as u32),
            None => (RetStatus::Success, 0),
        }
    }
}
