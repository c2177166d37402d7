//! Error taxonomy shared by the match finder and the range encoder.
//!
//! Every fallible library call returns `Result<_, Fl2Error>`. The variants
//! are kinds, not causes: callers branch on them (for instance, to tell a
//! deliberate cancellation apart from a real failure) and the CLI turns them
//! into `anyhow` errors with the [`Display`](fmt::Display) text.

use std::fmt;

/// Failure kinds surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fl2Error {
    /// A table, builder scratch area, dictionary buffer or encoder output
    /// buffer could not be reserved. Fatal to the current call only.
    AllocationFailure,
    /// Depth, thread count, dictionary size or block window outside the
    /// supported range. Raised before any work starts.
    ParameterOutOfBound,
    /// The build observed the cancellation flag and stopped early. The table
    /// is incomplete and must not be queried.
    Cancelled,
    /// An integrity check found an out-of-range link, a forward link (which
    /// could close a cycle) or a stored length the data does not back up.
    CorruptionDetected,
    /// The operation is not valid in the table's current lifecycle stage.
    StageWrong,
}

impl Fl2Error {
    /// Stable identifier, suitable for logs and test assertions.
    pub fn error_name(&self) -> &'static str {
        match self {
            Fl2Error::AllocationFailure => "ERROR_memory_allocation",
            Fl2Error::ParameterOutOfBound => "ERROR_parameter_outOfBound",
            Fl2Error::Cancelled => "ERROR_canceled",
            Fl2Error::CorruptionDetected => "ERROR_corruption_detected",
            Fl2Error::StageWrong => "ERROR_stage_wrong",
        }
    }

    /// `true` for the one non-failure termination path.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Fl2Error::Cancelled)
    }
}

impl fmt::Display for Fl2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Fl2Error::AllocationFailure => "Allocation error : not enough memory",
            Fl2Error::ParameterOutOfBound => "Parameter is out of bound",
            Fl2Error::Cancelled => "Processing was canceled",
            Fl2Error::CorruptionDetected => "Corrupted match table detected",
            Fl2Error::StageWrong => "Not possible at this stage of encoding",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Fl2Error {}
