//! Pipeline error kinds.

use std::fmt;

/// Errors surfaced by the preview and batch paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A kernel module failed to load or is missing from the backend.
    BackendUnavailable(String),
    /// The backend failed during a compute call.
    BackendCompute(String),
    /// The execution queue was shut down while work was still pending.
    Interrupted,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable(s) => write!(f, "backend unavailable: {}", s),
            Self::BackendCompute(s) => write!(f, "backend compute failed: {}", s),
            Self::Interrupted => write!(f, "execution queue shut down with work pending"),
        }
    }
}

impl std::error::Error for PipelineError {}
