//! Interactive session: drives model loading and classification on background
//! workers and hands results back to a single-threaded display loop.
//!
//! ```text
//!   display loop ──select / classify──▶ SessionController ──spawn_blocking──▶ worker
//!        ▲                                     │                              │
//!        └──────── pump() drains ◀── mpsc ◀────┴──────── TaskEvent ◀──────────┘
//! ```

mod controller;

pub use controller::{Loader, SessionController, SessionControllerBuilder};

/// Lifecycle of one interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    LoadingModel,
    ModelReady,
    ModelFailed,
    Classifying,
    ResultsReady,
    ClassificationFailed,
}

impl SessionState {
    /// Status line shown to the user.
    pub fn status_text(&self) -> &'static str {
        match self {
            SessionState::Idle => "Starting...",
            SessionState::LoadingModel => "Loading model...",
            SessionState::ModelReady => "Model loaded successfully",
            SessionState::ModelFailed => "Model loading failed",
            SessionState::Classifying => "Classifying...",
            SessionState::ResultsReady => "Classification complete",
            SessionState::ClassificationFailed => "Classification failed",
        }
    }

    /// Whether a background task is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::LoadingModel | SessionState::Classifying)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SessionState::ModelFailed | SessionState::ClassificationFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Why a classify request was refused without starting any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyRejection {
    #[error("Please select an image first.")]
    NoImageSelected,
    #[error("Model is not loaded.")]
    ModelNotReady,
    #[error("A classification is already in progress.")]
    Busy,
}

impl ClassifyRejection {
    pub fn severity(&self) -> Severity {
        match self {
            ClassifyRejection::ModelNotReady => Severity::Error,
            ClassifyRejection::NoImageSelected | ClassifyRejection::Busy => Severity::Warning,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ClassifyRejection::NoImageSelected => "No Image",
            ClassifyRejection::ModelNotReady => "Model Error",
            ClassifyRejection::Busy => "Busy",
        }
    }
}
