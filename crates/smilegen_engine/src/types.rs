use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::DataUrl;

pub type JobId = u64;

/// Expression effects offered by the emotion-editor service, sent as `service_choice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expression {
    #[default]
    DimpleSmile,
    PearDimpleSmile,
    BigGrin,
    StandardGrin,
    CoolPose,
    Sad,
    ForcedSmile,
    OpeningEyes,
}

impl Expression {
    pub fn code(self) -> u16 {
        match self {
            Expression::DimpleSmile => 10,
            Expression::PearDimpleSmile => 11,
            Expression::BigGrin => 12,
            Expression::StandardGrin => 13,
            Expression::CoolPose => 14,
            Expression::Sad => 15,
            Expression::ForcedSmile => 16,
            Expression::OpeningEyes => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Sending,
    Analyzing,
    Generating,
}

/// Edited image as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultImage {
    Inline(DataUrl),
    Remote(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StageReached {
        job_id: JobId,
        stage: Stage,
    },
    JobCompleted {
        job_id: JobId,
        result: Result<ResultImage, ClientError>,
    },
    PlaceholderRendered(Result<DataUrl, String>),
    ResultSaved(Result<PathBuf, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// HTTP-like status carried by API failures.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Api { status } => status,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Local input rejected; nothing was sent.
    Validation,
    MissingCredential,
    /// HTTP-level (`status` set) or payload-level (`status` empty) rejection.
    Api { status: Option<u16> },
    /// Request aborted after the configured timeout.
    Timeout,
    Network,
    InvalidResponse,
    /// Polling gave up before the job reached a terminal status.
    ResultNotReady,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "validation error"),
            FailureKind::MissingCredential => write!(f, "missing api key"),
            FailureKind::Api { status: Some(code) } => write!(f, "api error (http {code})"),
            FailureKind::Api { status: None } => write!(f, "api error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::ResultNotReady => write!(f, "result not ready"),
        }
    }
}

/// Per-client request counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientStats {
    pub requests: u64,
    pub errors: u64,
}

impl ClientStats {
    /// Share of successful requests in percent; 0 before the first request.
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        let ok = self.requests.saturating_sub(self.errors);
        ok as f64 / self.requests as f64 * 100.0
    }
}
