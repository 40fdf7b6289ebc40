//! Classification of processing failures into user guidance.

use crate::NoticeAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Bad local input; never reached the network.
    Validation,
    MissingCredential,
    /// Server rejected the request or signalled failure in its payload.
    Api,
    Timeout,
    Network,
    InvalidResponse,
    ResultNotReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessFailure {
    pub category: FailureCategory,
    pub status: Option<u16>,
    pub message: String,
}

impl ProcessFailure {
    pub fn new(category: FailureCategory, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            category,
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guidance {
    InvalidCredential,
    MissingCredential,
    RateLimited,
    PayloadTooLarge,
    TimedOut,
    InvalidInput(String),
    Server(String),
    Generic,
}

impl Guidance {
    pub fn message(&self) -> String {
        match self {
            Guidance::InvalidCredential => {
                "Invalid API key. Please check your AILabTools API key.".to_string()
            }
            Guidance::MissingCredential => "Please set API key first".to_string(),
            Guidance::RateLimited => "Too many requests. Please try again later.".to_string(),
            Guidance::PayloadTooLarge => {
                "Image file too large. Please upload a smaller image (max 5MB).".to_string()
            }
            Guidance::TimedOut => {
                "Request timeout. Please check your network connection.".to_string()
            }
            Guidance::InvalidInput(message) => message.clone(),
            Guidance::Server(message) => format!("API error: {message}"),
            Guidance::Generic => "Processing failed. Please try again.".to_string(),
        }
    }

    pub fn action(&self) -> Option<NoticeAction> {
        match self {
            Guidance::InvalidCredential => Some(NoticeAction::ResetKey),
            Guidance::MissingCredential => Some(NoticeAction::SetKey),
            _ => None,
        }
    }
}

pub fn classify(failure: &ProcessFailure) -> Guidance {
    match failure.category {
        FailureCategory::Validation => Guidance::InvalidInput(failure.message.clone()),
        FailureCategory::MissingCredential => Guidance::MissingCredential,
        FailureCategory::Timeout => Guidance::TimedOut,
        FailureCategory::Api => match failure.status {
            Some(401) => Guidance::InvalidCredential,
            Some(429) => Guidance::RateLimited,
            Some(413) => Guidance::PayloadTooLarge,
            _ if failure.message.is_empty() => Guidance::Generic,
            _ => Guidance::Server(failure.message.clone()),
        },
        FailureCategory::Network | FailureCategory::InvalidResponse | FailureCategory::ResultNotReady => {
            if failure.message.is_empty() {
                Guidance::Generic
            } else {
                Guidance::Server(failure.message.clone())
            }
        }
    }
}
