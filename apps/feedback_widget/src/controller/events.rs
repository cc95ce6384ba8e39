//! Backend-to-widget events and error modeling.

use client_core::ClientError;
use shared::{
    domain::{Judgment, SessionId},
    protocol::{ClassificationResponse, JudgmentAck},
};

/// Correlates a classification result with the submission that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone)]
pub enum UiEvent {
    SessionInstalled {
        session: SessionId,
        accepted: bool,
    },
    ClassificationReceived {
        request_id: RequestId,
        result: ClassificationResponse,
    },
    ClassificationFailed {
        request_id: RequestId,
        error: UiError,
    },
    JudgmentAcknowledged {
        judgment: Judgment,
        ack: JudgmentAck,
    },
    JudgmentFailed {
        judgment: Judgment,
        error: UiError,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Backend,
    Decode,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    SubmitInput,
    SubmitJudgment,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Transport { .. } | ClientError::Build(_) => UiErrorCategory::Transport,
            ClientError::Status { .. } => UiErrorCategory::Backend,
            ClientError::Decode { .. } => UiErrorCategory::Decode,
            ClientError::InvalidBaseUrl { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
