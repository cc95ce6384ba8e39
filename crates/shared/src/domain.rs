use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cookie key the backend reads to correlate an input with its judgment.
pub const SESSION_COOKIE_NAME: &str = "sessionId";

/// Opaque per-mount token; generated once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Cookie string as written from client-side script, scoped to the site root.
    pub fn cookie(&self) -> String {
        format!("{SESSION_COOKIE_NAME}={}; path=/; SameSite=Lax", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Approve,
    Reject,
}

impl Judgment {
    pub fn from_is_correct(is_correct: bool) -> Self {
        if is_correct {
            Self::Approve
        } else {
            Self::Reject
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Self::Approve)
    }
}
