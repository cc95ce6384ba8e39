use serde::{Deserialize, Serialize};

/// Error JSON the backend returns on 4xx/5xx.
///
/// Two shapes are in use: `{"error": "..."}` from the classification route and
/// `{"status": "error", "message": "..."}` from the judgment route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BackendErrorBody {
    pub fn describe(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}
