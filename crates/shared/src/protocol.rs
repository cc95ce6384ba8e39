use serde::{Deserialize, Serialize};

use crate::domain::Judgment;

pub const USER_INPUT_PATH: &str = "/userInput";
pub const JUDGMENT_PATH: &str = "/judgment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInputRequest {
    pub text: String,
}

/// Body of a successful `/userInput` response.
///
/// Missing fields decode as absent instead of failing the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentRequest {
    pub is_correct: bool,
}

impl From<Judgment> for JudgmentRequest {
    fn from(value: Judgment) -> Self {
        Self {
            is_correct: value.is_correct(),
        }
    }
}

/// Acknowledgment from `/judgment`. Only ever logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_judgment: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
