//! Backend commands queued from the widget to the backend worker.

use shared::domain::{Judgment, SessionId};

use crate::controller::events::RequestId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    InstallSession { session: SessionId },
    SubmitInput { request_id: RequestId, text: String },
    SubmitJudgment { judgment: Judgment },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallSession { .. } => "install_session",
            Self::SubmitInput { .. } => "submit_input",
            Self::SubmitJudgment { .. } => "submit_judgment",
        }
    }
}
