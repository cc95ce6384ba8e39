//! The widget controller: owns the document, the session and the command queue.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use shared::domain::{Judgment, SessionId};
use tracing::{debug, error, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{RequestId, UiEvent},
    orchestration::dispatch_backend_command,
    render::{acknowledgment, result_markup},
};
use crate::document::{Document, ElementIds};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Issue a session cookie at mount and have requests carry it.
    pub session_correlation: bool,
    /// Keep judgment controls disabled until a classification is shown.
    pub gate_judgment: bool,
    /// `Some` renders the app version and any model version under the label.
    pub app_version: Option<String>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            session_correlation: true,
            gate_judgment: true,
            app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Idle,
    AwaitingClassification,
    ClassificationShown,
    JudgmentSubmitted,
}

pub struct FeedbackWidget<D: Document> {
    document: D,
    ids: ElementIds,
    options: WidgetOptions,
    session: Option<SessionId>,
    phase: WidgetPhase,
    /// Phase to fall back to once no classification is in flight.
    settled_phase: WidgetPhase,
    in_flight: usize,
    judgments_in_flight: usize,
    next_request_id: u64,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
}

impl<D: Document> FeedbackWidget<D> {
    /// Binds to the page. Returns `None` when any required element is missing.
    pub fn mount(
        mut document: D,
        ids: ElementIds,
        options: WidgetOptions,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Option<Self> {
        if let Some(missing) = ids.all().into_iter().find(|id| !document.contains(id)) {
            debug!(element = missing, "feedback widget element missing; not mounting");
            return None;
        }

        let mut status = String::new();
        let session = if options.session_correlation {
            let session = SessionId::generate();
            document.set_cookie(&session.cookie());
            dispatch_backend_command(
                &cmd_tx,
                BackendCommand::InstallSession { session },
                &mut status,
            );
            Some(session)
        } else {
            None
        };

        if options.gate_judgment {
            document.set_disabled(&ids.approve, true);
            document.set_disabled(&ids.reject, true);
        }

        info!(
            session = %session.map(|s| s.to_string()).unwrap_or_default(),
            gated = options.gate_judgment,
            "feedback widget mounted"
        );

        Some(Self {
            document,
            ids,
            options,
            session,
            phase: WidgetPhase::Idle,
            settled_phase: WidgetPhase::Idle,
            in_flight: 0,
            judgments_in_flight: 0,
            next_request_id: 0,
            cmd_tx,
            ui_rx,
            status,
        })
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn ids(&self) -> &ElementIds {
        &self.ids
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn phase(&self) -> WidgetPhase {
        self.phase
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn events(&self) -> &Receiver<UiEvent> {
        &self.ui_rx
    }

    /// Classification and judgment requests that have not reported back yet.
    pub fn pending_requests(&self) -> usize {
        self.in_flight + self.judgments_in_flight
    }

    /// Routes a click the way the page would: disabled or unknown controls
    /// swallow it.
    pub fn click(&mut self, id: &str) -> bool {
        if !self.document.contains(id) || self.document.is_disabled(id) {
            debug!(element = id, "click ignored");
            return false;
        }

        if id == self.ids.submit {
            self.submit_input()
        } else if id == self.ids.approve {
            self.submit_judgment(Judgment::Approve)
        } else if id == self.ids.reject {
            self.submit_judgment(Judgment::Reject)
        } else {
            false
        }
    }

    /// Sends the trimmed input for classification. Blank input sends nothing.
    pub fn submit_input(&mut self) -> bool {
        let text = self
            .document
            .value(&self.ids.input)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            return false;
        }

        self.next_request_id += 1;
        let request_id = RequestId(self.next_request_id);
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::SubmitInput { request_id, text },
            &mut self.status,
        ) {
            return false;
        }

        self.status.clear();
        self.in_flight += 1;
        self.phase = WidgetPhase::AwaitingClassification;
        debug!(request = request_id.0, in_flight = self.in_flight, "classification requested");
        true
    }

    /// Acknowledges the judgment to the user before the request goes out.
    pub fn submit_judgment(&mut self, judgment: Judgment) -> bool {
        if self.options.gate_judgment {
            self.set_judgment_enabled(false);
        }

        self.document.alert(acknowledgment(judgment));

        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::SubmitJudgment { judgment },
            &mut self.status,
        ) {
            return false;
        }

        self.judgments_in_flight += 1;
        self.settled_phase = WidgetPhase::JudgmentSubmitted;
        if self.in_flight == 0 {
            self.phase = WidgetPhase::JudgmentSubmitted;
        }
        true
    }

    /// Applies every event the backend worker has delivered so far.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    /// Applies events until no request is pending or `timeout` elapses.
    /// Returns whether everything settled.
    pub fn drain_pending(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending_requests() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.ui_rx.recv_timeout(remaining) {
                Ok(event) => self.apply_event(event),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(pending = self.pending_requests(), "gave up waiting for backend");
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("backend worker gone while draining");
                    return false;
                }
            }
        }
        true
    }

    pub fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionInstalled { session, accepted } => {
                debug!(%session, accepted, "session correlation ready");
            }
            UiEvent::ClassificationReceived { request_id, result } => {
                self.finish_classification();
                info!(request = request_id.0, label = %result.label, "rendering classification");
                match result_markup(&result, self.options.app_version.as_deref()) {
                    Ok(html) => self.document.set_inner_html(&self.ids.result, &html),
                    Err(err) => error!(request = request_id.0, "failed to render result: {err}"),
                }
                self.set_judgment_enabled(true);
                self.settled_phase = WidgetPhase::ClassificationShown;
                if self.in_flight == 0 {
                    self.phase = WidgetPhase::ClassificationShown;
                }
            }
            UiEvent::ClassificationFailed { request_id, error } => {
                self.finish_classification();
                error!(
                    request = request_id.0,
                    category = ?error.category(),
                    "classification failed: {}",
                    error.message()
                );
                if self.in_flight == 0 {
                    self.phase = self.settled_phase;
                }
            }
            UiEvent::JudgmentAcknowledged { judgment, ack } => {
                self.judgments_in_flight = self.judgments_in_flight.saturating_sub(1);
                info!(
                    is_correct = judgment.is_correct(),
                    status = ack.status.as_deref().unwrap_or("-"),
                    message = ack.message.as_deref().unwrap_or("-"),
                    "judgment submitted"
                );
            }
            UiEvent::JudgmentFailed { judgment, error } => {
                self.judgments_in_flight = self.judgments_in_flight.saturating_sub(1);
                error!(
                    is_correct = judgment.is_correct(),
                    category = ?error.category(),
                    "error submitting judgment: {}",
                    error.message()
                );
            }
            UiEvent::Error(error) => {
                error!(context = ?error.context(), "backend worker error: {}", error.message());
                self.status = error.message().to_string();
            }
        }
    }

    fn finish_classification(&mut self) {
        if self.in_flight == 0 {
            warn!("classification outcome without a pending request");
        }
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn set_judgment_enabled(&mut self, enabled: bool) {
        self.document.set_disabled(&self.ids.approve, !enabled);
        self.document.set_disabled(&self.ids.reject, !enabled);
    }
}

#[cfg(test)]
#[path = "tests/widget_tests.rs"]
mod tests;
