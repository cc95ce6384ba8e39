//! Runtime bridge between the widget command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::FeedbackApi;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, error, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};

/// Spawns the backend worker thread.
///
/// Each command becomes its own task, so requests overlap and complete in
/// whatever order the backend answers. The worker exits once every command
/// sender is dropped.
pub fn launch(
    api: Arc<dyn FeedbackApi>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                    UiErrorCategory::Unknown,
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        while let Ok(cmd) = cmd_rx.recv() {
            debug!(command = cmd.name(), "backend worker picked up command");
            match cmd {
                BackendCommand::InstallSession { session } => {
                    let accepted = api.install_session(session);
                    if !accepted {
                        warn!(%session, "backend client does not send credentials; session cookie unused");
                    }
                    let _ = ui_tx.try_send(UiEvent::SessionInstalled { session, accepted });
                }
                BackendCommand::SubmitInput { request_id, text } => {
                    let api = Arc::clone(&api);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        let event = match api.classify(&text).await {
                            Ok(result) => UiEvent::ClassificationReceived { request_id, result },
                            Err(err) => UiEvent::ClassificationFailed {
                                request_id,
                                error: UiError::from_client_error(UiErrorContext::SubmitInput, &err),
                            },
                        };
                        send_event(&ui_tx, event);
                    });
                }
                BackendCommand::SubmitJudgment { judgment } => {
                    let api = Arc::clone(&api);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        let event = match api.submit_judgment(judgment).await {
                            Ok(ack) => UiEvent::JudgmentAcknowledged { judgment, ack },
                            Err(err) => UiEvent::JudgmentFailed {
                                judgment,
                                error: UiError::from_client_error(
                                    UiErrorContext::SubmitJudgment,
                                    &err,
                                ),
                            },
                        };
                        send_event(&ui_tx, event);
                    });
                }
            }
        }

        debug!("backend command queue closed; worker exiting");
    })
}

/// Never blocks a runtime task; a full widget queue drops the result.
fn send_event(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    match ui_tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!(?event, "widget event queue is full; dropping backend result");
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!("widget event queue closed; dropping backend result");
            false
        }
    }
}
