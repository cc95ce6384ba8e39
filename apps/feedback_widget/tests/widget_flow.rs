use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use client_core::{ClientError, ClientOptions, FeedbackApi, HttpFeedbackClient};
use crossbeam_channel::{bounded, Sender};
use feedback_widget::{
    backend_bridge::{commands::BackendCommand, runtime},
    controller::events::UiEvent,
    Document, ElementIds, FeedbackWidget, MemoryDocument, WidgetOptions, WidgetPhase,
};
use serde_json::{json, Value};
use shared::{
    domain::{Judgment, SessionId},
    protocol::{ClassificationResponse, JudgmentAck},
};
use tokio::net::TcpListener;

const EVENT_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    cookie: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
    classify_status: StatusCode,
    classify_body: Value,
}

impl Backend {
    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen
            .lock()
            .expect("seen lock")
            .push(Seen { path, cookie, body });
    }
}

async fn user_input(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.record("/userInput", &headers, body);
    (backend.classify_status, Json(backend.classify_body.clone()))
}

async fn judgment(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let received = body.get("isCorrect").cloned().unwrap_or(Value::Null);
    backend.record("/judgment", &headers, body);
    Json(json!({
        "status": "success",
        "message": "Judgment received",
        "receivedJudgment": received,
    }))
}

/// Serves the two routes from a runtime owned by the caller.
fn spawn_backend(rt: &tokio::runtime::Runtime, classify_body: Value) -> (String, Backend) {
    spawn_backend_with_status(rt, StatusCode::OK, classify_body)
}

fn spawn_backend_with_status(
    rt: &tokio::runtime::Runtime,
    classify_status: StatusCode,
    classify_body: Value,
) -> (String, Backend) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let backend = Backend {
        seen: Arc::new(Mutex::new(Vec::new())),
        classify_status,
        classify_body,
    };
    let state = backend.clone();
    let addr = rt.block_on(async move {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new()
            .route("/userInput", post(user_input))
            .route("/judgment", post(judgment))
            .with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    });
    (format!("http://{addr}"), backend)
}

fn server_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime")
}

fn mount_with(
    api: Arc<dyn FeedbackApi>,
    options: WidgetOptions,
) -> (FeedbackWidget<MemoryDocument>, thread::JoinHandle<()>) {
    let ids = ElementIds::default();
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(32);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(32);
    let worker = runtime::launch(api, cmd_rx, ui_tx);
    let widget = FeedbackWidget::mount(
        MemoryDocument::with_elements(&ids),
        ids,
        options,
        cmd_tx,
        ui_rx,
    )
    .expect("mount");
    (widget, worker)
}

/// Applies events until `done` holds, failing after `EVENT_WAIT` without one.
fn wait_for(
    widget: &mut FeedbackWidget<MemoryDocument>,
    mut done: impl FnMut(&UiEvent) -> bool,
) -> UiEvent {
    loop {
        let event = widget
            .events()
            .recv_timeout(EVENT_WAIT)
            .expect("backend event");
        let finished = done(&event);
        widget.apply_event(event.clone());
        if finished {
            return event;
        }
    }
}

fn submit(widget: &mut FeedbackWidget<MemoryDocument>, text: &str) -> bool {
    widget.document_mut().set_value("comment-input", text);
    widget.click("submit-btn")
}

#[test]
fn full_round_trip_against_http_backend() {
    let rt = server_runtime();
    let (server_url, backend) =
        spawn_backend(&rt, json!({ "label": "toxic", "model_version": "1.2" }));
    let client = HttpFeedbackClient::new(
        &server_url,
        ClientOptions {
            include_credentials: true,
            request_timeout: None,
        },
    )
    .expect("client");
    let (mut widget, _worker) = mount_with(
        Arc::new(client),
        WidgetOptions {
            session_correlation: true,
            gate_judgment: true,
            app_version: Some("0.1.0".to_string()),
        },
    );
    let session = widget.session().expect("session");

    assert!(submit(&mut widget, "   you are the worst  "));
    wait_for(&mut widget, |e| {
        matches!(e, UiEvent::ClassificationReceived { .. })
    });

    let html = widget.document().inner_html("result").expect("result").to_string();
    assert!(html.contains("toxic"), "{html}");
    assert!(html.contains("1.2"), "{html}");
    assert_eq!(widget.phase(), WidgetPhase::ClassificationShown);
    assert!(!widget.document().is_disabled("feedback-yes"));

    assert!(widget.click("feedback-yes"));
    assert!(widget.document().is_disabled("feedback-yes"));
    assert!(widget.document().is_disabled("feedback-no"));
    let event = wait_for(&mut widget, |e| {
        matches!(e, UiEvent::JudgmentAcknowledged { .. })
    });
    match event {
        UiEvent::JudgmentAcknowledged { judgment, ack } => {
            assert_eq!(judgment, Judgment::Approve);
            assert_eq!(ack.received_judgment, Some(true));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let seen = backend.seen.lock().expect("seen lock").clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].path, "/userInput");
    assert_eq!(seen[0].body, json!({ "text": "you are the worst" }));
    assert_eq!(seen[1].path, "/judgment");
    assert_eq!(seen[1].body, json!({ "isCorrect": true }));
    let expected_cookie = format!("sessionId={session}");
    for request in &seen {
        assert_eq!(request.cookie.as_deref(), Some(expected_cookie.as_str()));
    }
}

#[test]
fn reject_posts_false_without_cookie_when_uncorrelated() {
    let rt = server_runtime();
    let (server_url, backend) = spawn_backend(&rt, json!({ "label": "Negative" }));
    let client = HttpFeedbackClient::new(&server_url, ClientOptions::default()).expect("client");
    let (mut widget, _worker) = mount_with(
        Arc::new(client),
        WidgetOptions {
            session_correlation: false,
            gate_judgment: false,
            app_version: None,
        },
    );

    assert!(widget.click("feedback-no"));
    wait_for(&mut widget, |e| {
        matches!(e, UiEvent::JudgmentAcknowledged { .. })
    });

    let seen = backend.seen.lock().expect("seen lock").clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].body, json!({ "isCorrect": false }));
    assert_eq!(seen[0].cookie, None);
}

#[test]
fn unreachable_backend_leaves_widget_operable() {
    let rt = server_runtime();
    let addr = rt.block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("addr")
    });
    let client =
        HttpFeedbackClient::new(&format!("http://{addr}"), ClientOptions::default()).expect("client");
    let (mut widget, _worker) = mount_with(
        Arc::new(client),
        WidgetOptions {
            session_correlation: false,
            gate_judgment: false,
            app_version: None,
        },
    );

    assert!(submit(&mut widget, "hello"));
    wait_for(&mut widget, |e| matches!(e, UiEvent::ClassificationFailed { .. }));
    assert_eq!(widget.phase(), WidgetPhase::Idle);
    assert_eq!(widget.document().inner_html("result"), Some(""));

    assert!(widget.click("feedback-yes"));
    wait_for(&mut widget, |e| matches!(e, UiEvent::JudgmentFailed { .. }));

    // Same action again is still accepted.
    assert!(submit(&mut widget, "hello again"));
}

#[test]
fn json_error_reply_renders_empty_label_and_enables_judgment() {
    let rt = server_runtime();
    let (server_url, backend) = spawn_backend_with_status(
        &rt,
        StatusCode::BAD_REQUEST,
        json!({ "error": "Missing 'text' in request body" }),
    );
    let client = HttpFeedbackClient::new(&server_url, ClientOptions::default()).expect("client");
    let (mut widget, _worker) = mount_with(
        Arc::new(client),
        WidgetOptions {
            session_correlation: false,
            gate_judgment: true,
            app_version: None,
        },
    );
    assert!(widget.document().is_disabled("feedback-yes"));

    assert!(submit(&mut widget, "hello"));
    wait_for(&mut widget, |e| {
        matches!(e, UiEvent::ClassificationReceived { .. })
    });

    assert_eq!(
        widget.document().inner_html("result"),
        Some("<h4>Model Analysis: </h4>")
    );
    assert_eq!(widget.phase(), WidgetPhase::ClassificationShown);
    assert!(!widget.document().is_disabled("feedback-yes"));
    assert!(!widget.document().is_disabled("feedback-no"));
    assert_eq!(backend.seen.lock().expect("seen lock").len(), 1);
}

/// Answers from canned values and records what it was asked.
struct ScriptedApi {
    classify_calls: Mutex<Vec<String>>,
    judgments: Mutex<Vec<Judgment>>,
    sessions: Mutex<Vec<SessionId>>,
    label: String,
    release_judgment: Mutex<Option<crossbeam_channel::Receiver<()>>>,
}

impl ScriptedApi {
    fn new(label: &str) -> Self {
        Self {
            classify_calls: Mutex::new(Vec::new()),
            judgments: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            label: label.to_string(),
            release_judgment: Mutex::new(None),
        }
    }

    fn holding_judgments(label: &str) -> (Self, Sender<()>) {
        let (tx, rx) = bounded(1);
        let api = Self::new(label);
        *api.release_judgment.lock().expect("lock") = Some(rx);
        (api, tx)
    }
}

#[async_trait]
impl FeedbackApi for ScriptedApi {
    async fn classify(&self, text: &str) -> Result<ClassificationResponse, ClientError> {
        self.classify_calls
            .lock()
            .expect("lock")
            .push(text.to_string());
        Ok(ClassificationResponse {
            label: self.label.clone(),
            model_version: None,
        })
    }

    async fn submit_judgment(&self, judgment: Judgment) -> Result<JudgmentAck, ClientError> {
        let release = self.release_judgment.lock().expect("lock").take();
        if let Some(release) = release {
            tokio::task::spawn_blocking(move || release.recv_timeout(EVENT_WAIT))
                .await
                .expect("join")
                .expect("released");
        }
        self.judgments.lock().expect("lock").push(judgment);
        Ok(JudgmentAck::default())
    }

    fn install_session(&self, session: SessionId) -> bool {
        self.sessions.lock().expect("lock").push(session);
        true
    }
}

#[test]
fn mount_installs_session_on_backend_client() {
    let api = Arc::new(ScriptedApi::new("Positive"));
    let (mut widget, _worker) = mount_with(api.clone(), WidgetOptions::default());

    let event = wait_for(&mut widget, |e| matches!(e, UiEvent::SessionInstalled { .. }));
    match event {
        UiEvent::SessionInstalled { session, accepted } => {
            assert!(accepted);
            assert_eq!(Some(session), widget.session());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(api.sessions.lock().expect("lock").len(), 1);
}

#[test]
fn blank_input_never_reaches_backend() {
    let api = Arc::new(ScriptedApi::new("Positive"));
    let (mut widget, _worker) = mount_with(
        api.clone(),
        WidgetOptions {
            session_correlation: false,
            gate_judgment: true,
            app_version: None,
        },
    );

    assert!(!submit(&mut widget, "    "));
    assert!(submit(&mut widget, " ok "));
    wait_for(&mut widget, |e| {
        matches!(e, UiEvent::ClassificationReceived { .. })
    });

    assert_eq!(*api.classify_calls.lock().expect("lock"), vec!["ok".to_string()]);
}

#[test]
fn acknowledgment_is_shown_while_judgment_is_pending() {
    let (api, release) = ScriptedApi::holding_judgments("Positive");
    let api = Arc::new(api);
    let (mut widget, _worker) = mount_with(
        api.clone(),
        WidgetOptions {
            session_correlation: false,
            gate_judgment: false,
            app_version: None,
        },
    );

    assert!(widget.click("feedback-yes"));
    assert_eq!(widget.document().alerts().len(), 1);
    assert!(api.judgments.lock().expect("lock").is_empty());

    release.send(()).expect("release");
    wait_for(&mut widget, |e| {
        matches!(e, UiEvent::JudgmentAcknowledged { .. })
    });
    assert_eq!(*api.judgments.lock().expect("lock"), vec![Judgment::Approve]);
}

#[test]
fn draining_waits_for_outstanding_requests() {
    let (api, release) = ScriptedApi::holding_judgments("Positive");
    let api = Arc::new(api);
    let (mut widget, _worker) = mount_with(
        api.clone(),
        WidgetOptions {
            session_correlation: false,
            gate_judgment: false,
            app_version: None,
        },
    );

    assert!(submit(&mut widget, "last words"));
    assert!(widget.click("feedback-no"));
    assert_eq!(widget.pending_requests(), 2);

    release.send(()).expect("release");
    assert!(widget.drain_pending(EVENT_WAIT));

    assert_eq!(widget.pending_requests(), 0);
    assert_eq!(*api.judgments.lock().expect("lock"), vec![Judgment::Reject]);
    assert_eq!(
        widget.document().inner_html("result"),
        Some("<h4>Model Analysis: Positive</h4>")
    );
}
