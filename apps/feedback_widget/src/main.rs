use std::{io::BufRead, path::PathBuf, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::HttpFeedbackClient;
use crossbeam_channel::{bounded, select, Receiver};
use feedback_widget::{
    backend_bridge::{commands::BackendCommand, runtime},
    config::load_settings,
    controller::events::UiEvent,
    FeedbackWidget, MemoryDocument,
};
use tracing_subscriber::EnvFilter;

/// How long piped input waits for outstanding requests after stdin closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(about = "Terminal front-end for the classification feedback widget")]
struct Args {
    /// Backend origin serving /userInput and /judgment.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file; defaults to ./feedback_widget.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Do not issue a session cookie.
    #[arg(long)]
    no_session: bool,
    /// Leave judgment controls enabled before a classification arrives.
    #[arg(long)]
    no_gating: bool,
}

enum Input {
    Line(String),
    Closed,
}

fn spawn_stdin_reader() -> Receiver<Input> {
    let (tx, rx) = bounded(64);
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    tracing::warn!("stdin read failed: {err}");
                    break;
                }
            }
        }
        let _ = tx.send(Input::Closed);
    });
    rx
}

fn print_changes(widget: &mut FeedbackWidget<MemoryDocument>, last_result: &mut String) {
    for alert in widget.document_mut().take_alerts() {
        println!("[alert] {alert}");
    }
    let result_id = widget.ids().result.clone();
    let result = widget
        .document()
        .inner_html(&result_id)
        .unwrap_or_default()
        .to_string();
    if result != *last_result {
        println!("[result] {result}");
        *last_result = result;
    }
    if !widget.status().is_empty() {
        println!("[status] {}", widget.status());
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if args.no_session {
        settings.session_correlation = false;
    }
    if args.no_gating {
        settings.gate_judgment = false;
    }

    let client = HttpFeedbackClient::new(&settings.server_url, settings.client_options())
        .with_context(|| format!("failed to create backend client for {}", settings.server_url))?;

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    let worker = runtime::launch(Arc::new(client), cmd_rx, ui_tx);

    let ids = settings.elements.clone();
    let document = MemoryDocument::with_elements(&ids);
    let mut widget = FeedbackWidget::mount(
        document,
        ids.clone(),
        settings.widget_options(),
        cmd_tx,
        ui_rx,
    )
    .context("feedback widget could not bind to its controls")?;

    println!(
        "Connected to {}. Type a comment to classify; :yes / :no to judge; :quit to exit.",
        settings.server_url
    );

    let input_rx = spawn_stdin_reader();
    let events = widget.events().clone();
    let mut last_result = String::new();

    loop {
        select! {
            recv(input_rx) -> input => match input {
                Ok(Input::Line(line)) => match line.trim() {
                    ":quit" | ":q" => break,
                    ":yes" => {
                        if !widget.click(&ids.approve) {
                            println!("[info] approve is disabled");
                        }
                    }
                    ":no" => {
                        if !widget.click(&ids.reject) {
                            println!("[info] reject is disabled");
                        }
                    }
                    _ => {
                        widget.document_mut().set_value(&ids.input, line.as_str());
                        widget.click(&ids.submit);
                    }
                },
                Ok(Input::Closed) | Err(_) => {
                    widget.drain_pending(DRAIN_TIMEOUT);
                    print_changes(&mut widget, &mut last_result);
                    break;
                }
            },
            recv(events) -> event => match event {
                Ok(event) => widget.apply_event(event),
                Err(_) => break,
            },
        }
        widget.pump_events();
        print_changes(&mut widget, &mut last_result);
    }

    drop(events);
    drop(widget);
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    Ok(())
}
