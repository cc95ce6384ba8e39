use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::ClientOptions;
use serde::Deserialize;

use crate::controller::widget::WidgetOptions;
use crate::document::ElementIds;

pub const DEFAULT_SETTINGS_FILE: &str = "feedback_widget.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub session_correlation: bool,
    pub gate_judgment: bool,
    pub render_versions: bool,
    pub app_version: String,
    pub request_timeout_secs: Option<u64>,
    pub elements: ElementIds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4200".into(),
            session_correlation: true,
            gate_judgment: true,
            render_versions: true,
            app_version: env!("CARGO_PKG_VERSION").into(),
            request_timeout_secs: None,
            elements: ElementIds::default(),
        }
    }
}

/// On-disk shape; every key is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    session_correlation: Option<bool>,
    gate_judgment: Option<bool>,
    render_versions: Option<bool>,
    app_version: Option<String>,
    request_timeout_secs: Option<u64>,
    elements: Option<ElementIds>,
}

impl Settings {
    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            session_correlation: self.session_correlation,
            gate_judgment: self.gate_judgment,
            app_version: self.render_versions.then(|| self.app_version.clone()),
        }
    }

    /// Credentials travel exactly when session correlation is on.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            include_credentials: self.session_correlation,
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }

    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.session_correlation {
            self.session_correlation = v;
        }
        if let Some(v) = file_cfg.gate_judgment {
            self.gate_judgment = v;
        }
        if let Some(v) = file_cfg.render_versions {
            self.render_versions = v;
        }
        if let Some(v) = file_cfg.app_version {
            self.app_version = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = file_cfg.elements {
            self.elements = v;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("FEEDBACK_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("APP__SERVER_URL") {
            self.server_url = v;
        }

        if let Some(v) = var("FEEDBACK_SESSION_CORRELATION").and_then(|v| parse_flag(&v)) {
            self.session_correlation = v;
        }
        if let Some(v) = var("FEEDBACK_GATE_JUDGMENT").and_then(|v| parse_flag(&v)) {
            self.gate_judgment = v;
        }
        if let Some(v) = var("FEEDBACK_RENDER_VERSIONS").and_then(|v| parse_flag(&v)) {
            self.render_versions = v;
        }

        if let Some(v) = var("FEEDBACK_APP_VERSION") {
            self.app_version = v;
        }

        if let Some(v) = var("FEEDBACK_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                self.request_timeout_secs = (parsed > 0).then_some(parsed);
            }
        }
    }
}

/// Defaults, then the settings file, then environment overrides.
///
/// An explicitly given `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: Option<&Path>,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("invalid settings file '{}'", path.display()))?;
            settings.apply_file(file_cfg);
        }
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
        Err(_) => {}
    }

    settings.apply_env(var);
    Ok(settings)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
