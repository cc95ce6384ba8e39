//! Page abstraction the widget is mounted on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The slice of a page the widget reads from and writes to.
///
/// Lookups are by element id; an unknown id is a no-op for setters.
pub trait Document {
    fn contains(&self, id: &str) -> bool;
    fn value(&self, id: &str) -> Option<String>;
    fn set_inner_html(&mut self, id: &str, html: &str);
    fn set_disabled(&mut self, id: &str, disabled: bool);
    fn is_disabled(&self, id: &str) -> bool;
    /// Blocking user-facing acknowledgment.
    fn alert(&mut self, message: &str);
    fn set_cookie(&mut self, cookie: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub input: String,
    pub submit: String,
    pub approve: String,
    pub reject: String,
    pub result: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            input: "comment-input".into(),
            submit: "submit-btn".into(),
            approve: "feedback-yes".into(),
            reject: "feedback-no".into(),
            result: "result".into(),
        }
    }
}

impl ElementIds {
    pub fn all(&self) -> [&str; 5] {
        [
            self.input.as_str(),
            self.submit.as_str(),
            self.approve.as_str(),
            self.reject.as_str(),
            self.result.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryElement {
    pub value: String,
    pub inner_html: String,
    pub disabled: bool,
}

/// In-process document used by the terminal front-end and tests.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: HashMap<String, MemoryElement>,
    alerts: Vec<String>,
    cookies: Vec<String>,
}

impl MemoryDocument {
    pub fn with_elements(ids: &ElementIds) -> Self {
        let mut document = Self::default();
        for id in ids.all() {
            document.insert(id);
        }
        document
    }

    pub fn insert(&mut self, id: &str) {
        self.elements.entry(id.to_string()).or_default();
    }

    pub fn remove(&mut self, id: &str) -> Option<MemoryElement> {
        self.elements.remove(id)
    }

    pub fn element(&self, id: &str) -> Option<&MemoryElement> {
        self.elements.get(id)
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) {
        if let Some(element) = self.elements.get_mut(id) {
            element.value = value.into();
        }
    }

    pub fn inner_html(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.inner_html.as_str())
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Most recently written cookie.
    pub fn cookie(&self) -> Option<&str> {
        self.cookies.last().map(String::as_str)
    }
}

impl Document for MemoryDocument {
    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn value(&self, id: &str) -> Option<String> {
        self.elements.get(id).map(|e| e.value.clone())
    }

    fn set_inner_html(&mut self, id: &str, html: &str) {
        if let Some(element) = self.elements.get_mut(id) {
            element.inner_html = html.to_string();
        }
    }

    fn set_disabled(&mut self, id: &str, disabled: bool) {
        if let Some(element) = self.elements.get_mut(id) {
            element.disabled = disabled;
        }
    }

    fn is_disabled(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.disabled)
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn set_cookie(&mut self, cookie: &str) {
        self.cookies.push(cookie.to_string());
    }
}
