//! Markup and messages the widget writes into the page.

use askama::Template;
use shared::{domain::Judgment, protocol::ClassificationResponse};

pub const APPROVE_ACKNOWLEDGMENT: &str = "Thanks for feedback, we are happy we get you☺️";
pub const REJECT_ACKNOWLEDGMENT: &str = "Oops, sorry! We'll do better next time🫡";

pub fn acknowledgment(judgment: Judgment) -> &'static str {
    match judgment {
        Judgment::Approve => APPROVE_ACKNOWLEDGMENT,
        Judgment::Reject => REJECT_ACKNOWLEDGMENT,
    }
}

#[derive(Template)]
#[template(
    source = "<h4>Model Analysis: {{ label }}</h4>\
{%- if let Some(app_version) = app_version -%}
<p>App version: {{ app_version }}</p>\
{%- if let Some(model_version) = model_version -%}
<p>Model version: {{ model_version }}</p>\
{%- endif -%}
{%- endif -%}",
    ext = "html"
)]
struct ResultTemplate<'a> {
    label: &'a str,
    app_version: Option<&'a str>,
    model_version: Option<&'a str>,
}

/// Result area content. Passing `app_version` turns on the version lines; the
/// model version line additionally needs the backend to have sent one.
pub fn result_markup(
    result: &ClassificationResponse,
    app_version: Option<&str>,
) -> Result<String, askama::Error> {
    ResultTemplate {
        label: &result.label,
        app_version,
        model_version: result.model_version.as_deref(),
    }
    .render()
}
