//! Feedback widget: binds page controls to the classification and judgment
//! endpoints and reflects backend responses back into the page.

pub mod backend_bridge;
pub mod config;
pub mod controller;
pub mod document;

pub use controller::widget::{FeedbackWidget, WidgetOptions, WidgetPhase};
pub use document::{Document, ElementIds, MemoryDocument};
