//! Controller layer: UI events, widget state transitions, and command orchestration.

pub mod events;
pub mod orchestration;
pub mod render;
pub mod widget;
