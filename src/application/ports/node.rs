//! Host node port interface

use crate::domain::node::{ControlKind, WidgetValue};

/// Port for the node instance a recorder is attached to.
///
/// Widgets are addressed by field name. The host owns rendering; the
/// recorder only reads and writes values through this trait.
pub trait NodeWidgets: Send + 'static {
    /// Current value of a named widget
    fn widget_value(&self, name: &str) -> Option<WidgetValue>;

    /// Write a named widget value
    fn set_widget_value(&mut self, name: &str, value: WidgetValue);

    /// Hide a widget from the node body
    fn hide_widget(&mut self, name: &str);

    /// Insert a custom control with its initial text
    fn add_control(&mut self, name: &str, kind: ControlKind, text: &str);

    /// Replace the visible text of a custom control
    fn set_control_text(&mut self, name: &str, text: &str);

    /// Set the source of the playable preview element
    fn set_preview_source(&mut self, source: &str);

    /// Toggle the preview's "empty" visual marker
    fn set_preview_empty(&mut self, empty: bool);

    /// Include widget values whenever the enclosing graph is serialized
    fn set_serialize_widgets(&mut self, enabled: bool);
}
