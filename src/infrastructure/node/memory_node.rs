//! In-memory node host with JSON serialization

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::ports::NodeWidgets;
use crate::domain::node::{
    ControlKind, WidgetValue, AUDIO_UI_WIDGET, BASE64_DATA_WIDGET, MAX_DURATION_WIDGET, NODE_TYPE,
};
use crate::domain::recorder::DEFAULT_MAX_DURATION_SECS;

/// Change applied to a node, reported to the observer
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    Value { name: String, value: WidgetValue },
    Hidden { name: String },
    ControlAdded { name: String, kind: ControlKind, text: String },
    ControlText { name: String, text: String },
    PreviewSource(String),
    PreviewEmpty(bool),
    SerializeWidgets(bool),
}

/// Observer called after every change
pub type NodeObserver = Arc<dyn Fn(&NodeChange) + Send + Sync>;

/// Serialized form of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(rename = "type")]
    pub node_type: String,
    /// Widget values by name; empty unless widget serialization is enabled
    #[serde(default)]
    pub widgets_values: BTreeMap<String, WidgetValue>,
}

#[derive(Debug, Clone)]
struct Control {
    kind: ControlKind,
    text: String,
}

#[derive(Debug, Clone)]
struct Preview {
    source: Option<String>,
    empty: bool,
}

/// Node host keeping widgets in memory.
///
/// Starts with the recorder node's declared inputs: an empty
/// `base64_data` text, `record_duration_max` = 10 and an empty `audioUI`
/// preview.
pub struct MemoryNode {
    values: BTreeMap<String, WidgetValue>,
    hidden: Vec<String>,
    controls: BTreeMap<String, Control>,
    preview: Preview,
    serialize_widgets: bool,
    observer: Option<NodeObserver>,
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryNode")
            .field("values", &self.values)
            .field("hidden", &self.hidden)
            .field("controls", &self.controls)
            .field("preview", &self.preview)
            .field("serialize_widgets", &self.serialize_widgets)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl MemoryNode {
    /// Create a node with default input values
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert(BASE64_DATA_WIDGET.to_string(), WidgetValue::Text(String::new()));
        values.insert(
            MAX_DURATION_WIDGET.to_string(),
            WidgetValue::Number(DEFAULT_MAX_DURATION_SECS as f64),
        );

        Self {
            values,
            hidden: Vec::new(),
            controls: BTreeMap::new(),
            preview: Preview {
                source: None,
                empty: true,
            },
            serialize_widgets: false,
            observer: None,
        }
    }

    /// Set the maximum duration input
    pub fn with_max_duration(mut self, secs: u32) -> Self {
        self.values
            .insert(MAX_DURATION_WIDGET.to_string(), WidgetValue::Number(secs as f64));
        self
    }

    /// Remove a widget entirely, as if the host never declared it
    pub fn without_widget(mut self, name: &str) -> Self {
        self.values.remove(name);
        self
    }

    /// Attach an observer notified after every change
    pub fn with_observer(mut self, observer: NodeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Restore a node from its serialized snapshot
    pub fn from_snapshot(snapshot: NodeSnapshot) -> Self {
        let mut node = Self::new();
        for (name, value) in snapshot.widgets_values {
            if name == AUDIO_UI_WIDGET {
                if let Some(source) = value.as_text().filter(|s| !s.is_empty()) {
                    node.preview = Preview {
                        source: Some(source.to_string()),
                        empty: false,
                    };
                }
            } else {
                node.values.insert(name, value);
            }
        }
        node
    }

    /// Parse a node from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }

    /// Serialized form of the node. Widget values are only included once
    /// widget serialization has been enabled.
    pub fn snapshot(&self) -> NodeSnapshot {
        let mut widgets_values = BTreeMap::new();
        if self.serialize_widgets {
            widgets_values = self.values.clone();
            if let Some(source) = &self.preview.source {
                widgets_values.insert(AUDIO_UI_WIDGET.to_string(), WidgetValue::Text(source.clone()));
            }
        }

        NodeSnapshot {
            node_type: NODE_TYPE.to_string(),
            widgets_values,
        }
    }

    /// Serialize the node to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    /// Text of a custom control
    pub fn control_text(&self, name: &str) -> Option<&str> {
        self.controls.get(name).map(|c| c.text.as_str())
    }

    /// Kind of a custom control
    pub fn control_kind(&self, name: &str) -> Option<ControlKind> {
        self.controls.get(name).map(|c| c.kind)
    }

    /// Check if a widget is hidden
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.iter().any(|h| h == name)
    }

    /// Source of the preview element
    pub fn preview_source(&self) -> Option<&str> {
        self.preview.source.as_deref()
    }

    /// Check if the preview carries the empty marker
    pub fn preview_is_empty(&self) -> bool {
        self.preview.empty
    }

    /// Check if widget values are serialized
    pub fn serializes_widgets(&self) -> bool {
        self.serialize_widgets
    }

    fn notify(&self, change: NodeChange) {
        if let Some(observer) = &self.observer {
            observer(&change);
        }
    }
}

impl Default for MemoryNode {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeWidgets for MemoryNode {
    fn widget_value(&self, name: &str) -> Option<WidgetValue> {
        self.values.get(name).cloned()
    }

    fn set_widget_value(&mut self, name: &str, value: WidgetValue) {
        self.values.insert(name.to_string(), value.clone());
        self.notify(NodeChange::Value {
            name: name.to_string(),
            value,
        });
    }

    fn hide_widget(&mut self, name: &str) {
        if !self.is_hidden(name) {
            self.hidden.push(name.to_string());
        }
        self.notify(NodeChange::Hidden {
            name: name.to_string(),
        });
    }

    fn add_control(&mut self, name: &str, kind: ControlKind, text: &str) {
        self.controls.insert(
            name.to_string(),
            Control {
                kind,
                text: text.to_string(),
            },
        );
        self.notify(NodeChange::ControlAdded {
            name: name.to_string(),
            kind,
            text: text.to_string(),
        });
    }

    fn set_control_text(&mut self, name: &str, text: &str) {
        let Some(control) = self.controls.get_mut(name) else {
            tracing::debug!(control = name, "Ignoring text for unknown control");
            return;
        };
        control.text = text.to_string();
        self.notify(NodeChange::ControlText {
            name: name.to_string(),
            text: text.to_string(),
        });
    }

    fn set_preview_source(&mut self, source: &str) {
        self.preview.source = Some(source.to_string());
        self.notify(NodeChange::PreviewSource(source.to_string()));
    }

    fn set_preview_empty(&mut self, empty: bool) {
        self.preview.empty = empty;
        self.notify(NodeChange::PreviewEmpty(empty));
    }

    fn set_serialize_widgets(&mut self, enabled: bool) {
        self.serialize_widgets = enabled;
        self.notify(NodeChange::SerializeWidgets(enabled));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn debug_shows_values_and_observer_presence() {
        let node = MemoryNode::new().with_observer(Arc::new(|_: &NodeChange| {}));

        let debug = format!("{:?}", node);
        assert!(debug.starts_with("MemoryNode"));
        assert!(debug.contains(BASE64_DATA_WIDGET));
        assert!(debug.contains("observed: true"));
    }

    #[test]
    fn new_node_has_declared_inputs() {
        let node = MemoryNode::new();
        assert_eq!(
            node.widget_value(BASE64_DATA_WIDGET),
            Some(WidgetValue::Text(String::new()))
        );
        assert_eq!(
            node.widget_value(MAX_DURATION_WIDGET),
            Some(WidgetValue::Number(10.0))
        );
        assert!(node.preview_is_empty());
        assert!(node.preview_source().is_none());
    }

    #[test]
    fn snapshot_omits_values_until_serialization_enabled() {
        let mut node = MemoryNode::new();
        assert!(node.snapshot().widgets_values.is_empty());

        node.set_serialize_widgets(true);
        let snapshot = node.snapshot();
        assert_eq!(snapshot.node_type, NODE_TYPE);
        assert!(snapshot.widgets_values.contains_key(BASE64_DATA_WIDGET));
    }

    #[test]
    fn json_round_trip_keeps_payload_and_preview() {
        let mut node = MemoryNode::new().with_max_duration(30);
        node.set_serialize_widgets(true);
        node.set_widget_value(BASE64_DATA_WIDGET, WidgetValue::Text("AQID".into()));
        node.set_preview_source("data:audio/webm;base64,AQID");
        node.set_preview_empty(false);

        let restored = MemoryNode::from_json(&node.to_json().unwrap()).unwrap();
        assert_eq!(
            restored.widget_value(BASE64_DATA_WIDGET),
            Some(WidgetValue::Text("AQID".into()))
        );
        assert_eq!(
            restored.widget_value(MAX_DURATION_WIDGET),
            Some(WidgetValue::Number(30.0))
        );
        assert_eq!(restored.preview_source(), Some("data:audio/webm;base64,AQID"));
        assert!(!restored.preview_is_empty());
    }

    #[test]
    fn unknown_control_text_is_ignored() {
        let mut node = MemoryNode::new();
        node.set_control_text("missing", "text");
        assert!(node.control_text("missing").is_none());
    }

    #[test]
    fn observer_sees_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut node = MemoryNode::new().with_observer(Arc::new(move |change: &NodeChange| {
            sink.lock().unwrap().push(change.clone());
        }));

        node.add_control("button", ControlKind::Button, "START");
        node.set_control_text("button", "STOP");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            NodeChange::ControlText {
                name: "button".into(),
                text: "STOP".into()
            }
        );
        assert_eq!(node.control_text("button"), Some("STOP"));
        assert_eq!(node.control_kind("button"), Some(ControlKind::Button));
    }

    #[test]
    fn without_widget_removes_input() {
        let node = MemoryNode::new().without_widget(MAX_DURATION_WIDGET);
        assert!(node.widget_value(MAX_DURATION_WIDGET).is_none());
    }
}
