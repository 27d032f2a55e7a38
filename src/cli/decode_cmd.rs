//! Decode command handler

use std::path::{Path, PathBuf};

use crate::application::ports::NodeWidgets;
use crate::domain::node::BASE64_DATA_WIDGET;
use crate::domain::payload::{AudioMimeType, Payload};
use crate::infrastructure::MemoryNode;

use super::app::{load_node, RunError};
use super::presenter::Presenter;

/// Base name of the decoded file when no output is given
const DEFAULT_OUTPUT_STEM: &str = "recording";

/// Write the audio stored in a saved node to disk
pub async fn handle_decode_command(
    node_path: &Path,
    output: Option<PathBuf>,
    presenter: &Presenter,
) -> Result<PathBuf, RunError> {
    let node = load_node(Some(node_path)).await?;
    let payload = node_payload(&node)?;
    let audio = payload.decode()?;

    let path = output.unwrap_or_else(|| default_output(payload.mime_type()));
    tokio::fs::write(&path, &audio)
        .await
        .map_err(|source| RunError::Write {
            path: path.clone(),
            source,
        })?;

    presenter.success(&format!(
        "Wrote {} ({}) to {}",
        payload.mime_type(),
        payload.human_readable_size(),
        path.display()
    ));
    Ok(path)
}

/// Payload stored in the node's `base64_data` input.
///
/// The container type comes from the preview data URI when one was saved.
pub fn node_payload(node: &MemoryNode) -> Result<Payload, RunError> {
    let base64 = node
        .widget_value(BASE64_DATA_WIDGET)
        .and_then(|v| v.as_text().map(str::to_string))
        .filter(|s| !s.is_empty())
        .ok_or(RunError::NoPayload)?;

    let mime_type = node
        .preview_source()
        .and_then(|uri| Payload::from_data_uri(uri).ok())
        .map(|preview| preview.mime_type())
        .unwrap_or_default();

    Ok(Payload::from_base64(base64, mime_type)?)
}

fn default_output(mime_type: AudioMimeType) -> PathBuf {
    PathBuf::from(format!("{}.{}", DEFAULT_OUTPUT_STEM, mime_type.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::WidgetValue;

    #[test]
    fn payload_defaults_to_webm() {
        let mut node = MemoryNode::new();
        node.set_widget_value(BASE64_DATA_WIDGET, WidgetValue::Text("AQIDBA==".into()));

        let payload = node_payload(&node).unwrap();
        assert_eq!(payload.mime_type(), AudioMimeType::Webm);
        assert_eq!(payload.decode().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn payload_takes_mime_from_preview() {
        let mut node = MemoryNode::new();
        node.set_widget_value(BASE64_DATA_WIDGET, WidgetValue::Text("AQIDBA==".into()));
        node.set_preview_source("data:audio/flac;base64,AQIDBA==");

        assert_eq!(node_payload(&node).unwrap().mime_type(), AudioMimeType::Flac);
    }

    #[test]
    fn empty_node_has_no_payload() {
        let node = MemoryNode::new();
        assert!(matches!(node_payload(&node), Err(RunError::NoPayload)));
    }

    #[test]
    fn invalid_base64_is_reported() {
        let mut node = MemoryNode::new();
        node.set_widget_value(BASE64_DATA_WIDGET, WidgetValue::Text("not base64!".into()));
        assert!(matches!(node_payload(&node), Err(RunError::Payload(_))));
    }

    #[test]
    fn default_output_uses_extension() {
        assert_eq!(default_output(AudioMimeType::Flac), PathBuf::from("recording.flac"));
        assert_eq!(default_output(AudioMimeType::Webm), PathBuf::from("recording.webm"));
    }

    #[tokio::test]
    async fn decode_writes_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let node_path = dir.path().join("node.json");
        std::fs::write(
            &node_path,
            r#"{"type":"AudioRecorderNode","widgets_values":{"base64_data":"AQIDBA==","audioUI":"data:audio/ogg;base64,AQIDBA=="}}"#,
        )
        .unwrap();
        let out = dir.path().join("clip.ogg");

        let written = handle_decode_command(&node_path, Some(out.clone()), &Presenter::new())
            .await
            .unwrap();
        assert_eq!(written, out);
        assert_eq!(std::fs::read(&out).unwrap(), vec![1, 2, 3, 4]);
    }
}
