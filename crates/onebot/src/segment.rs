//! Message segment wire format.
//!
//! OneBot v11 messages are arrays of `{"type": ..., "data": {...}}` objects.
//! Local media is referenced by absolute `file://` URI.

use std::path::Path;

use {
    ntfy_relay_channels::{ComposedMessage, Error, Result, Segment},
    serde::Serialize,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum WireSegment<'a> {
    Text { text: &'a str },
    Image { file: String },
    Video { file: String },
}

/// Encode every segment of `message`, in order.
pub fn encode(message: &ComposedMessage) -> Result<Vec<WireSegment<'_>>> {
    let mut encoded = Vec::with_capacity(message.segments().len());
    for segment in message.segments() {
        encoded.push(match segment {
            Segment::Text(text) => WireSegment::Text {
                text: text.as_str(),
            },
            Segment::Image(path) => WireSegment::Image {
                file: file_uri(path)?,
            },
            Segment::Video(path) => WireSegment::Video {
                file: file_uri(path)?,
            },
        });
    }
    Ok(encoded)
}

fn file_uri(path: &Path) -> Result<String> {
    url::Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| {
            Error::unavailable(format!(
                "media path is not absolute: {}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn encodes_mixed_message_in_order() {
        let mut message = ComposedMessage::text("disk full");
        message.push_image("/tmp/cache/graph.png");
        message.push_video("/tmp/cache/clip.mp4");

        let encoded = serde_json::to_value(encode(&message).unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!([
                { "type": "text", "data": { "text": "disk full" } },
                { "type": "image", "data": { "file": "file:///tmp/cache/graph.png" } },
                { "type": "video", "data": { "file": "file:///tmp/cache/clip.mp4" } },
            ])
        );
    }

    #[test]
    fn relative_media_path_is_rejected() {
        let mut message = ComposedMessage::new();
        message.push_image("graph.png");
        assert!(encode(&message).is_err());
    }

    #[test]
    fn empty_message_encodes_to_empty_array() {
        let message = ComposedMessage::new();
        let encoded = encode(&message).unwrap();
        assert!(encoded.is_empty());
    }
}
