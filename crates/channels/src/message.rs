use std::path::{Path, PathBuf};

/// One piece of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Image stored on the local filesystem.
    Image(PathBuf),
    /// Video stored on the local filesystem.
    Video(PathBuf),
}

/// Ordered segments built once per notification and reused for every
/// destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedMessage {
    segments: Vec<Segment>,
}

impl ComposedMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut msg = Self::new();
        msg.push_text(text);
        msg
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.segments.push(Segment::Text(text.into()));
    }

    pub fn push_image(&mut self, path: impl AsRef<Path>) {
        self.segments.push(Segment::Image(path.as_ref().to_path_buf()));
    }

    pub fn push_video(&mut self, path: impl AsRef<Path>) {
        self.segments.push(Segment::Video(path.as_ref().to_path_buf()));
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenated text segments, for logs and error reports.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Image(_) | Segment::Video(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_keep_insertion_order() {
        let mut msg = ComposedMessage::text("hello");
        msg.push_image("/tmp/a.png");
        msg.push_text("Attachment: https://x/y.pdf");
        assert_eq!(msg.segments(), &[
            Segment::Text("hello".into()),
            Segment::Image(PathBuf::from("/tmp/a.png")),
            Segment::Text("Attachment: https://x/y.pdf".into()),
        ]);
        assert_eq!(msg.plain_text(), "hello\nAttachment: https://x/y.pdf");
    }

    #[test]
    fn new_message_is_empty() {
        let msg = ComposedMessage::new();
        assert!(msg.is_empty());
        assert_eq!(msg.plain_text(), "");
    }
}
