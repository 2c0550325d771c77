use {
    ntfy_relay_channels::ComposedMessage,
    ntfy_relay_media::{HostRewriter, MediaFetcher},
    regex::Regex,
    tracing::{debug, warn},
};

use crate::{
    error::Result,
    event::{Attachment, NotificationEvent},
};

/// Whitespace-only text, or ntfy's auto-generated "A photo was shared with
/// you" body for attachment-only notifications.
const SHARE_NOTICE_PATTERN: &str = r"^(?:\s*|An? \w+ was shared with you\n?)$";

/// Turns a notification into the message delivered to every destination.
pub struct MessageTransformer {
    share_notice: Regex,
    rewriter: HostRewriter,
    fetcher: MediaFetcher,
}

impl MessageTransformer {
    pub fn new(rewriter: HostRewriter, fetcher: MediaFetcher) -> Result<Self> {
        Ok(Self {
            share_notice: Regex::new(SHARE_NOTICE_PATTERN)?,
            rewriter,
            fetcher,
        })
    }

    /// `true` when `text` should not be forwarded at all.
    pub fn is_placeholder(&self, text: &str) -> bool {
        self.share_notice.is_match(text)
    }

    /// Build the outgoing message. Never fails: a failed download degrades
    /// to a text link, and the result may be empty.
    pub async fn transform(&self, event: &NotificationEvent) -> ComposedMessage {
        let mut message = ComposedMessage::new();

        if let Some(text) = event.text.as_deref()
            && !self.is_placeholder(text)
        {
            message.push_text(text);
        }

        if let Some(attachment) = &event.attachment {
            self.attach(attachment, &mut message).await;
        }

        message
    }

    async fn attach(&self, attachment: &Attachment, message: &mut ComposedMessage) {
        let Some(url) = attachment.url.as_deref().filter(|u| !u.is_empty()) else {
            return;
        };

        if !attachment.is_media() {
            message.push_text(format!("Attachment: {url}"));
            return;
        }

        let url = self.rewriter.rewrite(url);
        match self.fetcher.fetch(&url).await {
            Ok(path) if attachment.mime_type.starts_with("image/") => message.push_image(path),
            Ok(path) => message.push_video(path),
            Err(e) => {
                warn!(url = %url, error = %e, "failed to download attachment, sending link");
                message.push_text(format!("Attachment: {url}"));
            },
        }
        debug!(segments = message.segments().len(), "attachment processed");
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        ntfy_relay_channels::Segment,
        ntfy_relay_media::MediaCache,
        rstest::rstest,
        std::sync::Arc,
    };

    fn transformer(rewriter: HostRewriter) -> MessageTransformer {
        let cache = Arc::new(MediaCache::temporary().unwrap());
        let fetcher = MediaFetcher::new(reqwest::Client::new(), cache);
        MessageTransformer::new(rewriter, fetcher).unwrap()
    }

    fn media_event(url: String, mime: &str) -> NotificationEvent {
        NotificationEvent {
            text: None,
            attachment: Some(Attachment {
                url: Some(url),
                mime_type: mime.into(),
            }),
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    #[case("A photo was shared with you")]
    #[case("An image was shared with you")]
    #[case("A file was shared with you\n")]
    fn placeholder_text_is_suppressed(#[case] text: &str) {
        let t = transformer(HostRewriter::default());
        assert!(t.is_placeholder(text));
    }

    #[rstest]
    #[case("hello")]
    #[case("A photo was shared with you and me")]
    #[case("Two photos were shared with you")]
    #[case(" A photo was shared with you")]
    fn real_text_is_kept(#[case] text: &str) {
        let t = transformer(HostRewriter::default());
        assert!(!t.is_placeholder(text));
    }

    #[tokio::test]
    async fn text_only_event() {
        let t = transformer(HostRewriter::default());
        let msg = t.transform(&NotificationEvent::text("hello")).await;
        assert_eq!(msg, ComposedMessage::text("hello"));
    }

    #[tokio::test]
    async fn share_notice_without_attachment_is_empty() {
        let t = transformer(HostRewriter::default());
        let msg = t
            .transform(&NotificationEvent::text("A photo was shared with you"))
            .await;
        assert!(msg.is_empty());
    }

    #[tokio::test]
    async fn non_media_attachment_becomes_link_without_download() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let t = transformer(HostRewriter::default());
        let url = format!("{}/report.pdf", server.url());
        let msg = t
            .transform(&NotificationEvent {
                text: Some("monthly report".into()),
                ..media_event(url.clone(), "application/pdf")
            })
            .await;

        assert_eq!(msg.segments(), &[
            Segment::Text("monthly report".into()),
            Segment::Text(format!("Attachment: {url}")),
        ]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn image_is_fetched_through_rewritten_host() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/x.png")
            .with_status(200)
            .with_body("png-bytes")
            .create_async()
            .await;

        let t = transformer(HostRewriter::new([(
            "https://blocked.cdn".to_string(),
            server.url(),
        )]));
        let msg = t
            .transform(&media_event("https://blocked.cdn/x.png".into(), "image/png"))
            .await;

        let [Segment::Image(path)] = msg.segments() else {
            panic!("expected a single image segment, got {msg:?}");
        };
        assert!(path.ends_with("x.png"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "png-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn video_mime_yields_video_segment() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/clip.mp4")
            .with_body("mp4")
            .create_async()
            .await;

        let t = transformer(HostRewriter::default());
        let msg = t
            .transform(&media_event(format!("{}/clip.mp4", server.url()), "video/mp4"))
            .await;
        assert!(matches!(msg.segments(), [Segment::Video(_)]));
    }

    #[tokio::test]
    async fn failed_download_degrades_to_rewritten_link() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/x.png")
            .with_status(502)
            .create_async()
            .await;

        let t = transformer(HostRewriter::new([(
            "https://blocked.cdn".to_string(),
            server.url(),
        )]));
        let msg = t
            .transform(&media_event("https://blocked.cdn/x.png".into(), "image/png"))
            .await;

        assert_eq!(
            msg,
            ComposedMessage::text(format!("Attachment: {}/x.png", server.url()))
        );
    }

    #[tokio::test]
    async fn attachment_without_url_is_ignored() {
        let t = transformer(HostRewriter::default());
        let msg = t
            .transform(&NotificationEvent {
                text: Some("hi".into()),
                attachment: Some(Attachment::default()),
            })
            .await;
        assert_eq!(msg, ComposedMessage::text("hi"));
    }
}
