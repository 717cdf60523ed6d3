//! Gateway chat messages.
//!
//! Messages arrive in the OpenAI-style gateway shape:
//! `{"role": "user", "content": "hi"}` or
//! `{"role": "user", "content": [{"type": "text", "text": "hi"},
//! {"type": "image_url", "image_url": {"url": "data:image/png;base64,..."}}]}`.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an image's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:<media type>;base64,<payload>` URI.
    Base64 { media_type: String, data: String },
    /// Remote URL; size is unknown until fetched.
    Url { url: String },
}

impl ImageSource {
    /// Classify an `image_url.url` value.
    pub fn parse(url: &str) -> Result<Self, LlmError> {
        let Some(rest) = url.strip_prefix("data:") else {
            return Ok(Self::Url {
                url: url.to_string(),
            });
        };
        let (header, data) = rest.split_once(',').ok_or_else(|| {
            LlmError::invalid_input("data URI is missing the ',' payload separator")
        })?;
        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().trim();
        if media_type.is_empty() {
            return Err(LlmError::invalid_input("data URI has no media type"));
        }
        if !media_type.to_ascii_lowercase().starts_with("image/") {
            return Err(LlmError::invalid_input(format!(
                "data URI media type {media_type} is not an image"
            )));
        }
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(LlmError::invalid_input("data URI payload must be base64"));
        }
        Ok(Self::Base64 {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Rebuild the gateway `url` value.
    pub fn to_url(&self) -> String {
        match self {
            Self::Base64 { media_type, data } => format!("data:{media_type};base64,{data}"),
            Self::Url { url } => url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireContentPart", into = "WireContentPart")]
pub enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: &str) -> Result<Self, LlmError> {
        Ok(Self::Image {
            source: ImageSource::parse(url)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireImageUrl {
    url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContentPart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

impl TryFrom<WireContentPart> for ContentPart {
    type Error = LlmError;

    fn try_from(part: WireContentPart) -> Result<Self, Self::Error> {
        match part {
            WireContentPart::Text { text } => Ok(Self::Text { text }),
            WireContentPart::ImageUrl { image_url } => Self::image_url(&image_url.url),
        }
    }
}

impl From<ContentPart> for WireContentPart {
    fn from(part: ContentPart) -> Self {
        match part {
            ContentPart::Text { text } => Self::Text { text },
            ContentPart::Image { source } => Self::ImageUrl {
                image_url: WireImageUrl {
                    url: source.to_url(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl MessageContent {
    /// All text of the message; parts are joined with newlines, images skipped.
    pub fn text(&self) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn image_count(&self) -> usize {
        match self {
            Self::Text(_) => 0,
            Self::Parts(parts) => parts
                .iter()
                .filter(|p| matches!(p, ContentPart::Image { .. }))
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: MessageContent) -> Self {
        Self { role, content }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, MessageContent::Text(text.into()))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, MessageContent::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, MessageContent::Text(text.into()))
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::new(MessageRole::User, MessageContent::Parts(parts))
    }

    /// Parse a gateway message array. Unknown roles and malformed parts are
    /// validation errors.
    pub fn parse_list(value: serde_json::Value) -> Result<Vec<Self>, LlmError> {
        serde_json::from_value(value)
            .map_err(|e| LlmError::invalid_input(format!("invalid messages: {e}")))
    }
}

/// Take the first system message out of `messages`.
///
/// Later system messages stay in place; callers decide whether the vendor can
/// accept them.
pub fn pop_system_message(messages: &[ChatMessage]) -> (Option<String>, Vec<ChatMessage>) {
    let mut system = None;
    let mut rest = Vec::with_capacity(messages.len());
    for message in messages {
        if system.is_none() && message.role == MessageRole::System {
            system = Some(message.content.text());
        } else {
            rest.push(message.clone());
        }
    }
    (system, rest)
}

/// Text of the last user turn.
pub fn last_user_message(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_and_multimodal_messages() {
        let messages = ChatMessage::parse_list(json!([
            {"role": "system", "content": "be brief"},
            {"role": "user", "content": [
                {"type": "text", "text": "what is this?"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBORw0KGgo="}},
                {"type": "image_url", "image_url": {"url": "https://example.com/cat.jpg"}}
            ]}
        ]))
        .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, MessageContent::Text("be brief".into()));
        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("expected parts");
        };
        assert_eq!(parts[0], ContentPart::text("what is this?"));
        assert_eq!(
            parts[1],
            ContentPart::Image {
                source: ImageSource::Base64 {
                    media_type: "image/png".into(),
                    data: "iVBORw0KGgo=".into(),
                }
            }
        );
        assert_eq!(
            parts[2],
            ContentPart::Image {
                source: ImageSource::Url {
                    url: "https://example.com/cat.jpg".into()
                }
            }
        );
    }

    #[test]
    fn unknown_role_is_invalid_input() {
        let err = ChatMessage::parse_list(json!([{"role": "tool", "content": "x"}])).unwrap_err();
        assert!(matches!(err, LlmError::InvalidInput(_)));
    }

    #[test]
    fn missing_content_defaults_to_empty_text() {
        let messages = ChatMessage::parse_list(json!([{"role": "user"}])).unwrap();
        assert_eq!(messages[0].content.text(), "");
    }

    #[test]
    fn data_uri_without_separator_is_rejected() {
        assert!(ImageSource::parse("data:image/png;base64").is_err());
        assert!(ImageSource::parse("data:;base64,AAAA").is_err());
    }

    #[test]
    fn data_uri_must_be_a_base64_image() {
        for uri in [
            "data:text/plain;base64,aGVsbG8=",
            "data:application/pdf;base64,JVBERi0=",
            "data:image/png,raw-bytes",
            "data:image/svg+xml;utf8,<svg/>",
        ] {
            let err = ImageSource::parse(uri).unwrap_err();
            assert!(matches!(err, LlmError::InvalidInput(_)), "{uri}");
        }
        assert_eq!(
            ImageSource::parse("data:image/webp;charset=binary;base64,UklGRg==").unwrap(),
            ImageSource::Base64 {
                media_type: "image/webp".into(),
                data: "UklGRg==".into(),
            }
        );
    }

    #[test]
    fn content_part_serializes_back_to_gateway_shape() {
        let part = ContentPart::image_url("data:image/jpeg;base64,/9j/").unwrap();
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,/9j/"}})
        );
    }

    #[test]
    fn pop_system_message_takes_only_the_first() {
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::system("one"),
            ChatMessage::system("two"),
        ];
        let (system, rest) = pop_system_message(&messages);
        assert_eq!(system.as_deref(), Some("one"));
        assert_eq!(rest, vec![ChatMessage::user("hi"), ChatMessage::system("two")]);
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let messages = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
            ChatMessage::assistant("reply 2"),
        ];
        assert_eq!(last_user_message(&messages).as_deref(), Some("second"));
    }
}
