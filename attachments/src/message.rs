use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result;
use crate::orchestrator::DrainedAttachments;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Text,
    Files,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageData {
    Files { description: String, files: Vec<FileReference> },
    FileCount { description: String, file_count: usize },
    Text { text: String },
}

/// A message ready to hand to the send channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub id: String,
    pub timestamp: String,
    pub sender: String,
    pub conversation_id: String,
    pub format: MessageFormat,
    pub data: MessageData,
}

/// How much of the attachment metadata goes into the message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttachmentSummary {
    /// Name and url of every file.
    #[default]
    Full,
    /// Only the number of files.
    CountOnly,
}

/// What the user typed, plus who is sending it where.
#[derive(Clone, Debug, Default)]
pub struct MessageDraft {
    pub sender: String,
    pub conversation_id: String,
    pub text: String,
}

impl MessageDraft {
    pub fn new(sender: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            conversation_id: conversation_id.into(),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builds the message.  With attachments the text becomes the description; without them a
    /// plain text message is built.  Returns `None` when there is neither text nor attachments.
    ///
    /// Whether the uploads have settled is the caller's concern; see `UploadOrchestrator::can_send`.
    pub fn compose(&self, attachments: &DrainedAttachments, summary: AttachmentSummary) -> Option<OutgoingMessage> {
        let (format, data) = if attachments.is_empty() {
            if self.text.trim().is_empty() {
                return None;
            }
            (MessageFormat::Text, MessageData::Text { text: self.text.clone() })
        } else {
            let description = self.text.clone();
            let data = match summary {
                AttachmentSummary::Full => MessageData::Files {
                    description,
                    files: attachments
                        .iter()
                        .map(|(name, url)| FileReference {
                            name: name.to_owned(),
                            url: url.to_owned(),
                        })
                        .collect(),
                },
                AttachmentSummary::CountOnly => MessageData::FileCount {
                    description,
                    file_count: attachments.file_count(),
                },
            };
            (MessageFormat::Files, data)
        };

        Some(OutgoingMessage {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            sender: self.sender.clone(),
            conversation_id: self.conversation_id.clone(),
            format,
            data,
        })
    }
}

impl OutgoingMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::json;

    use super::*;

    fn drained(pairs: &[(&str, &str)]) -> DrainedAttachments {
        DrainedAttachments {
            names: pairs.iter().map(|(n, _)| n.to_string()).collect(),
            urls: pairs.iter().map(|(_, u)| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_text_message() {
        let draft = MessageDraft::new("alice", "conv-1").with_text("hello");
        let message = draft.compose(&DrainedAttachments::default(), AttachmentSummary::Full).unwrap();

        assert_eq!(message.format, MessageFormat::Text);
        assert_eq!(message.data, MessageData::Text { text: "hello".to_owned() });
        assert!(Uuid::parse_str(&message.id).is_ok());
        assert!(DateTime::parse_from_rfc3339(&message.timestamp).is_ok());
        assert!(message.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_empty_draft_without_attachments_is_not_sent() {
        let draft = MessageDraft::new("alice", "conv-1").with_text("   ");
        assert!(draft.compose(&DrainedAttachments::default(), AttachmentSummary::Full).is_none());
    }

    #[test]
    fn test_files_message_serialization() {
        let draft = MessageDraft::new("alice", "conv-1").with_text("see attached");
        let message = draft
            .compose(&drained(&[("a.png", "u1"), ("b.pdf", "u2")]), AttachmentSummary::Full)
            .unwrap();

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["format"], "files");
        assert_eq!(value["conversationId"], "conv-1");
        assert_eq!(
            value["data"],
            json!({
                "description": "see attached",
                "files": [{"name": "a.png", "url": "u1"}, {"name": "b.pdf", "url": "u2"}]
            })
        );

        let parsed: OutgoingMessage = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_count_only_message() {
        // Attachments alone are enough to send, even without text.
        let draft = MessageDraft::new("bob", "conv-2");
        let message = draft
            .compose(&drained(&[("a", "u1"), ("b", "u2"), ("c", "u3")]), AttachmentSummary::CountOnly)
            .unwrap();

        assert_eq!(message.format, MessageFormat::Files);
        assert_eq!(serde_json::to_value(&message.data).unwrap(), json!({"description": "", "file_count": 3}));
    }
}
