//! Message — communication units exchanged during a task.
//!
//! A Message has a role (user = calling agent, agent = remote agent) and one
//! or more Parts. Part is a closed tagged union; the `type` discriminator on
//! the wire is handled entirely by the serialization layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A message exchanged between agents during a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Role of the sender.
    pub role: Role,

    /// Content parts of the message.
    pub parts: Vec<Part>,

    /// Optional metadata (carries the resume `method` tag, request/session
    /// correlation entries, etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    /// Create a message from the calling agent.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
            metadata: None,
        }
    }

    /// Create a message from the remote agent.
    pub fn agent(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Agent,
            parts,
            metadata: None,
        }
    }

    /// Convenience: user message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    /// Convenience: agent message with a single text part.
    pub fn agent_text(text: impl Into<String>) -> Self {
        Self::agent(vec![Part::text(text)])
    }

    /// Attach metadata to the message.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Concatenated text content across all text parts.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Look up a string entry in the message metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The calling agent (acting for a user).
    User,
    /// The remote agent.
    Agent,
}

/// A part of a message or artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Part {
    /// Plain text content.
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },

    /// File content, inline or by reference.
    #[serde(rename = "file")]
    File {
        file: FileContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },

    /// Structured data.
    #[serde(rename = "data")]
    Data {
        data: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Create a file part.
    pub fn file(file: FileContent) -> Self {
        Part::File {
            file,
            metadata: None,
        }
    }

    /// Create a structured-data part.
    pub fn data(data: serde_json::Value) -> Self {
        Part::Data {
            data,
            metadata: None,
        }
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The data value, if this is a data part.
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Part::Data { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// File content carried by a file part: exactly one of `bytes` (inline,
/// base64) or `uri` (by reference) must be set. The invariant is enforced
/// at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", try_from = "FileContentDraft")]
pub struct FileContent {
    /// Optional filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Base64-encoded inline data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,

    /// URI to the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl FileContent {
    /// Inline file content from raw bytes.
    pub fn from_bytes(name: Option<String>, mime_type: Option<String>, data: &[u8]) -> Self {
        use base64::Engine;
        Self {
            name,
            mime_type,
            bytes: Some(base64::engine::general_purpose::STANDARD.encode(data)),
            uri: None,
        }
    }

    /// File content by reference.
    pub fn from_uri(name: Option<String>, mime_type: Option<String>, uri: impl Into<String>) -> Self {
        Self {
            name,
            mime_type,
            bytes: None,
            uri: Some(uri.into()),
        }
    }
}

/// Unchecked mirror of [`FileContent`] used to validate the
/// exactly-one-of-bytes/uri rule during deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileContentDraft {
    name: Option<String>,
    mime_type: Option<String>,
    bytes: Option<String>,
    uri: Option<String>,
}

impl TryFrom<FileContentDraft> for FileContent {
    type Error = String;

    fn try_from(draft: FileContentDraft) -> Result<Self, Self::Error> {
        match (&draft.bytes, &draft.uri) {
            (Some(_), Some(_)) => {
                Err("only one of 'bytes' or 'uri' may be present in file content".into())
            }
            (None, None) => {
                Err("either 'bytes' or 'uri' must be present in file content".into())
            }
            _ => Ok(Self {
                name: draft.name,
                mime_type: draft.mime_type,
                bytes: draft.bytes,
                uri: draft.uri,
            }),
        }
    }
}
