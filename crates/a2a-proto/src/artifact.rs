//! Artifact — outputs produced by a task, possibly streamed in chunks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::message::Part;

/// An artifact produced by a task.
///
/// `index` identifies the artifact slot when output is streamed; an `append`
/// chunk is concatenated onto the slot's previous content instead of
/// replacing it, and `last_chunk` marks the end of that slot's stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Description of what the artifact contains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content parts.
    pub parts: Vec<Part>,

    /// Optional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Artifact slot for streamed output.
    #[serde(default)]
    pub index: u32,

    /// Concatenate onto the previous chunk in this slot instead of replacing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,

    /// No further chunks will arrive for this slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_chunk: Option<bool>,
}

impl Artifact {
    /// Create an artifact occupying the given slot.
    pub fn new(parts: Vec<Part>, index: u32) -> Self {
        Self {
            name: None,
            description: None,
            parts,
            metadata: None,
            index,
            append: None,
            last_chunk: None,
        }
    }

    /// Text artifact in slot 0.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(vec![Part::text(content)], 0)
    }

    /// Structured-data artifact in slot 0.
    pub fn data(value: serde_json::Value) -> Self {
        Self::new(vec![Part::data(value)], 0)
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark as the final chunk of its slot.
    pub fn final_chunk(mut self) -> Self {
        self.last_chunk = Some(true);
        self
    }

    /// Concatenated text content across all text parts.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
