//! Data models exchanged with the annotation backend.
//!
//! Every entity here is owned by the server; the reader only holds copies
//! fetched for display and the request payloads it sends back.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// Layers and Annotations
// ============================================================================

/// A named collection of annotations on one ebook ("journal").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub id: i64,
    pub name: String,
    pub creator_name: String,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub study_group_id: Option<i64>,
}

impl Layer {
    /// Label used in the layer selector.
    pub fn label(&self) -> String {
        format!("{} (by {})", self.name, self.creator_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    #[serde(default)]
    pub highlighted_text: Option<String>,
    #[serde(default)]
    pub position_data: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Annotation {
    /// Timestamp formatted for a card, if the server sent one we understand.
    ///
    /// The backend emits ISO-8601 with or without a UTC offset depending on the
    /// database driver, so both shapes are accepted.
    pub fn display_timestamp(&self) -> Option<String> {
        let raw = self.timestamp.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.format("%Y-%m-%d %H:%M").to_string());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

// ============================================================================
// Request Payloads
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAnnotation {
    pub content: String,
    pub layer_id: i64,
    pub highlighted_text: Option<String>,
    pub position_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLayer {
    pub name: String,
    pub ebook_id: i64,
    /// `None` creates a private/public layer not bound to any group
    pub study_group_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplainRequest {
    pub text: String,
    pub ebook_id: i64,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerSummary {
    pub summary: String,
}

/// Body of every non-success response from the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
