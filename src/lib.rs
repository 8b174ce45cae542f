//! Journal reader - client-side interaction layer for a collaborative ebook
//! reader.
//!
//! The reader loads a PDF into per-page surfaces, tracks which page is in view,
//! captures selections as quotes and manages annotation layers ("journals")
//! through the backend API. A UI binds to [`Reader`]'s commands and draws from
//! its snapshots.

use std::env;
use std::path::PathBuf;

use url::Url;

pub mod api;
pub mod assist;
pub mod auth_page;
pub mod dialog;
pub mod document;
pub mod error;
pub mod models;
pub mod panel;
pub mod reader;
pub mod selection;
pub mod state;
pub mod templates;
pub mod tracker;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_LOG_FILE: &str = "journal-reader.log";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Scale from PDF points to CSS pixels.
pub const RENDER_SCALE: f64 = 1.5;
/// Vertical space between page surfaces, in CSS pixels.
pub const PAGE_GAP: f64 = 10.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

/// Values the hosting page hands to the reader, plus tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderConfig {
    pub api_base: Url,
    pub document_url: String,
    pub user_id: i64,
    pub ebook_id: i64,
    pub session_cookie: Option<String>,
    pub log_file: PathBuf,
    pub render_scale: f64,
    pub visibility_threshold: f64,
}

impl ReaderConfig {
    /// Read configuration from `READER_*` environment variables.
    pub fn from_env() -> Result<Self, ReaderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReaderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ReaderError::Config(format!("{} is not set", key)))
        };
        let parse_id = |key: &str| -> Result<i64, ReaderError> {
            required(key)?
                .trim()
                .parse()
                .map_err(|_| ReaderError::Config(format!("{} must be an integer", key)))
        };
        let parse_f64 = |key: &str, default: f64| -> Result<f64, ReaderError> {
            match lookup(key) {
                None => Ok(default),
                Some(v) => v
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite() && *x > 0.0)
                    .ok_or_else(|| ReaderError::Config(format!("{} must be a positive number", key))),
            }
        };

        let api_base = lookup("READER_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(&api_base)
            .map_err(|e| ReaderError::Config(format!("READER_API_BASE: {}", e)))?;
        if api_base.scheme() != "http" && api_base.scheme() != "https" {
            return Err(ReaderError::Config(
                "READER_API_BASE must be an http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            api_base,
            document_url: required("READER_DOCUMENT_URL")?,
            user_id: parse_id("READER_USER_ID")?,
            ebook_id: parse_id("READER_EBOOK_ID")?,
            session_cookie: lookup("READER_SESSION_COOKIE").filter(|v| !v.is_empty()),
            log_file: lookup("READER_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            render_scale: parse_f64("READER_RENDER_SCALE", RENDER_SCALE)?,
            visibility_threshold: parse_f64(
                "READER_VISIBILITY_THRESHOLD",
                tracker::DEFAULT_VISIBILITY_THRESHOLD,
            )?,
        })
    }
}

// Re-export commonly used types
pub use api::{Backend, HttpBackend};
pub use document::{DocumentLoader, PageLayout, PageSource, PageSurface, PdfDocument, PdfLoader};
pub use error::ReaderError;
pub use models::{Annotation, Group, Layer, LayerSummary, NewAnnotation, NewLayer};
pub use reader::{DocumentView, Notice, NoticeLevel, Reader, ReaderSnapshot};
pub use selection::PointerRelease;
pub use state::ViewerState;
