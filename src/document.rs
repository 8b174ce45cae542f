//! Document loading and page layout.
//!
//! A loaded document is laid out as a vertical stack of page surfaces, each
//! carrying a text layer with the page's selectable text. Surfaces are tagged
//! `pdf-page-N` and text layers `text-layer-N` so other components can resolve
//! "page N" by identifier.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use log::{debug, info, warn};
use regex::Regex;
use url::Url;

use crate::error::ReaderError;
use crate::{PAGE_GAP, REQUEST_TIMEOUT_SECS};

/// US Letter in PDF points, used when the decoder cannot report a media box.
pub const DEFAULT_PAGE_WIDTH_PT: f64 = 612.0;
pub const DEFAULT_PAGE_HEIGHT_PT: f64 = 792.0;

// ============================================================================
// Decoder Interface
// ============================================================================

/// One decoded page, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub width: f64,
    pub height: f64,
    pub text_lines: Vec<String>,
}

/// A decoded document that can render its pages one at a time.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Render a 1-based page.
    fn render_page(&self, page_num: u32) -> Result<RenderedPage, ReaderError>;
}

/// Fetches and decodes a document by URL.
#[allow(async_fn_in_trait)]
pub trait DocumentLoader {
    type Document: PageSource;

    async fn load(&self, url: &str) -> Result<Self::Document, ReaderError>;
}

// ============================================================================
// Surfaces and Layout
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub id: String,
    pub lines: Vec<String>,
}

impl TextLayer {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A rendered page placed in the scrolling viewport, in CSS pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSurface {
    pub id: String,
    pub page_num: u32,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub text_layer: TextLayer,
}

impl PageSurface {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

pub fn page_surface_id(page_num: u32) -> String {
    format!("pdf-page-{}", page_num)
}

pub fn text_layer_id(page_num: u32) -> String {
    format!("text-layer-{}", page_num)
}

/// Resolve a surface or text-layer identifier back to its page number.
pub fn parse_page_id(id: &str) -> Option<u32> {
    static RE_PAGE_ID: OnceLock<Regex> = OnceLock::new();
    let re = RE_PAGE_ID.get_or_init(|| Regex::new(r"^(?:pdf-page|text-layer)-(\d+)$").unwrap());
    re.captures(id)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|n| *n > 0)
}

/// All surfaces of a loaded document, stacked top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    surfaces: Vec<PageSurface>,
    total_pages: u32,
    content_height: f64,
}

impl PageLayout {
    /// Render every page of `source` at `scale`. A page that fails to render is
    /// logged and skipped; it takes no space in the layout.
    pub fn render<S: PageSource + ?Sized>(source: &S, scale: f64) -> Self {
        let total_pages = source.page_count();
        let mut surfaces = Vec::with_capacity(total_pages as usize);
        let mut top = 0.0;

        for page_num in 1..=total_pages {
            let page = match source.render_page(page_num) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping page {}: {}", page_num, e);
                    continue;
                }
            };

            if !surfaces.is_empty() {
                top += PAGE_GAP;
            }
            let height = (page.height * scale).floor();
            surfaces.push(PageSurface {
                id: page_surface_id(page_num),
                page_num,
                top,
                width: (page.width * scale).floor(),
                height,
                text_layer: TextLayer {
                    id: text_layer_id(page_num),
                    lines: page.text_lines,
                },
            });
            top += height;
        }

        debug!(
            "Laid out {} of {} pages, {}px tall",
            surfaces.len(),
            total_pages,
            top
        );

        Self {
            surfaces,
            total_pages,
            content_height: top,
        }
    }

    pub fn surfaces(&self) -> &[PageSurface] {
        &self.surfaces
    }

    /// Page count reported by the document, including pages that failed.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    pub fn surface(&self, page_num: u32) -> Option<&PageSurface> {
        self.find_by_id(&page_surface_id(page_num))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&PageSurface> {
        let page_num = parse_page_id(id)?;
        self.surfaces.iter().find(|s| s.page_num == page_num)
    }
}

// ============================================================================
// PDF Implementation
// ============================================================================

/// A PDF decoded into per-page text.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<String>,
}

impl PdfDocument {
    pub fn from_page_texts(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn render_page(&self, page_num: u32) -> Result<RenderedPage, ReaderError> {
        let text = page_num
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or_else(|| ReaderError::PageRender {
                page: page_num,
                reason: "page out of range".to_string(),
            })?;

        let text_lines = text
            .lines()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(RenderedPage {
            width: DEFAULT_PAGE_WIDTH_PT,
            height: DEFAULT_PAGE_HEIGHT_PT,
            text_lines,
        })
    }
}

/// Loads PDFs over HTTP(S) or from the local filesystem and decodes them with
/// `pdf-extract`.
#[derive(Clone)]
pub struct PdfLoader {
    client: reqwest::Client,
}

impl PdfLoader {
    pub fn new() -> Result<Self, ReaderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ReaderError::Config(format!("Cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ReaderError> {
        let local_path = match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
                let response = self
                    .client
                    .get(parsed)
                    .send()
                    .await
                    .map_err(|e| ReaderError::DocumentLoad(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(ReaderError::DocumentLoad(format!(
                        "server returned {}",
                        response.status()
                    )));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ReaderError::DocumentLoad(e.to_string()))?;
                return Ok(bytes.to_vec());
            }
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map_err(|_| ReaderError::DocumentLoad(format!("Bad file URL: {}", url)))?,
            Ok(parsed) => {
                return Err(ReaderError::DocumentLoad(format!(
                    "Unsupported scheme: {}",
                    parsed.scheme()
                )))
            }
            Err(_) => PathBuf::from(url),
        };

        tokio::fs::read(&local_path)
            .await
            .map_err(|e| ReaderError::DocumentLoad(format!("{}: {}", local_path.display(), e)))
    }
}

impl DocumentLoader for PdfLoader {
    type Document = PdfDocument;

    async fn load(&self, url: &str) -> Result<PdfDocument, ReaderError> {
        let bytes = self.fetch_bytes(url).await?;
        info!("Fetched {} bytes from {}", bytes.len(), url);

        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| ReaderError::DocumentLoad(format!("pdf-extract failed: {}", e)))
        })
        .await
        .map_err(|e| ReaderError::DocumentLoad(format!("Decoder task failed: {}", e)))??;

        if pages.is_empty() {
            return Err(ReaderError::DocumentLoad("Document has no pages".to_string()));
        }
        Ok(PdfDocument::from_page_texts(pages))
    }
}
