//! The reader view-model.
//!
//! `Reader` owns the viewer state and every panel's view state, and exposes
//! the reader's interactions as typed commands. A UI binds its events to these
//! commands and re-renders from [`Reader::snapshot`]. All commands take `&self`
//! and run on one event sequence; state borrows never span an `.await`.

use std::cell::{Cell, RefCell};

use log::{error, info};

use crate::api::Backend;
use crate::assist::AiButtonView;
use crate::dialog::LayerDialog;
use crate::document::{DocumentLoader, PageLayout, PageSource};
use crate::error::ReaderError;
use crate::models::Layer;
use crate::panel::{AnnotationListView, LayerListView};
use crate::selection::{capture_selection, PointerRelease};
use crate::state::ViewerState;
use crate::tracker::{current_page_from, PageTracker, Viewport};
use crate::{ReaderConfig, DEFAULT_VIEWPORT_HEIGHT, RENDER_SCALE};

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;

// ============================================================================
// Notices and Views
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible message, drained by the UI with [`Reader::take_notices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentView {
    Empty,
    Loading,
    Ready,
    /// Blocking error shown in place of the pages
    Failed(String),
}

/// Everything a UI needs to draw the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSnapshot {
    pub document: DocumentView,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_label: String,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub current_layer_id: Option<i64>,
    pub pending_quote: Option<String>,
    pub draft: String,
    pub scroll_draft_to_end: bool,
    pub saving: bool,
    pub layers: LayerListView,
    pub annotations: AnnotationListView,
    pub summary: Option<String>,
    pub dialog: LayerDialog,
    pub ai_button: AiButtonView,
}

// ============================================================================
// Reader
// ============================================================================

pub struct Reader<B> {
    pub(crate) backend: B,
    pub(crate) user_id: i64,
    pub(crate) ebook_id: i64,
    render_scale: f64,
    pub(crate) state: RefCell<ViewerState>,
    document: RefCell<DocumentView>,
    layout: RefCell<PageLayout>,
    tracker: RefCell<PageTracker>,
    viewport: Cell<Viewport>,
    /// `None` until the first layer fetch succeeds
    pub(crate) layers: RefCell<Option<Vec<Layer>>>,
    pub(crate) annotations: RefCell<AnnotationListView>,
    pub(crate) summary: RefCell<Option<String>>,
    pub(crate) dialog: RefCell<LayerDialog>,
    notices: RefCell<Vec<Notice>>,
}

impl<B: Backend> Reader<B> {
    /// `user_id` and `ebook_id` come from the hosting page.
    pub fn new(backend: B, user_id: i64, ebook_id: i64) -> Self {
        Self {
            backend,
            user_id,
            ebook_id,
            render_scale: RENDER_SCALE,
            state: RefCell::new(ViewerState::default()),
            document: RefCell::new(DocumentView::Empty),
            layout: RefCell::new(PageLayout::default()),
            tracker: RefCell::new(PageTracker::default()),
            viewport: Cell::new(Viewport {
                scroll_top: 0.0,
                height: DEFAULT_VIEWPORT_HEIGHT,
            }),
            layers: RefCell::new(None),
            annotations: RefCell::new(AnnotationListView::Prompt),
            summary: RefCell::new(None),
            dialog: RefCell::new(LayerDialog::default()),
            notices: RefCell::new(Vec::new()),
        }
    }

    pub fn from_config(backend: B, config: &ReaderConfig) -> Self {
        let mut reader = Self::new(backend, config.user_id, config.ebook_id);
        reader.render_scale = config.render_scale;
        reader.tracker = RefCell::new(PageTracker::new(config.visibility_threshold));
        reader
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn ebook_id(&self) -> i64 {
        self.ebook_id
    }

    // ------------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------------

    pub(crate) fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.borrow_mut().push(Notice {
            level,
            message: message.into(),
        });
    }

    pub(crate) fn notify_error(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message);
    }

    /// Drain pending user-visible messages.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }

    // ------------------------------------------------------------------------
    // Document
    // ------------------------------------------------------------------------

    /// Load and lay out the document at `url`, replacing any previous one.
    ///
    /// The tracker is detached before the old surfaces are dropped, so nothing
    /// reports against a stale layout. A whole-document failure leaves the
    /// viewer empty with a blocking error; single-page failures only leave
    /// gaps. Returns the document's page count.
    pub async fn load_document<L: DocumentLoader>(
        &self,
        loader: &L,
        url: &str,
    ) -> Result<u32, ReaderError> {
        self.tracker.borrow_mut().disconnect();
        *self.layout.borrow_mut() = PageLayout::default();
        self.state.borrow_mut().reset_document(0);
        *self.document.borrow_mut() = DocumentView::Loading;

        let doc = match loader.load(url).await {
            Ok(d) => d,
            Err(e) => {
                error!("Document load failed for {}: {}", url, e);
                *self.document.borrow_mut() = DocumentView::Failed(e.to_string());
                self.notify_error("Could not load the book. Please try again later.");
                return Err(e);
            }
        };

        let layout = PageLayout::render(&doc, self.render_scale);
        let total_pages = doc.page_count();
        info!(
            "Loaded {} ({} pages, {} rendered)",
            url,
            total_pages,
            layout.surfaces().len()
        );

        {
            let mut tracker = self.tracker.borrow_mut();
            for surface in layout.surfaces() {
                tracker.observe(surface);
            }
        }
        *self.layout.borrow_mut() = layout;
        self.state.borrow_mut().reset_document(total_pages);
        *self.document.borrow_mut() = DocumentView::Ready;

        self.on_scroll(0.0);
        Ok(total_pages)
    }

    /// Current layout, for drawing surfaces and resolving page identifiers.
    pub fn layout(&self) -> PageLayout {
        self.layout.borrow().clone()
    }

    // ------------------------------------------------------------------------
    // Scrolling and Navigation
    // ------------------------------------------------------------------------

    /// The viewport scrolled to `scroll_top`. Returns the current page.
    pub fn on_scroll(&self, scroll_top: f64) -> u32 {
        let mut viewport = self.viewport.get();
        viewport.scroll_top = scroll_top.max(0.0);
        self.viewport.set(viewport);
        self.apply_visibility(viewport)
    }

    /// The viewport was resized. Returns the current page.
    pub fn on_resize(&self, height: f64) -> u32 {
        let mut viewport = self.viewport.get();
        viewport.height = height.max(0.0);
        self.viewport.set(viewport);
        self.apply_visibility(viewport)
    }

    fn apply_visibility(&self, viewport: Viewport) -> u32 {
        let entries = self.tracker.borrow_mut().update(viewport);
        let mut state = self.state.borrow_mut();
        if let Some(page_num) = current_page_from(&entries) {
            state.set_current_page(page_num);
        }
        state.current_page
    }

    /// Scroll so `page_num` starts at the top of the viewport. Returns the new
    /// scroll offset, or `None` if that page has no surface.
    pub fn go_to_page(&self, page_num: u32) -> Option<f64> {
        let top = self.layout.borrow().surface(page_num)?.top;
        self.on_scroll(top);
        self.state.borrow_mut().set_current_page(page_num);
        Some(top)
    }

    /// Step to the next page that has a surface, skipping pages that failed
    /// to render.
    pub fn next_page(&self) -> Option<f64> {
        let page_num = self.neighbour_page(true)?;
        self.go_to_page(page_num)
    }

    pub fn prev_page(&self) -> Option<f64> {
        let page_num = self.neighbour_page(false)?;
        self.go_to_page(page_num)
    }

    fn neighbour_page(&self, forward: bool) -> Option<u32> {
        let current = self.state.borrow().current_page;
        let layout = self.layout.borrow();
        let mut surfaces = layout.surfaces().iter();
        let found = if forward {
            surfaces.find(|s| s.page_num > current)
        } else {
            surfaces.rev().find(|s| s.page_num < current)
        };
        found.map(|s| s.page_num)
    }

    // ------------------------------------------------------------------------
    // Selection and Draft
    // ------------------------------------------------------------------------

    /// Returns whether the pending quote was replaced.
    pub fn on_pointer_release(&self, event: &PointerRelease) -> bool {
        capture_selection(&mut self.state.borrow_mut(), event)
    }

    pub fn clear_pending_quote(&self) {
        self.state.borrow_mut().pending_quote = None;
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.state.borrow_mut().draft = text.into();
    }

    /// The UI scrolled the draft input after an append.
    pub fn draft_scrolled(&self) {
        self.state.borrow_mut().scroll_draft_to_end = false;
    }

    // ------------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------------

    pub fn state(&self) -> ViewerState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        let state = self.state.borrow();
        ReaderSnapshot {
            document: self.document.borrow().clone(),
            current_page: state.current_page,
            total_pages: state.total_pages,
            page_label: state.page_label(),
            can_go_prev: self.neighbour_page(false).is_some(),
            can_go_next: self.neighbour_page(true).is_some(),
            current_layer_id: state.current_layer_id,
            pending_quote: state.pending_quote.clone(),
            draft: state.draft.clone(),
            scroll_draft_to_end: state.scroll_draft_to_end,
            saving: state.saving,
            layers: LayerListView::build(self.layers.borrow().as_deref(), state.current_layer_id),
            annotations: self.annotations.borrow().clone(),
            summary: self.summary.borrow().clone(),
            dialog: self.dialog.borrow().clone(),
            ai_button: AiButtonView::for_busy(state.asking_ai),
        }
    }
}
