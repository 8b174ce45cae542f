//! Annotation panel: layer list, annotation cards, saving and deleting notes.

use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::api::Backend;
use crate::error::ReaderError;
use crate::models::{Annotation, Layer, NewAnnotation};
use crate::reader::Reader;
use crate::state::{Flag, FlagGuard};

pub const NO_LAYERS_PLACEHOLDER: &str = "No journals yet";
pub const SELECT_LAYER_PROMPT: &str = "Select a journal to see its notes.";
pub const LOADING_NOTES: &str = "Loading notes...";
pub const NO_NOTES_PLACEHOLDER: &str = "No notes yet.";
pub const NOTES_FAILED: &str = "Could not load notes.";
pub const DELETE_CONFIRMATION: &str = "Delete this note? This cannot be undone.";

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LayerOption {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerListView {
    NotLoaded,
    /// Rendered as a single disabled placeholder option
    Empty,
    Options(Vec<LayerOption>),
}

impl LayerListView {
    pub fn build(layers: Option<&[Layer]>, selected: Option<i64>) -> Self {
        match layers {
            None => LayerListView::NotLoaded,
            Some([]) => LayerListView::Empty,
            Some(layers) => LayerListView::Options(
                layers
                    .iter()
                    .map(|l| LayerOption {
                        id: l.id,
                        label: l.label(),
                        selected: selected == Some(l.id),
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationCard {
    pub id: i64,
    pub author_name: String,
    pub content: String,
    pub quote: Option<String>,
    pub location: Option<String>,
    /// Page the location label points at, for jumping to it
    pub page_num: Option<u32>,
    pub timestamp: Option<String>,
    /// Only the author sees a delete control; the server re-checks
    pub can_delete: bool,
}

impl AnnotationCard {
    pub fn from_annotation(annotation: &Annotation, viewer_id: i64) -> Self {
        Self {
            id: annotation.id,
            author_name: annotation.author_name.clone(),
            content: annotation.content.clone(),
            quote: annotation.highlighted_text.clone(),
            location: annotation.position_data.clone(),
            page_num: annotation
                .position_data
                .as_deref()
                .and_then(parse_position_label),
            timestamp: annotation.display_timestamp(),
            can_delete: annotation.author_id == viewer_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationListView {
    /// No layer selected
    Prompt,
    Loading,
    Empty,
    Failed,
    /// Server order is preserved
    Cards(Vec<AnnotationCard>),
}

impl AnnotationListView {
    /// Placeholder text for every state except a list of cards.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            AnnotationListView::Prompt => Some(SELECT_LAYER_PROMPT),
            AnnotationListView::Loading => Some(LOADING_NOTES),
            AnnotationListView::Empty => Some(NO_NOTES_PLACEHOLDER),
            AnnotationListView::Failed => Some(NOTES_FAILED),
            AnnotationListView::Cards(_) => None,
        }
    }

    pub fn cards(&self) -> &[AnnotationCard] {
        match self {
            AnnotationListView::Cards(cards) => cards,
            _ => &[],
        }
    }

    fn from_annotations(annotations: &[Annotation], viewer_id: i64) -> Self {
        if annotations.is_empty() {
            AnnotationListView::Empty
        } else {
            AnnotationListView::Cards(
                annotations
                    .iter()
                    .map(|a| AnnotationCard::from_annotation(a, viewer_id))
                    .collect(),
            )
        }
    }
}

/// Parse a position label such as "Page 3" back into a page number.
pub fn parse_position_label(label: &str) -> Option<u32> {
    static RE_POSITION: OnceLock<Regex> = OnceLock::new();
    let re = RE_POSITION.get_or_init(|| Regex::new(r"(?i)^\s*page\s+(\d+)\s*$").unwrap());
    re.captures(label)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|n| *n > 0)
}

// ============================================================================
// Panel Commands
// ============================================================================

impl<B: Backend> Reader<B> {
    /// Fetch the layers of the current ebook. On failure the previous list is
    /// kept.
    pub async fn refresh_layers(&self) -> Result<(), ReaderError> {
        match self.backend.list_layers(self.ebook_id).await {
            Ok(layers) => {
                debug!("Fetched {} layers for ebook {}", layers.len(), self.ebook_id);
                *self.layers.borrow_mut() = Some(layers);
                Ok(())
            }
            Err(e) => {
                warn!("Fetching layers failed: {}", e);
                self.notify_error("Could not load journals.");
                Err(e)
            }
        }
    }

    /// Make `layer_id` the current layer and show its notes.
    pub async fn select_layer(&self, layer_id: Option<i64>) -> Result<(), ReaderError> {
        self.state.borrow_mut().current_layer_id = layer_id;
        *self.summary.borrow_mut() = None;
        self.load_annotations(layer_id).await
    }

    /// Show the notes of `layer_id`, or a prompt when no layer is given.
    pub async fn load_annotations(&self, layer_id: Option<i64>) -> Result<(), ReaderError> {
        let Some(layer_id) = layer_id else {
            *self.annotations.borrow_mut() = AnnotationListView::Prompt;
            return Ok(());
        };

        *self.annotations.borrow_mut() = AnnotationListView::Loading;
        match self.backend.list_annotations(layer_id).await {
            Ok(annotations) => {
                *self.annotations.borrow_mut() =
                    AnnotationListView::from_annotations(&annotations, self.user_id);
                Ok(())
            }
            Err(e) => {
                warn!("Fetching annotations for layer {} failed: {}", layer_id, e);
                *self.annotations.borrow_mut() = AnnotationListView::Failed;
                self.notify_error("Could not load notes for this journal.");
                Err(e)
            }
        }
    }

    /// Save the draft as a note on the current layer, quoting the pending
    /// selection and recording the page being viewed right now.
    ///
    /// Does nothing while a previous save is still outstanding. Returns `Ok`
    /// once the server accepts the note, even if re-reading the list fails.
    pub async fn save_annotation(&self) -> Result<(), ReaderError> {
        let Some(guard) = FlagGuard::acquire(&self.state, Flag::Saving) else {
            debug!("Save already in flight, ignoring");
            return Ok(());
        };

        let payload = {
            let state = self.state.borrow();
            let content = state.draft.trim();
            if content.is_empty() {
                return Err(self.reject("Please write a note before saving."));
            }
            let Some(layer_id) = state.current_layer_id else {
                return Err(self.reject("Please select a journal first."));
            };
            NewAnnotation {
                content: content.to_string(),
                layer_id,
                highlighted_text: state.pending_quote.clone(),
                position_data: state.position_label(),
            }
        };

        if let Err(e) = self.backend.create_annotation(&payload).await {
            warn!("Saving annotation failed: {}", e);
            self.notify_error("Could not save your note. Please try again.");
            return Err(e);
        }

        let layer_id = {
            let mut state = self.state.borrow_mut();
            state.draft.clear();
            state.pending_quote = None;
            state.current_layer_id
        };
        drop(guard);

        // Re-read from the server rather than inserting locally. The note is
        // saved even if this fails; the failed list already carries a notice.
        if let Err(e) = self.load_annotations(layer_id).await {
            debug!("Note saved but refreshing the list failed: {}", e);
        }
        Ok(())
    }

    /// Delete one of the viewer's notes after `confirm` accepts the prompt.
    ///
    /// The card is removed only once the server confirms; a failed request
    /// leaves it in place.
    pub async fn delete_annotation<F>(&self, annotation_id: i64, confirm: F) -> Result<(), ReaderError>
    where
        F: FnOnce(&str) -> bool,
    {
        if self.state.borrow().is_set(Flag::Deleting(annotation_id)) {
            return Ok(());
        }
        if !confirm(DELETE_CONFIRMATION) {
            return Ok(());
        }
        let Some(_guard) = FlagGuard::acquire(&self.state, Flag::Deleting(annotation_id)) else {
            return Ok(());
        };

        if let Err(e) = self.backend.delete_annotation(annotation_id).await {
            warn!("Deleting annotation {} failed: {}", annotation_id, e);
            self.notify_error("Could not delete the note.");
            return Err(e);
        }

        let mut view = self.annotations.borrow_mut();
        if let AnnotationListView::Cards(cards) = &mut *view {
            cards.retain(|c| c.id != annotation_id);
            if cards.is_empty() {
                *view = AnnotationListView::Empty;
            }
        }
        Ok(())
    }

    /// Ask the server for a summary of the current layer's notes.
    pub async fn summarize_layer(&self) -> Result<(), ReaderError> {
        let Some(layer_id) = self.state.borrow().current_layer_id else {
            return Err(self.reject("Please select a journal first."));
        };
        let Some(_guard) = FlagGuard::acquire(&self.state, Flag::Summarizing) else {
            return Ok(());
        };

        match self.backend.summarize_layer(layer_id).await {
            Ok(summary) => {
                *self.summary.borrow_mut() = Some(summary.summary);
                Ok(())
            }
            Err(e) => {
                warn!("Summarizing layer {} failed: {}", layer_id, e);
                self.notify_error("Could not summarize this journal.");
                Err(e)
            }
        }
    }

    /// Record a validation failure as a notice and return it as an error.
    pub(crate) fn reject(&self, message: &str) -> ReaderError {
        self.notify_error(message);
        ReaderError::Validation(message.to_string())
    }
}
