//! Text selection capture for quoting in notes.

use log::debug;

use crate::state::ViewerState;

/// A pointer-release event as delivered by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerRelease {
    /// Whether the release happened inside the document viewer
    pub inside_viewer: bool,
    /// The active selection's text at release time, flattened across pages
    pub selected_text: String,
}

impl PointerRelease {
    pub fn in_viewer(selected_text: impl Into<String>) -> Self {
        Self {
            inside_viewer: true,
            selected_text: selected_text.into(),
        }
    }
}

/// Store the selection as the pending quote. Releases outside the viewer and
/// empty selections leave the previous quote alone. Returns whether the quote
/// was replaced.
pub fn capture_selection(state: &mut ViewerState, event: &PointerRelease) -> bool {
    if !event.inside_viewer {
        return false;
    }
    let text = event.selected_text.trim();
    if text.is_empty() {
        return false;
    }
    debug!("Captured selection of {} chars", text.chars().count());
    state.pending_quote = Some(text.to_string());
    true
}
