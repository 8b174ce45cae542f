//! Client-local viewer state.

use std::cell::RefCell;
use std::collections::HashSet;

/// Everything the reader remembers between events. Owned by the `Reader`;
/// components read and update it through the reader's commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    /// 1-based; 0 until a document with at least one page is loaded
    pub current_page: u32,
    pub total_pages: u32,
    pub current_layer_id: Option<i64>,
    /// Last non-empty selection, attached to the next saved note
    pub pending_quote: Option<String>,
    pub draft: String,
    /// Set when text was appended to the draft and the input should scroll to it
    pub scroll_draft_to_end: bool,
    pub saving: bool,
    pub deleting: HashSet<i64>,
    pub creating_layer: bool,
    pub asking_ai: bool,
    pub summarizing: bool,
}

impl ViewerState {
    /// Reset page tracking for a freshly loaded document.
    pub fn reset_document(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
        self.current_page = if total_pages > 0 { 1 } else { 0 };
    }

    /// Set the current page, clamped into `[1, total_pages]`. Returns whether
    /// the value changed.
    pub fn set_current_page(&mut self, page_num: u32) -> bool {
        if self.total_pages == 0 {
            return false;
        }
        let page_num = page_num.clamp(1, self.total_pages);
        let changed = self.current_page != page_num;
        self.current_page = page_num;
        changed
    }

    /// Page indicator text, e.g. "Page 2 of 10".
    pub fn page_label(&self) -> String {
        if self.total_pages == 0 {
            String::new()
        } else {
            format!("Page {} of {}", self.current_page, self.total_pages)
        }
    }

    /// Position recorded on a new annotation, e.g. "Page 2".
    pub fn position_label(&self) -> Option<String> {
        (self.current_page > 0).then(|| format!("Page {}", self.current_page))
    }
}

// ============================================================================
// In-flight Guards
// ============================================================================

/// An action that must not run twice concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Saving,
    Deleting(i64),
    CreatingLayer,
    AskingAi,
    Summarizing,
}

impl ViewerState {
    pub fn is_set(&self, flag: Flag) -> bool {
        match flag {
            Flag::Saving => self.saving,
            Flag::Deleting(id) => self.deleting.contains(&id),
            Flag::CreatingLayer => self.creating_layer,
            Flag::AskingAi => self.asking_ai,
            Flag::Summarizing => self.summarizing,
        }
    }

    fn set(&mut self, flag: Flag, on: bool) {
        match flag {
            Flag::Saving => self.saving = on,
            Flag::Deleting(id) => {
                if on {
                    self.deleting.insert(id);
                } else {
                    self.deleting.remove(&id);
                }
            }
            Flag::CreatingLayer => self.creating_layer = on,
            Flag::AskingAi => self.asking_ai = on,
            Flag::Summarizing => self.summarizing = on,
        }
    }
}

/// Holds a flag for the duration of an action and clears it on drop, so every
/// exit path (success, error, early return) restores the control.
pub(crate) struct FlagGuard<'a> {
    state: &'a RefCell<ViewerState>,
    flag: Flag,
}

impl<'a> FlagGuard<'a> {
    /// Returns `None` if the flag is already held.
    pub(crate) fn acquire(state: &'a RefCell<ViewerState>, flag: Flag) -> Option<Self> {
        let mut s = state.borrow_mut();
        if s.is_set(flag) {
            return None;
        }
        s.set(flag, true);
        Some(Self { state, flag })
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.state.borrow_mut().set(self.flag, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_page_stays_in_range() {
        let mut state = ViewerState::default();
        assert!(!state.set_current_page(3));
        assert_eq!(state.page_label(), "");
        assert_eq!(state.position_label(), None);

        state.reset_document(5);
        assert_eq!(state.current_page, 1);
        assert!(state.set_current_page(9));
        assert_eq!(state.current_page, 5);
        assert!(!state.set_current_page(5));
        state.set_current_page(0);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_label(), "Page 1 of 5");
        assert_eq!(state.position_label().as_deref(), Some("Page 1"));
    }

    #[test]
    fn test_flag_guard_blocks_reentry_and_releases() {
        let state = RefCell::new(ViewerState::default());
        {
            let _guard = FlagGuard::acquire(&state, Flag::AskingAi).unwrap();
            assert!(state.borrow().asking_ai);
            assert!(FlagGuard::acquire(&state, Flag::AskingAi).is_none());
            assert!(FlagGuard::acquire(&state, Flag::Saving).is_some());
        }
        assert!(!state.borrow().asking_ai);
        assert!(!state.borrow().saving);
    }

    #[test]
    fn test_delete_flags_are_per_annotation() {
        let state = RefCell::new(ViewerState::default());
        let first = FlagGuard::acquire(&state, Flag::Deleting(1)).unwrap();
        assert!(FlagGuard::acquire(&state, Flag::Deleting(1)).is_none());
        let second = FlagGuard::acquire(&state, Flag::Deleting(2)).unwrap();
        drop(first);
        assert!(!state.borrow().is_set(Flag::Deleting(1)));
        assert!(state.borrow().is_set(Flag::Deleting(2)));
        drop(second);
        assert!(state.borrow().deleting.is_empty());
    }
}
