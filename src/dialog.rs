//! Modal dialog for creating a new layer.
//!
//! `Closed → Loading → Ready → Closed`. Opening fetches the viewer's groups to
//! fill the scope selector; confirming creates the layer, refreshes the layer
//! list and selects the new layer. Any failure closes the dialog.

use log::{debug, info, warn};

use crate::api::Backend;
use crate::error::ReaderError;
use crate::models::{Group, Layer, NewLayer};
use crate::reader::Reader;
use crate::state::{Flag, FlagGuard};

/// Scope value meaning "no group". Group ids are positive, so it never
/// collides with a real one.
pub const PRIVATE_SCOPE_VALUE: &str = "0";
pub const PRIVATE_SCOPE_LABEL: &str = "Private / Public (no group)";
pub const LOADING_GROUPS: &str = "Loading groups...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogPhase {
    #[default]
    Closed,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerDialog {
    pub phase: DialogPhase,
    pub name: String,
    pub scope_options: Vec<ScopeOption>,
    pub selected_scope: String,
    /// Bumped on every open; a groups response for an older open is dropped.
    pub generation: u64,
}

impl LayerDialog {
    pub fn is_open(&self) -> bool {
        self.phase != DialogPhase::Closed
    }

    /// Text shown in the scope selector while groups are loading.
    pub fn scope_placeholder(&self) -> Option<&'static str> {
        (self.phase == DialogPhase::Loading).then_some(LOADING_GROUPS)
    }

    fn loading(generation: u64) -> Self {
        Self {
            phase: DialogPhase::Loading,
            name: String::new(),
            scope_options: Vec::new(),
            selected_scope: PRIVATE_SCOPE_VALUE.to_string(),
            generation,
        }
    }

    fn close(&mut self) {
        *self = Self {
            generation: self.generation,
            ..Self::default()
        };
    }

    fn ready(&mut self, groups: &[Group]) {
        let mut options = vec![ScopeOption {
            value: PRIVATE_SCOPE_VALUE.to_string(),
            label: PRIVATE_SCOPE_LABEL.to_string(),
        }];
        options.extend(groups.iter().map(|g| ScopeOption {
            value: g.id.to_string(),
            label: g.name.clone(),
        }));
        self.scope_options = options;
        self.phase = DialogPhase::Ready;
    }
}

/// Map a scope selector value to the layer's group: the sentinel means none.
pub fn scope_to_group_id(value: &str) -> Result<Option<i64>, ReaderError> {
    let value = value.trim();
    if value == PRIVATE_SCOPE_VALUE {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ReaderError::Validation(format!("Invalid group selection: {}", value)))
}

impl<B: Backend> Reader<B> {
    /// Open the dialog and load the viewer's groups into the scope selector.
    pub async fn open_layer_dialog(&self) -> Result<(), ReaderError> {
        let generation = {
            let mut dialog = self.dialog.borrow_mut();
            let generation = dialog.generation + 1;
            *dialog = LayerDialog::loading(generation);
            generation
        };

        let result = self.backend.list_groups().await;
        let mut dialog = self.dialog.borrow_mut();
        // Cancelled, or reopened since this request went out.
        if dialog.generation != generation || dialog.phase != DialogPhase::Loading {
            debug!("Dropping groups for stale dialog open {}", generation);
            return Ok(());
        }
        match result {
            Ok(groups) => {
                dialog.ready(&groups);
                Ok(())
            }
            Err(e) => {
                warn!("Fetching groups failed: {}", e);
                dialog.close();
                drop(dialog);
                self.notify_error("Could not load your groups.");
                Err(e)
            }
        }
    }

    pub fn set_layer_name(&self, name: impl Into<String>) {
        self.dialog.borrow_mut().name = name.into();
    }

    pub fn select_scope(&self, value: impl Into<String>) {
        self.dialog.borrow_mut().selected_scope = value.into();
    }

    /// Close without creating anything (cancel button or backdrop click).
    pub fn cancel_layer_dialog(&self) {
        self.dialog.borrow_mut().close();
    }

    /// Create the layer described by the dialog. Returns the new layer, or
    /// `None` when the dialog is not ready or a creation is already running.
    pub async fn confirm_layer_dialog(&self) -> Result<Option<Layer>, ReaderError> {
        let (name, scope) = {
            let dialog = self.dialog.borrow();
            if dialog.phase != DialogPhase::Ready {
                return Ok(None);
            }
            (dialog.name.trim().to_string(), dialog.selected_scope.clone())
        };

        if name.is_empty() {
            return Err(self.reject("Please enter a name for the journal."));
        }
        let study_group_id = match scope_to_group_id(&scope) {
            Ok(id) => id,
            Err(e) => {
                self.notify_error(e.to_string());
                return Err(e);
            }
        };

        let Some(guard) = FlagGuard::acquire(&self.state, Flag::CreatingLayer) else {
            return Ok(None);
        };

        let payload = NewLayer {
            name,
            ebook_id: self.ebook_id,
            study_group_id,
        };
        let result = self.backend.create_layer(&payload).await;
        drop(guard);
        self.dialog.borrow_mut().close();

        let layer = match result {
            Ok(layer) => layer,
            Err(e) => {
                warn!("Creating layer failed: {}", e);
                self.notify_error("Could not create the journal.");
                return Err(e);
            }
        };
        info!("Created layer {} ({})", layer.id, layer.name);

        // Failures here are already reported as notices; the layer exists.
        let _ = self.refresh_layers().await;
        let _ = self.select_layer(Some(layer.id)).await;
        Ok(Some(layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_mapping() {
        assert_eq!(scope_to_group_id(PRIVATE_SCOPE_VALUE), Ok(None));
        assert_eq!(scope_to_group_id("12"), Ok(Some(12)));
        assert!(matches!(
            scope_to_group_id("study-group"),
            Err(ReaderError::Validation(_))
        ));
    }

    #[test]
    fn test_ready_lists_sentinel_then_groups() {
        let mut dialog = LayerDialog::loading(1);
        assert_eq!(dialog.scope_placeholder(), Some(LOADING_GROUPS));

        dialog.ready(&[
            Group { id: 4, name: "Book club".to_string() },
            Group { id: 9, name: "Seminar".to_string() },
        ]);
        assert_eq!(dialog.phase, DialogPhase::Ready);
        assert_eq!(dialog.scope_placeholder(), None);
        let values: Vec<&str> = dialog.scope_options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec![PRIVATE_SCOPE_VALUE, "4", "9"]);
        assert_eq!(dialog.selected_scope, PRIVATE_SCOPE_VALUE);
    }

    #[test]
    fn test_close_keeps_generation() {
        let mut dialog = LayerDialog::loading(3);
        dialog.name = "Draft".to_string();
        dialog.close();
        assert!(!dialog.is_open());
        assert_eq!(dialog.name, "");
        assert_eq!(dialog.generation, 3);
    }
}
