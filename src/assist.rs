//! "Ask AI" trigger: sends the draft to the explanation endpoint and appends
//! the answer to the draft.

use log::warn;

use crate::api::Backend;
use crate::error::ReaderError;
use crate::models::ExplainRequest;
use crate::reader::Reader;
use crate::state::{Flag, FlagGuard};

pub const AI_BUTTON_LABEL: &str = "Ask AI";
pub const AI_BUSY_LABEL: &str = "Thinking...";
pub const EXPLANATION_MARKER: &str = "--- AI Explanation ---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiButtonView {
    pub label: &'static str,
    pub disabled: bool,
}

impl AiButtonView {
    pub fn for_busy(busy: bool) -> Self {
        if busy {
            Self {
                label: AI_BUSY_LABEL,
                disabled: true,
            }
        } else {
            Self {
                label: AI_BUTTON_LABEL,
                disabled: false,
            }
        }
    }
}

pub fn append_explanation(draft: &str, explanation: &str) -> String {
    format!("{}\n\n{}\n{}", draft, EXPLANATION_MARKER, explanation.trim())
}

impl<B: Backend> Reader<B> {
    /// Ask the explanation endpoint about the current draft.
    ///
    /// The trigger is disabled while the request is outstanding; triggering it
    /// again in that window does nothing.
    pub async fn ask_ai(&self) -> Result<(), ReaderError> {
        let Some(_busy) = FlagGuard::acquire(&self.state, Flag::AskingAi) else {
            return Ok(());
        };

        let text = self.state.borrow().draft.trim().to_string();
        if text.is_empty() {
            return Err(self.reject("Please type a question or note first."));
        }

        let request = ExplainRequest {
            text,
            ebook_id: self.ebook_id,
        };
        match self.backend.explain(&request).await {
            Ok(answer) => {
                let mut state = self.state.borrow_mut();
                state.draft = append_explanation(&state.draft, &answer.explanation);
                state.scroll_draft_to_end = true;
                Ok(())
            }
            Err(e) => {
                warn!("AI explanation failed: {}", e);
                self.notify_error("The AI assistant is unavailable right now.");
                Err(e)
            }
        }
    }
}
