//! HTML fragments for the reader's side panel and page indicator.
//!
//! These mirror the view types one to one so a server-rendered or
//! string-templated UI can draw the reader without touching its state.

use crate::dialog::LayerDialog;
use crate::panel::{AnnotationCard, AnnotationListView, LayerListView, NO_LAYERS_PLACEHOLDER};
use crate::reader::ReaderSnapshot;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Layer Selector
// ============================================================================

pub fn render_layer_options(view: &LayerListView) -> String {
    match view {
        LayerListView::NotLoaded => {
            r#"<option value="" disabled selected>Loading journals...</option>"#.to_string()
        }
        LayerListView::Empty => format!(
            r#"<option value="" disabled selected>{}</option>"#,
            NO_LAYERS_PLACEHOLDER
        ),
        LayerListView::Options(options) => {
            let mut html =
                String::from(r#"<option value="" disabled>Choose a journal...</option>"#);
            for option in options {
                html.push_str(&format!(
                    r#"<option value="{id}"{selected}>{label}</option>"#,
                    id = option.id,
                    selected = if option.selected { " selected" } else { "" },
                    label = html_escape(&option.label),
                ));
            }
            html
        }
    }
}

// ============================================================================
// Annotation Cards
// ============================================================================

pub fn render_annotation_card(card: &AnnotationCard) -> String {
    let quote = card
        .quote
        .as_deref()
        .map(|q| format!(r#"<blockquote class="note-quote">{}</blockquote>"#, html_escape(q)))
        .unwrap_or_default();

    let location = card
        .location
        .as_deref()
        .map(|loc| {
            let page_attr = card
                .page_num
                .map(|n| format!(r#" data-page="{}""#, n))
                .unwrap_or_default();
            format!(
                r#"<span class="note-location"{}>{}</span>"#,
                page_attr,
                html_escape(loc)
            )
        })
        .unwrap_or_default();

    let timestamp = card
        .timestamp
        .as_deref()
        .map(|t| format!(r#"<span class="note-time">{}</span>"#, html_escape(t)))
        .unwrap_or_default();

    let delete = if card.can_delete {
        format!(
            r#"<button class="note-delete" data-id="{}" title="Delete note">&times;</button>"#,
            card.id
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="note-card" id="annotation-{id}" data-id="{id}">
            <div class="note-header">
                <strong class="note-author">{author}</strong>
                {timestamp}
                {delete}
            </div>
            {quote}
            <p class="note-content">{content}</p>
            {location}
        </div>"#,
        id = card.id,
        author = html_escape(&card.author_name),
        timestamp = timestamp,
        delete = delete,
        quote = quote,
        content = html_escape(&card.content),
        location = location,
    )
}

pub fn render_annotation_list(view: &AnnotationListView) -> String {
    if let Some(placeholder) = view.placeholder() {
        return format!(r#"<p class="notes-placeholder">{}</p>"#, placeholder);
    }
    view.cards()
        .iter()
        .map(render_annotation_card)
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Layer Dialog
// ============================================================================

pub fn render_scope_options(dialog: &LayerDialog) -> String {
    if let Some(placeholder) = dialog.scope_placeholder() {
        return format!(r#"<option value="" disabled selected>{}</option>"#, placeholder);
    }
    dialog
        .scope_options
        .iter()
        .map(|o| {
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = html_escape(&o.value),
                selected = if o.value == dialog.selected_scope { " selected" } else { "" },
                label = html_escape(&o.label),
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

// ============================================================================
// Page Indicator
// ============================================================================

pub fn render_page_indicator(snapshot: &ReaderSnapshot) -> String {
    format!(
        r#"<button id="pdf-prev-btn"{prev}>&lsaquo;</button>
        <span id="pdf-page-info">{label}</span>
        <button id="pdf-next-btn"{next}>&rsaquo;</button>"#,
        prev = if snapshot.can_go_prev { "" } else { " disabled" },
        label = html_escape(&snapshot.page_label),
        next = if snapshot.can_go_next { "" } else { " disabled" },
    )
}
