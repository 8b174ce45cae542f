//! Headless driver for the journal reader.
//!
//! Loads the configured document through the same view-model a UI would use,
//! prints the page map, then lists the ebook's journals and the notes of the
//! first one. Handy for checking a deployment end to end.
//!
//! Configuration comes from `READER_*` environment variables; see
//! `ReaderConfig::from_env`.

use std::fs::File;

use anyhow::{Context, Result};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use journal_reader::panel::{AnnotationListView, LayerListView};
use journal_reader::{HttpBackend, PdfLoader, Reader, ReaderConfig};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = ReaderConfig::from_env()?;

    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(&config.log_file)
            .with_context(|| format!("Cannot create log file {}", config.log_file.display()))?,
    )?;
    info!("Starting journal reader for ebook {}", config.ebook_id);

    let backend = HttpBackend::new(config.api_base.clone(), config.session_cookie.as_deref())?;
    let reader = Reader::from_config(backend, &config);
    let loader = PdfLoader::new()?;

    let result = reader.load_document(&loader, &config.document_url).await;
    print_notices(&reader);
    let total_pages = result?;

    let layout = reader.layout();
    println!("{} ({} pages)", config.document_url, total_pages);
    for surface in layout.surfaces() {
        let first_line = surface.text_layer.lines.first().map(String::as_str).unwrap_or("");
        println!(
            "  {:<14} top={:>8.0}px  {:>4} lines  {}",
            surface.id,
            surface.top,
            surface.text_layer.lines.len(),
            first_line
        );
    }

    if reader.refresh_layers().await.is_err() {
        print_notices(&reader);
        return Ok(());
    }

    let first_layer = match reader.snapshot().layers {
        LayerListView::Options(options) => {
            println!("\nJournals:");
            for option in &options {
                println!("  [{}] {}", option.id, option.label);
            }
            options.first().map(|o| o.id)
        }
        _ => {
            println!("\nNo journals yet.");
            None
        }
    };

    if let Some(layer_id) = first_layer {
        let _ = reader.select_layer(Some(layer_id)).await;
        match reader.snapshot().annotations {
            AnnotationListView::Cards(cards) => {
                println!("\nNotes in journal {}:", layer_id);
                for card in cards {
                    let location = card.location.as_deref().unwrap_or("-");
                    println!("  #{} {} ({}): {}", card.id, card.author_name, location, card.content);
                    if let Some(quote) = card.quote.as_deref() {
                        println!("      \"{}\"", quote);
                    }
                }
            }
            view => {
                println!("\n{}", view.placeholder().unwrap_or(""));
            }
        }
    }

    print_notices(&reader);
    Ok(())
}

fn print_notices(reader: &Reader<HttpBackend>) {
    for notice in reader.take_notices() {
        eprintln!("{:?}: {}", notice.level, notice.message);
    }
}
