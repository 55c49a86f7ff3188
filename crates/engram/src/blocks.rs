use engram_core::stops::truncate_preview;
use pdf::{ExtractedDocument, ExtractionMode};

use crate::prelude::{eprintln, println, *};

const TABLE_TEXT_MAX_CHARS: usize = 80;

#[derive(Debug, clap::Parser)]
#[command(name = "blocks")]
#[command(about = "Print the blocks extracted from a PDF")]
pub struct App {
    /// Path to the PDF file
    path: std::path::PathBuf,

    /// Extraction mode: website or semantic
    #[arg(long, env = "ENGRAM_MODE", default_value = "website")]
    mode: ExtractionMode,

    /// Output format
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Clone, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Page, type and text per block
    Table,
    /// Markdown document
    Markdown,
    /// JSON with pages and blocks
    Json,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let doc = extract(app.path.clone(), app.mode).await?;

    if global.verbose {
        eprintln!(
            "{} pages, {} blocks, dominant font size {:.1}",
            doc.pages.len(),
            doc.block_count(),
            doc.dominant_font_size
        );
    }

    match app.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
        OutputFormat::Markdown => println!("{}", pdf::render::markdown::render_document(&doc)),
        OutputFormat::Table => output_table(&doc),
    }

    Ok(())
}

/// Extract a PDF off the async runtime.
pub async fn extract(path: std::path::PathBuf, mode: ExtractionMode) -> Result<ExtractedDocument> {
    // lopdf parsing is synchronous and CPU bound
    let doc = tokio::task::spawn_blocking(move || pdf::extract_file(&path, mode))
        .await?
        .map_err(|e| Error::Extraction(e.to_string()))?;
    Ok(doc)
}

fn output_table(doc: &ExtractedDocument) {
    let mut table = new_table(&["Page", "Type", "Text"]);
    for (page, block) in doc.blocks() {
        table.add_row(prettytable::row![
            page,
            block.kind.label(),
            truncate_preview(&block.text, TABLE_TEXT_MAX_CHARS)
        ]);
    }
    table.printstd();
}
