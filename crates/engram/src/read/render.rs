//! Terminal frames for a reading session.

use colored::Colorize;
use engram_core::block::BlockRef;
use engram_core::reader::ReadingSession;
use engram_core::view::{split_pivot, RenderSignature, StopCard, UpwardStream, WordDisplay};

/// Columns assumed when the terminal size is unknown.
const FALLBACK_WIDTH: usize = 80;

pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(FALLBACK_WIDTH)
}

/// Left padding that puts the pivot of `word` on the centre column.
pub fn pivot_padding(word: &str, width: usize) -> usize {
    let (before, _, _) = split_pivot(word);
    (width / 2).saturating_sub(before.chars().count())
}

/// A word with its pivot highlighted, aligned on the centre column.
pub fn word_line(word: &str, width: usize) -> String {
    let (before, pivot, after) = split_pivot(word);
    format!(
        "{}{}{}{}",
        " ".repeat(pivot_padding(word, width)),
        before,
        pivot.red().bold(),
        after
    )
}

fn status_line(signature: &RenderSignature, wpm: u32) -> String {
    format!(
        "{}  {} wpm  [{}]",
        signature.progress,
        wpm,
        signature.controls.label
    )
    .dimmed()
    .to_string()
}

fn card_lines(card: &StopCard) -> Vec<String> {
    let mut lines = vec![card.note.bold().yellow().to_string()];
    if !card.table_rows.is_empty() {
        lines.extend(card.table_rows.iter().map(|row| format!("  | {} |", row.join(" | "))));
    } else if !card.list_items.is_empty() {
        lines.extend(card.list_items.iter().map(|item| format!("  • {}", item)));
    } else if let Some(code) = &card.code {
        lines.push(format!("  {}", code));
    } else {
        lines.push(format!("  {}", card.preview_text));
    }
    lines
}

/// The full frame for the session.
pub fn frame<B: BlockRef>(session: &ReadingSession<B>, signature: &RenderSignature, width: usize) -> String {
    let body = match &signature.display {
        WordDisplay::Word { .. } => session
            .current_word()
            .map(|word| word_line(word, width))
            .unwrap_or_default(),
        WordDisplay::HeaderStop { header_text, .. } => format!(
            "{}\n{}",
            header_text.bold(),
            engram_core::view::HEADER_STOP_NOTE.yellow()
        ),
        WordDisplay::Checkpoint(card) => card_lines(card).join("\n"),
        WordDisplay::Empty => String::new(),
    };
    format!("{}\n{}", body, status_line(signature, session.wpm))
}

/// The upward stream as plain lines, oldest first.
pub fn history_lines(stream: &UpwardStream) -> Vec<String> {
    let mut lines: Vec<String> = stream
        .history
        .iter()
        .map(|entry| format!("{} {}", entry.label.cyan(), entry.text))
        .collect();
    for checkpoint in &stream.checkpoints {
        let marker = if checkpoint.pending { "pending" } else { "done" };
        lines.push(format!(
            "{} [{}] {}",
            checkpoint.title.yellow(),
            marker,
            checkpoint.preview_text
        ));
    }
    if let Some(current) = &stream.current {
        lines.push(format!(
            "{} {} {} ({}/{})",
            current.label.cyan().bold(),
            current.read_text,
            current.remaining_text.dimmed(),
            current.read_words,
            current.total_words
        ));
    }
    lines
}
