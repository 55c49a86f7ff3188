use std::io::Write;
use std::time::Duration;

use engram_core::clock::SystemClock;
use engram_core::continuation::SequenceProvider;
use engram_core::machine::ReaderState;
use engram_core::reader::{Key, Reader};
use engram_core::tree::DocBlock;
use engram_core::view::{render_signature, upward_stream, FrameCache};
use pdf::ExtractionMode;
use tokio::io::AsyncBufReadExt;

use crate::config::{load_settings, SettingsArgs};
use crate::document::ReadingDocument;
use crate::prelude::{eprintln, println, *};

mod input;
mod render;

use input::{parse_command, Command, HELP, WPM_STEP};

/// Longest sleep while no tick is pending.
const IDLE_POLL: Duration = Duration::from_secs(3600);

#[derive(Debug, clap::Parser)]
#[command(name = "read")]
#[command(about = "Read a PDF word by word")]
pub struct App {
    /// Path to the PDF file
    path: std::path::PathBuf,

    /// Extraction mode: website or semantic
    #[arg(long, env = "ENGRAM_MODE", default_value = "website")]
    mode: ExtractionMode,

    /// First page to read (1-based)
    #[arg(long, default_value = "1")]
    start_page: usize,

    /// Number of pages to read before auto-continue takes over
    #[arg(long, default_value = "1")]
    pages: usize,

    #[clap(flatten)]
    overrides: SettingsArgs,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let settings = load_settings(&global, &app.overrides)?;
    let doc = crate::blocks::extract(app.path.clone(), app.mode).await?;
    let (selected, rest) = pdf::split_pages(&doc, app.start_page, app.pages)
        .map_err(|e| Error::InvalidPageRange(e.to_string()))?;

    if global.verbose {
        eprintln!(
            "reading {} blocks, {} more available, settings {:?}",
            selected.len(),
            rest.len(),
            settings
        );
    }

    let document = ReadingDocument::new(&selected, &rest);
    let mut reader: Reader<DocBlock> = Reader::new(settings, Box::new(SystemClock::new()))
        .with_provider(Box::new(SequenceProvider::new(document.rest.clone())));

    reader.toggle_selection_command();
    for block in &document.selected {
        reader.toggle_selection(block.clone());
    }
    if !reader.handle_key(Key::Enter) {
        return Err(Error::NoReadableText.into());
    }

    eprintln!("{}", HELP.dimmed());
    reading_loop(&mut reader).await
}

async fn reading_loop(reader: &mut Reader<DocBlock>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            // A pending stdin read would hold up runtime shutdown
            let quit = parse_command(&line) == Some(Command::Quit);
            if tx.send(line).is_err() || quit {
                break;
            }
        }
    });

    let mut cache = FrameCache::new();
    loop {
        draw(reader, &mut cache)?;
        if reader.state() != ReaderState::Reading {
            return Ok(());
        }

        let delay = reader
            .next_tick_at()
            .map(|at| Duration::from_millis(at.saturating_sub(reader.now_ms())))
            .unwrap_or(IDLE_POLL);

        tokio::select! {
            _ = tokio::time::sleep(delay), if reader.next_tick_at().is_some() => {
                reader.fire_due_tick();
            }
            line = rx.recv() => {
                let Some(line) = line else {
                    return Ok(());
                };
                match parse_command(&line) {
                    Some(command) => apply(reader, command),
                    None => eprintln!("{}", HELP.dimmed()),
                }
            }
        }
    }
}

fn apply(reader: &mut Reader<DocBlock>, command: Command) {
    let wpm = reader.session().map(|s| s.wpm).unwrap_or_default();
    match command {
        Command::Enter if reader.is_stop_active() => {
            reader.handle_key(Key::Enter);
        }
        Command::Enter | Command::TogglePlay => {
            reader.handle_key(Key::Space);
        }
        Command::Rewind if !reader.is_stop_active() => reader.rewind(),
        Command::Rewind => {}
        Command::Faster => reader.set_wpm(f64::from(wpm + WPM_STEP)),
        Command::Slower => reader.set_wpm(f64::from(wpm.saturating_sub(WPM_STEP))),
        Command::Seek(word) => reader.seek(word.saturating_sub(1)),
        Command::History => {
            if let Some(session) = reader.session() {
                for line in render::history_lines(&upward_stream(session)) {
                    println!("{}", line);
                }
            }
        }
        Command::Quit => {
            reader.handle_key(Key::Escape);
        }
    }
}

fn draw(reader: &Reader<DocBlock>, cache: &mut FrameCache) -> Result<()> {
    let Some(session) = reader.session() else {
        cache.reset();
        return Ok(());
    };
    let signature = render_signature(session);
    if !cache.should_render(&signature) {
        return Ok(());
    }

    let frame = render::frame(session, &signature, render::terminal_width());
    // Clear the screen and home the cursor before each frame
    println!("\x1b[2J\x1b[H{}", frame);
    std::io::stdout().flush()?;
    Ok(())
}
