//! Core library for engram
//!
//! This crate is the **Functional Core** of engram: the reading engine and
//! everything it needs, with no terminal or PDF I/O. The `engram` binary is
//! the Imperative Shell that extracts documents, drives the clock and draws
//! frames.
//!
//! # Module Organization
//!
//! - [`block`]: opaque block handles ([`block::BlockRef`]) and block kinds
//! - [`tree`]: an arena document tree whose handles implement `BlockRef`
//! - [`stream`]: flattening blocks into a word stream with per-block ranges
//! - [`stops`]: checkpoint entries, previews and their dedup signatures
//! - [`continuation`]: auto-continue providers
//! - [`machine`]: reader states and the transition table
//! - [`reader`]: the reading context, playback ticks and user operations
//! - [`view`]: pure view models (ORP markup, progress, upward stream)
//! - [`settings`]: reader settings and their TOML file
//! - [`clock`]: real and virtual millisecond clocks
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use engram_core::block::BlockKind;
//! use engram_core::clock::VirtualClock;
//! use engram_core::reader::Reader;
//! use engram_core::settings::Settings;
//! use engram_core::stream::WordStream;
//! use engram_core::tree::DocBlock;
//!
//! let clock = VirtualClock::new(0);
//! let mut reader: Reader<DocBlock> = Reader::new(Settings::default(), Box::new(clock.clone()));
//!
//! let mut stream = WordStream::new();
//! stream.push_text(BlockKind::Paragraph, "Read this fast", Vec::new(), None);
//! reader.start_reading(stream);
//!
//! // Drive playback deterministically
//! while let Some(at) = reader.next_tick_at() {
//!     clock.set(at);
//!     reader.fire_due_tick();
//! }
//! ```

pub mod block;
pub mod clock;
pub mod continuation;
pub mod machine;
pub mod reader;
pub mod settings;
pub mod stops;
pub mod stream;
pub mod tree;
pub mod view;
