//! The reading engine.
//!
//! [`Reader`] owns everything a reading context needs: the top-level
//! [`ReaderState`], the selection, the live [`ReadingSession`], the clock and
//! the auto-continue provider. All mutation goes through its operations.
//!
//! Ticking is cooperative. The reader never sleeps; it exposes the single
//! pending tick target through [`Reader::next_tick_at`] and the host calls
//! [`Reader::fire_due_tick`] once the clock reaches it.
//!
//! ```text
//! tick(scheduled)
//!   ├─ header boundary due?      -> pause (blocked_header)
//!   ├─ checkpoint boundary due?  -> pause (pending_stop)
//!   ├─ at last word?             -> auto-continue, or finish
//!   └─ advance, reschedule at max(now + 1, scheduled + interval)
//! ```

use crate::block::{BlockId, BlockRef, SemanticType, StopKind};
use crate::clock::Clock;
use crate::continuation::{Continuation, ContinuationProvider};
use crate::machine::{validate_transition, ReaderState};
use crate::settings::{normalize_wpm, Settings};
use crate::stops::{
    block_stop, boundary_stop, initial_stop, push_checkpoint, CheckpointRecord, StopEntry,
    StopSignature, StopSource,
};
use crate::stream::WordStream;

/// Words stepped back by [`Reader::rewind`].
pub const REWIND_WORDS: usize = 10;

/// Keys the reader reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Other,
}

/// Which input listeners the current state has attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Listeners {
    pub selection: bool,
    pub reading_keys: bool,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session, or the session is paused.
    Skipped,
    /// Moved to the next word.
    Advanced,
    /// Paused at a header boundary or checkpoint.
    Stopped,
    /// Auto-continue appended a block.
    Continued,
    /// Reached the end of the stream with nothing to continue into.
    Finished,
    /// The stream was empty and the session ended.
    Ended,
}

// ---------------------------------------------------------------------------
// ReadingSession
// ---------------------------------------------------------------------------

/// State of one reading session. Created on entering `Reading` and dropped
/// on leaving it.
#[derive(Debug, Clone)]
pub struct ReadingSession<B> {
    pub stream: WordStream<B>,
    /// Settings copied at session start.
    pub settings: Settings,
    pub current_index: usize,
    pub wpm: u32,
    pub is_playing: bool,
    pub pending_stop: Option<StopEntry<B>>,
    pub blocked_header: Option<usize>,
    pub released_header: Option<usize>,
    pub released_signature: Option<StopSignature>,
    pub released_anchor: Option<BlockId>,
    pub checkpoint_history: Vec<CheckpointRecord<B>>,
    pub initial_word_count: usize,
    pub auto_continue_started: bool,
    /// Last document block taken into the stream, where auto-continue
    /// resumes its walk.
    pub last_source: Option<B>,
    next_tick_at: Option<u64>,
}

impl<B: BlockRef> ReadingSession<B> {
    pub fn new(stream: WordStream<B>, settings: Settings) -> Self {
        let last_source = stream.blocks.last().and_then(|b| b.source.clone());
        ReadingSession {
            initial_word_count: stream.len(),
            wpm: normalize_wpm(settings.wpm as f64),
            stream,
            settings,
            current_index: 0,
            is_playing: true,
            pending_stop: None,
            blocked_header: None,
            released_header: None,
            released_signature: None,
            released_anchor: None,
            checkpoint_history: Vec::new(),
            auto_continue_started: false,
            last_source,
            next_tick_at: None,
        }
    }

    pub fn total_words(&self) -> usize {
        self.stream.len()
    }

    pub fn current_word(&self) -> Option<&str> {
        self.stream.words.get(self.current_index).map(String::as_str)
    }

    pub fn interval_ms(&self) -> u64 {
        60_000 / u64::from(self.wpm.max(1))
    }

    pub fn next_tick_at(&self) -> Option<u64> {
        self.next_tick_at
    }

    /// Text of the heading playback is paused before, if a header stop is
    /// active.
    pub fn header_stop_text(&self) -> Option<&str> {
        if self.is_playing || self.blocked_header != Some(self.current_index) {
            return None;
        }
        let (_, next) = self.stream.boundary_at(self.current_index)?;
        let block = &self.stream.blocks[next];
        (block.semantic_type() == SemanticType::Header).then_some(block.text.as_str())
    }

    pub fn is_header_stop_active(&self) -> bool {
        self.header_stop_text().is_some()
    }

    pub fn is_checkpoint_active(&self) -> bool {
        !self.is_playing && self.pending_stop.is_some()
    }

    pub fn is_stop_active(&self) -> bool {
        self.is_header_stop_active() || self.is_checkpoint_active()
    }

    fn schedule(&mut self, at: u64) {
        self.next_tick_at = Some(at);
    }

    fn clear_timer(&mut self) {
        self.next_tick_at = None;
    }

    /// Schedule the next tick one interval from `now`. Returns `false` for
    /// an empty stream.
    fn start_playback(&mut self, now: u64) -> bool {
        if self.stream.is_empty() {
            return false;
        }
        self.schedule(now + self.interval_ms());
        true
    }

    fn activate_stop(&mut self, stop: StopEntry<B>) {
        log::debug!(
            "checkpoint {} at word {} ({:?})",
            stop.kind.as_str(),
            self.current_index,
            stop.source
        );
        self.pending_stop = Some(StopEntry {
            pending: true,
            ..stop
        });
        self.is_playing = false;
        self.clear_timer();
    }

    fn try_header_stop(&mut self) -> bool {
        if !self.settings.stop_before_header {
            return false;
        }
        let index = self.current_index;
        let Some((_, next)) = self.stream.boundary_at(index) else {
            return false;
        };
        if self.stream.blocks[next].semantic_type() != SemanticType::Header {
            return false;
        }

        if self.released_header == Some(index) {
            self.released_header = None;
            self.blocked_header = None;
            return false;
        }

        log::debug!("header stop at word {}", index);
        self.blocked_header = Some(index);
        self.is_playing = false;
        self.clear_timer();
        true
    }

    fn try_checkpoint_stop(&mut self) -> bool {
        if !self.settings.stop_before_media || self.pending_stop.is_some() {
            return false;
        }
        let Some((current, next)) = self.stream.boundary_at(self.current_index) else {
            return false;
        };
        let Some(stop) = boundary_stop(&self.stream, current, next) else {
            return false;
        };

        if self.released_signature == Some(stop.signature) {
            return false;
        }

        self.activate_stop(stop);
        true
    }

    fn try_initial_stop(&mut self) -> bool {
        if !self.settings.stop_before_media {
            return false;
        }
        match initial_stop(&self.stream) {
            Some(stop) => {
                self.activate_stop(stop);
                true
            }
            None => false,
        }
    }

    /// Walk the provider from the last source block until a block is
    /// appended or a checkpoint activates.
    fn try_auto_continue(
        &mut self,
        now: u64,
        scheduled: u64,
        provider: Option<&dyn ContinuationProvider<B>>,
    ) -> Option<TickOutcome> {
        if !self.settings.auto_continue {
            return None;
        }
        let provider = provider?;
        let mut cursor = self.last_source.clone()?;

        loop {
            let next = provider.next_block(&cursor)?;
            cursor = next.block().clone();
            self.last_source = Some(cursor.clone());

            match next {
                Continuation::Stop(block) => {
                    if !self.settings.stop_before_media
                        || self.released_anchor == Some(block.id())
                    {
                        continue;
                    }
                    if let Some(stop) = block_stop(&block, StopSource::AutoContinue) {
                        self.activate_stop(stop);
                        return Some(TickOutcome::Stopped);
                    }
                }
                Continuation::Readable(block) => {
                    let id = block.id();
                    if self.stream.push_block(block) {
                        log::debug!("auto-continued into block {}", id);
                        self.released_anchor = None;
                        self.auto_continue_started = true;
                        self.schedule((now + 1).max(scheduled + self.interval_ms()));
                        return Some(TickOutcome::Continued);
                    }
                }
            }
        }
    }

    /// One playback step for the tick that was due at `scheduled`.
    pub fn tick(
        &mut self,
        now: u64,
        scheduled: u64,
        provider: Option<&dyn ContinuationProvider<B>>,
    ) -> TickOutcome {
        if !self.is_playing {
            return TickOutcome::Skipped;
        }
        if self.stream.is_empty() {
            return TickOutcome::Ended;
        }
        if self.try_header_stop() || self.try_checkpoint_stop() {
            return TickOutcome::Stopped;
        }

        let last = self.stream.len() - 1;
        if self.current_index >= last {
            if let Some(outcome) = self.try_auto_continue(now, scheduled, provider) {
                return outcome;
            }
            self.is_playing = false;
            self.clear_timer();
            return TickOutcome::Finished;
        }

        self.current_index += 1;
        if self
            .blocked_header
            .is_some_and(|blocked| self.current_index > blocked)
        {
            self.blocked_header = None;
            self.released_header = None;
        }
        if self
            .released_signature
            .and_then(|signature| signature.key.word_index())
            .is_some_and(|released| self.current_index > released)
        {
            self.released_signature = None;
        }
        self.schedule((now + 1).max(scheduled + self.interval_ms()));
        TickOutcome::Advanced
    }

    /// Jump past the contiguous run of list blocks a list checkpoint
    /// previewed. Returns `true` when the cursor moved.
    fn skip_list_after_checkpoint(&mut self, stop: &StopEntry<B>) -> bool {
        if stop.kind != StopKind::List || stop.source != StopSource::SemanticBoundary {
            return false;
        }
        let blocks = &self.stream.blocks;
        let within_anchor = |source: &Option<B>| match (source, stop.anchor.as_ref()) {
            (Some(source), Some(anchor)) => {
                source.id() == anchor.id() || source.has_ancestor(anchor)
            }
            _ => false,
        };

        let start = blocks
            .iter()
            .position(|b| b.is_list() && within_anchor(&b.source))
            .or_else(|| {
                blocks
                    .iter()
                    .position(|b| b.is_list() && b.start >= self.current_index)
            });
        let Some(start) = start else {
            return false;
        };

        let mut end = start;
        while end + 1 < blocks.len() && blocks[end + 1].is_list() {
            end += 1;
        }
        let end_word = blocks[end].end;
        if end_word < self.current_index {
            return false;
        }

        self.current_index = end_word.min(self.stream.len().saturating_sub(1));
        true
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// An owned reading context.
pub struct Reader<B: BlockRef + 'static> {
    state: ReaderState,
    settings: Settings,
    clock: Box<dyn Clock>,
    provider: Option<Box<dyn ContinuationProvider<B>>>,
    selection: Vec<B>,
    session: Option<ReadingSession<B>>,
    listeners: Listeners,
    staged: Option<WordStream<B>>,
}

impl<B: BlockRef + 'static> Reader<B> {
    pub fn new(settings: Settings, clock: Box<dyn Clock>) -> Self {
        Reader {
            state: ReaderState::Idle,
            settings,
            clock,
            provider: None,
            selection: Vec::new(),
            session: None,
            listeners: Listeners::default(),
            staged: None,
        }
    }

    pub fn with_provider(mut self, provider: Box<dyn ContinuationProvider<B>>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings. A running session keeps its own copy.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn session(&self) -> Option<&ReadingSession<B>> {
        self.session.as_ref()
    }

    pub fn selection(&self) -> &[B] {
        &self.selection
    }

    pub fn listeners(&self) -> Listeners {
        self.listeners
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn is_stop_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_stop_active())
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    /// Move to `next`, running the exit hook of the current state and the
    /// enter hook of the new one. Returns `false` for a rejected transition.
    pub fn transition_to(&mut self, next: ReaderState) -> bool {
        if self.state == next {
            return true;
        }
        if validate_transition(self.state, next).is_err() {
            return false;
        }

        let previous = self.state;
        self.on_exit(previous, next);
        self.state = next;
        log::debug!("reader {} -> {}", previous, next);
        self.on_enter(next);
        true
    }

    fn on_exit(&mut self, state: ReaderState, next: ReaderState) {
        match state {
            ReaderState::Idle => {}
            ReaderState::Selecting => {
                self.listeners.selection = false;
                if next != ReaderState::Reading {
                    self.selection.clear();
                }
            }
            ReaderState::Reading => {
                self.session = None;
                self.listeners.reading_keys = false;
                self.selection.clear();
            }
        }
    }

    fn on_enter(&mut self, state: ReaderState) {
        match state {
            ReaderState::Idle => {}
            ReaderState::Selecting => {
                self.selection.clear();
                self.listeners.selection = true;
            }
            ReaderState::Reading => {
                let stream = self.staged.take().unwrap_or_default();
                self.session = Some(ReadingSession::new(stream, self.settings.clone()));
                self.listeners.reading_keys = true;
                self.mount();
            }
        }
    }

    /// First step of a new session: an initial checkpoint or playback.
    fn mount(&mut self) {
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.try_initial_stop() {
            return;
        }
        if !session.start_playback(now) {
            log::info!("nothing to read");
            self.stop();
        }
    }

    /// Idle enters selection mode; any other state returns to Idle.
    pub fn toggle_selection_command(&mut self) {
        if self.state == ReaderState::Idle {
            self.transition_to(ReaderState::Selecting);
        } else {
            self.transition_to(ReaderState::Idle);
        }
    }

    /// End the session, if any, and return to Idle.
    pub fn stop(&mut self) {
        self.transition_to(ReaderState::Idle);
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Add `block` to the selection or remove it. Returns whether the block
    /// is selected afterwards.
    pub fn toggle_selection(&mut self, block: B) -> bool {
        if self.state != ReaderState::Selecting {
            return false;
        }

        let id = block.id();
        if let Some(position) = self.selection.iter().position(|b| b.id() == id) {
            self.selection.remove(position);
            return false;
        }
        if self.selection.iter().any(|s| block.has_ancestor(s)) {
            return false;
        }

        self.selection.retain(|s| !s.has_ancestor(&block));
        self.selection.push(block);
        true
    }

    /// Read the selected blocks in document order.
    pub fn start_reading_from_selection(&mut self) -> bool {
        if self.state != ReaderState::Selecting {
            return false;
        }

        let mut blocks = self.selection.clone();
        blocks.sort_by_key(|b| b.id());
        blocks.dedup_by_key(|b| b.id());
        let normalized: Vec<B> = blocks
            .iter()
            .filter(|b| !blocks.iter().any(|other| b.has_ancestor(other)))
            .cloned()
            .collect();

        if normalized.is_empty() {
            return false;
        }
        self.start_reading(WordStream::from_blocks(normalized))
    }

    /// Start a session over `stream`. An empty stream is refused.
    pub fn start_reading(&mut self, stream: WordStream<B>) -> bool {
        if stream.is_empty() {
            log::info!("no readable text in selection");
            return false;
        }
        if self.state == ReaderState::Reading {
            self.stop();
        }

        self.staged = Some(stream);
        let entered = self.transition_to(ReaderState::Reading);
        self.staged = None;
        entered && self.state == ReaderState::Reading
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    pub fn next_tick_at(&self) -> Option<u64> {
        self.session.as_ref().and_then(|s| s.next_tick_at())
    }

    /// Run the pending tick if the clock has reached it.
    pub fn fire_due_tick(&mut self) -> Option<TickOutcome> {
        let due = self.next_tick_at()?;
        let now = self.clock.now_ms();
        if now < due {
            return None;
        }
        if let Some(session) = self.session.as_mut() {
            session.clear_timer();
        }
        Some(self.run_tick(now, due))
    }

    fn run_tick(&mut self, now: u64, scheduled: u64) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Skipped;
        };
        let outcome = session.tick(now, scheduled, self.provider.as_deref());
        if outcome == TickOutcome::Ended {
            self.stop();
        }
        outcome
    }

    /// Play or pause. Ignored while a stop is active. Playing from the last
    /// word restarts at the first.
    pub fn toggle_play(&mut self) {
        if self.state != ReaderState::Reading {
            return;
        }
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_stop_active() {
            return;
        }

        if !session.is_playing && session.current_index >= session.total_words().saturating_sub(1) {
            session.current_index = 0;
            session.auto_continue_started = false;
            session.blocked_header = None;
            session.released_header = None;
            session.released_signature = None;
            session.released_anchor = None;
        }

        session.is_playing = !session.is_playing;
        if !session.is_playing {
            session.clear_timer();
        } else if !session.start_playback(now) {
            self.stop();
        }
    }

    /// Release the active stop and resume. Returns `false` when no stop is
    /// active.
    pub fn acknowledge(&mut self) -> bool {
        if self.state != ReaderState::Reading {
            return false;
        }
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.is_stop_active() {
            return false;
        }

        if session.blocked_header == Some(session.current_index) {
            session.released_header = Some(session.current_index);
        }

        let mut skipped = false;
        if session.is_checkpoint_active() {
            if let Some(stop) = session.pending_stop.take() {
                push_checkpoint(&mut session.checkpoint_history, &stop, now);
                match stop.source {
                    StopSource::SemanticBoundary => {
                        session.released_signature = Some(stop.signature)
                    }
                    StopSource::AutoContinue => {
                        session.released_anchor = stop.anchor.as_ref().map(|a| a.id())
                    }
                }
                skipped = session.skip_list_after_checkpoint(&stop);
            }
        }

        session.is_playing = true;
        if skipped {
            self.run_tick(now, now);
        } else if !session.start_playback(now) {
            self.stop();
        }
        true
    }

    /// Move the cursor to `index`, clamped into the stream. Cancels any stop.
    pub fn seek(&mut self, index: usize) {
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.stream.is_empty() {
            return;
        }

        session.current_index = index.min(session.total_words() - 1);
        session.blocked_header = None;
        session.released_header = None;
        session.pending_stop = None;
        session.released_signature = None;
        session.released_anchor = None;
        if session.is_playing {
            session.start_playback(now);
        }
    }

    /// Step back [`REWIND_WORDS`] words.
    pub fn rewind(&mut self) {
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.current_index = session.current_index.saturating_sub(REWIND_WORDS);
        if session.is_playing {
            session.start_playback(now);
        }
    }

    /// Change the session speed. Playing sessions reschedule from now.
    pub fn set_wpm(&mut self, wpm: f64) {
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.wpm = normalize_wpm(wpm);
        if session.is_playing {
            session.start_playback(now);
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    /// Dispatch a key for the current state. Returns `true` when it acted.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match self.state {
            ReaderState::Idle => false,
            ReaderState::Selecting => match key {
                Key::Enter => self.start_reading_from_selection(),
                Key::Escape => self.transition_to(ReaderState::Idle),
                _ => false,
            },
            ReaderState::Reading => {
                if key == Key::Escape {
                    self.stop();
                    return true;
                }
                if self.is_stop_active() {
                    return key == Key::Enter && self.acknowledge();
                }
                if key == Key::Space {
                    self.toggle_play();
                    return true;
                }
                false
            }
        }
    }
}
