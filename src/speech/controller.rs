use super::synthesizer::{SpeechEffect, SpeechEvent, SpeechEventKind, Utterance};
use crate::boundary::{WordBoundaryState, WordBoundaryTracker};
use crate::queue::ReadingQueue;
use crate::segmenter::{TextSegmenter, floor_char_boundary};
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

const MIN_RATE: f32 = 0.1;
const MAX_RATE: f32 = 10.0;

/// Why playback was last paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PauseSource {
    ButtonClick,
    VoiceSettingsChange,
    EngineInterrupt,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// The utterance the engine currently holds.
#[derive(Debug, Clone, Copy)]
struct LiveUtterance {
    id: u64,
    length: usize,
}

#[derive(Debug)]
pub struct SpeechController {
    queue: ReadingQueue,
    tracker: WordBoundaryTracker,
    is_speech_active: bool,
    is_audio_currently_playing: bool,
    has_speech_been_triggered: bool,
    paused: bool,
    pause_source: Option<PauseSource>,
    utterance_id: u64,
    live: Option<LiveUtterance>,
    rate: f32,
    voice: Option<String>,
    lang: String,
    max_speech_length: usize,
}

impl SpeechController {
    pub fn new(rate: f32, max_speech_length: usize, lang: &str) -> Self {
        Self {
            queue: ReadingQueue::default(),
            tracker: WordBoundaryTracker::new(),
            is_speech_active: false,
            is_audio_currently_playing: false,
            has_speech_been_triggered: false,
            paused: false,
            pause_source: None,
            utterance_id: 0,
            live: None,
            rate: rate.clamp(MIN_RATE, MAX_RATE),
            voice: None,
            lang: lang.to_string(),
            max_speech_length: max_speech_length.max(1),
        }
    }

    pub fn queue(&self) -> &ReadingQueue {
        &self.queue
    }

    pub fn boundary(&self) -> WordBoundaryState {
        self.tracker.snapshot()
    }

    pub fn is_speech_active(&self) -> bool {
        self.is_speech_active
    }

    pub fn is_audio_currently_playing(&self) -> bool {
        self.is_audio_currently_playing
    }

    pub fn has_speech_been_triggered(&self) -> bool {
        self.has_speech_been_triggered
    }

    pub fn pause_source(&self) -> Option<PauseSource> {
        self.pause_source
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    /// Links stay hidden from the first play until a pause, stop or finish,
    /// whether or not the engine has reported audio yet.
    pub fn links_suppressed(&self) -> bool {
        self.is_speech_active && !self.paused
    }

    pub fn state(&self) -> PlaybackState {
        if !self.has_speech_been_triggered {
            PlaybackState::Idle
        } else if self.queue.is_exhausted() {
            PlaybackState::Finished
        } else if self.paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        let clamped = rate.clamp(MIN_RATE, MAX_RATE);
        if clamped != rate {
            debug!(requested = rate, clamped, "Clamped speech rate");
        }
        self.rate = clamped;
    }

    pub fn set_lang(&mut self, lang: &str) {
        self.lang = lang.to_string();
    }

    /// Begin reading `queue` from its first unit.
    pub fn start(&mut self, queue: ReadingQueue, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        self.start_at(queue, 0, 0, segmenter)
    }

    /// Begin reading `queue` at `offset` bytes into unit `unit`. Used for
    /// selection-initiated play; the boundary tracker always starts over.
    pub fn start_at(
        &mut self,
        queue: ReadingQueue,
        unit: usize,
        offset: usize,
        segmenter: &TextSegmenter,
    ) -> Vec<SpeechEffect> {
        let mut effects = self.drop_live();
        self.queue = queue;
        self.queue.seek(unit);
        self.tracker.reset_to(offset);
        self.is_speech_active = true;
        self.has_speech_been_triggered = true;
        self.paused = false;
        self.pause_source = None;
        info!(
            units = self.queue.len(),
            unit,
            offset,
            "Starting read aloud"
        );
        effects.extend(self.speak_current(segmenter));
        effects
    }

    /// Resume after a pause. A paused engine utterance is resumed in place;
    /// otherwise the current chunk is submitted again.
    pub fn play(&mut self, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        if !self.has_speech_been_triggered || self.queue.is_exhausted() {
            debug!("Nothing to resume");
            return Vec::new();
        }
        if !self.paused {
            return Vec::new();
        }
        self.paused = false;
        self.is_speech_active = true;
        if self.live.is_some() {
            info!(pause_source = ?self.pause_source, "Resuming paused utterance");
            self.is_audio_currently_playing = true;
            return vec![SpeechEffect::Resume];
        }
        info!(
            start = self.tracker.snapshot().speech_utterance_start_index,
            "Resubmitting current chunk"
        );
        self.speak_current(segmenter)
    }

    /// Pause without moving the cursor. Safe to call at any time.
    pub fn pause(&mut self, source: PauseSource) -> Vec<SpeechEffect> {
        if !self.has_speech_been_triggered || self.paused || self.queue.is_exhausted() {
            return Vec::new();
        }
        info!(?source, "Pausing read aloud");
        self.paused = true;
        self.pause_source = Some(source);
        self.is_audio_currently_playing = false;
        match self.live {
            Some(_) => vec![SpeechEffect::Pause],
            None => Vec::new(),
        }
    }

    /// Final stop: cancel, forget the queue and deactivate speech.
    pub fn reset(&mut self) -> Vec<SpeechEffect> {
        let effects = self.drop_live();
        if self.has_speech_been_triggered || !self.queue.is_empty() {
            info!("Stopping read aloud");
        }
        self.queue.clear();
        self.tracker.reset();
        self.is_speech_active = false;
        self.is_audio_currently_playing = false;
        self.has_speech_been_triggered = false;
        self.paused = false;
        self.pause_source = None;
        effects
    }

    pub fn next_unit(&mut self, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        if self.queue.is_empty() || self.queue.is_exhausted() {
            return Vec::new();
        }
        self.queue.advance();
        self.after_navigation(segmenter)
    }

    /// Clamped at the first unit.
    pub fn previous_unit(&mut self, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        if !self.queue.retreat() {
            return Vec::new();
        }
        self.after_navigation(segmenter)
    }

    /// Apply a new voice. Progress in the current chunk is folded in so the
    /// resubmitted text starts from the last spoken point.
    pub fn on_voice_changed(
        &mut self,
        voice: Option<String>,
        same_language: bool,
        segmenter: &TextSegmenter,
    ) -> Vec<SpeechEffect> {
        self.voice = voice;
        if !self.has_speech_been_triggered || self.queue.is_exhausted() {
            return Vec::new();
        }
        self.tracker.on_utterance_advance();
        self.tracker.on_voice_changed(same_language);
        let mut effects = self.drop_live();
        if self.paused {
            self.pause_source = Some(PauseSource::VoiceSettingsChange);
        } else {
            effects.extend(self.speak_current(segmenter));
        }
        effects
    }

    pub fn on_event(&mut self, event: SpeechEvent, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        let Some(live) = self.live.filter(|live| live.id == event.utterance_id) else {
            debug!(
                utterance_id = event.utterance_id,
                current = self.utterance_id,
                "Ignoring stale speech event"
            );
            return Vec::new();
        };

        match event.kind {
            SpeechEventKind::Start => {
                self.tracker.on_utterance_start();
                self.is_audio_currently_playing = !self.paused;
                Vec::new()
            }
            SpeechEventKind::Boundary { index, length } => {
                self.tracker
                    .update_boundary(index.min(live.length), length);
                Vec::new()
            }
            SpeechEventKind::End => self.on_chunk_end(live, segmenter),
            SpeechEventKind::Error { message } => {
                warn!(utterance_id = live.id, %message, "Speech engine error; pausing");
                self.live = None;
                self.tracker.on_utterance_advance();
                self.paused = true;
                self.pause_source = Some(PauseSource::EngineInterrupt);
                self.is_audio_currently_playing = false;
                Vec::new()
            }
        }
    }

    fn on_chunk_end(&mut self, live: LiveUtterance, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        self.live = None;
        self.tracker.finish_chunk(live.length);
        let unit_len = self.queue.current().map_or(0, |unit| unit.text.len());
        if self.tracker.snapshot().speech_utterance_start_index >= unit_len {
            self.queue.advance();
            self.tracker.reset();
        }
        if self.paused {
            return Vec::new();
        }
        self.speak_current(segmenter)
    }

    fn after_navigation(&mut self, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        self.tracker.reset();
        let mut effects = self.drop_live();
        debug!(cursor = self.queue.cursor(), "Moved to another unit");
        if self.paused {
            return effects;
        }
        effects.extend(self.speak_current(segmenter));
        effects
    }

    /// Submit the next chunk of the current unit, skipping units with
    /// nothing speakable. Ends speech once the queue runs out.
    fn speak_current(&mut self, segmenter: &TextSegmenter) -> Vec<SpeechEffect> {
        loop {
            let Some(unit) = self.queue.current() else {
                self.finish();
                return Vec::new();
            };
            let start = floor_char_boundary(
                &unit.text,
                self.tracker.snapshot().speech_utterance_start_index,
            );
            let remaining = &unit.text[start..];
            let length = segmenter.get_accessible_boundary(remaining, self.max_speech_length);
            let chunk = &remaining[..length];
            if chunk.trim().is_empty() {
                let leading = remaining.len() - remaining.trim_start().len();
                if leading < remaining.len() {
                    debug!(start, skipped = leading, "Skipping whitespace run inside unit");
                    self.tracker.finish_chunk(leading);
                    continue;
                }
                self.queue.advance();
                self.tracker.reset();
                continue;
            }

            self.utterance_id = self.utterance_id.wrapping_add(1);
            let utterance = Utterance {
                id: self.utterance_id,
                text: chunk.to_string(),
                voice: self.voice.clone(),
                lang: self.lang.clone(),
                rate: self.rate,
            };
            debug!(
                utterance_id = utterance.id,
                unit = self.queue.cursor(),
                start,
                length,
                "Submitting utterance"
            );
            self.live = Some(LiveUtterance {
                id: utterance.id,
                length,
            });
            return vec![SpeechEffect::Speak(utterance)];
        }
    }

    fn finish(&mut self) {
        if self.is_speech_active {
            info!(units = self.queue.len(), "Read aloud finished");
        }
        self.queue.finish();
        self.tracker.reset();
        self.live = None;
        self.is_speech_active = false;
        self.is_audio_currently_playing = false;
        self.paused = false;
    }

    /// Cancel whatever the engine holds.
    fn drop_live(&mut self) -> Vec<SpeechEffect> {
        self.is_audio_currently_playing = false;
        match self.live.take() {
            Some(live) => {
                debug!(utterance_id = live.id, "Cancelling live utterance");
                vec![SpeechEffect::Cancel]
            }
            None => Vec::new(),
        }
    }
}
