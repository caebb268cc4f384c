//! Tracks speech-engine boundary events for the chunk currently being spoken.
//!
//! Engines report offsets relative to the utterance they were handed. A long
//! segment is spoken as several chunks, so the tracker keeps the chunk's start
//! within the segment and folds progress forward whenever a chunk finishes.

use serde::Serialize;
use tracing::{debug, trace};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BoundaryMode {
    #[default]
    NoBoundaries,
    BoundariesNotSupported,
    BoundaryDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WordBoundaryState {
    pub mode: BoundaryMode,
    /// Offset of the latest boundary, relative to the current chunk.
    pub previously_spoken_index: usize,
    /// Offset of the current chunk within the segment being spoken.
    pub speech_utterance_start_index: usize,
    pub speech_utterance_length: usize,
}

impl WordBoundaryState {
    pub fn absolute_position(&self) -> usize {
        self.speech_utterance_start_index + self.previously_spoken_index
    }
}

#[derive(Debug, Default)]
pub struct WordBoundaryTracker {
    state: WordBoundaryState,
}

impl WordBoundaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only copy for the highlight resolver.
    pub fn snapshot(&self) -> WordBoundaryState {
        self.state
    }

    pub fn mode(&self) -> BoundaryMode {
        self.state.mode
    }

    pub fn absolute_position(&self) -> usize {
        self.state.absolute_position()
    }

    /// Record a boundary relative to the current chunk. The latest event wins,
    /// even if it moves backwards.
    pub fn update_boundary(&mut self, index: usize, length: Option<usize>) {
        if self.state.mode != BoundaryMode::BoundaryDetected {
            debug!(index, "First boundary event; engine reports word boundaries");
        }
        self.state.mode = BoundaryMode::BoundaryDetected;
        self.state.previously_spoken_index = index;
        if let Some(length) = length {
            self.state.speech_utterance_length = length;
        }
        trace!(
            index,
            length = self.state.speech_utterance_length,
            absolute = self.state.absolute_position(),
            "Updated word boundary"
        );
    }

    /// Speech started; until an event proves otherwise assume the engine does
    /// not report boundaries.
    pub fn on_utterance_start(&mut self) {
        if self.state.mode == BoundaryMode::NoBoundaries {
            self.state.mode = BoundaryMode::BoundariesNotSupported;
        }
    }

    /// The previous chunk ended and the next one begins.
    pub fn on_utterance_advance(&mut self) {
        self.state.speech_utterance_start_index += self.state.previously_spoken_index;
        self.state.previously_spoken_index = 0;
    }

    /// A chunk of `chunk_length` bytes finished playing in full.
    pub fn finish_chunk(&mut self, chunk_length: usize) {
        self.state.previously_spoken_index = chunk_length;
        self.on_utterance_advance();
    }

    /// Boundary support belongs to the language/engine pairing, so only a
    /// language change re-arms detection. The current chunk is re-submitted
    /// from its start, which is why the chunk offset survives.
    pub fn on_voice_changed(&mut self, same_language: bool) {
        if same_language {
            return;
        }
        debug!(
            start = self.state.speech_utterance_start_index,
            "Voice language changed; re-arming boundary detection"
        );
        self.state.mode = BoundaryMode::BoundariesNotSupported;
        self.state.previously_spoken_index = 0;
    }

    pub fn reset(&mut self) {
        self.state = WordBoundaryState::default();
    }

    /// Reset with the first chunk starting `start_index` bytes into the segment.
    pub fn reset_to(&mut self, start_index: usize) {
        self.reset();
        self.state.speech_utterance_start_index = start_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_position_survives_chunk_advance() {
        let mut tracker = WordBoundaryTracker::new();
        tracker.update_boundary(10, Some(5));
        tracker.on_utterance_advance();
        tracker.update_boundary(3, Some(9));

        let state = tracker.snapshot();
        assert_eq!(state.absolute_position(), 13);
        assert_eq!(state.speech_utterance_length, 9);
        assert_eq!(state.mode, BoundaryMode::BoundaryDetected);
    }

    #[test]
    fn missing_length_keeps_previous_length() {
        let mut tracker = WordBoundaryTracker::new();
        tracker.update_boundary(4, Some(6));
        tracker.update_boundary(2, None);
        assert_eq!(tracker.snapshot().speech_utterance_length, 6);
        assert_eq!(tracker.snapshot().previously_spoken_index, 2);
    }

    #[test]
    fn start_without_events_means_unsupported() {
        let mut tracker = WordBoundaryTracker::new();
        tracker.on_utterance_start();
        assert_eq!(tracker.mode(), BoundaryMode::BoundariesNotSupported);
        tracker.on_utterance_start();
        assert_eq!(tracker.mode(), BoundaryMode::BoundariesNotSupported);
        tracker.update_boundary(0, None);
        assert_eq!(tracker.mode(), BoundaryMode::BoundaryDetected);
        tracker.on_utterance_start();
        assert_eq!(tracker.mode(), BoundaryMode::BoundaryDetected);
    }

    #[test]
    fn voice_change_to_other_language_rearms_detection() {
        let mut tracker = WordBoundaryTracker::new();
        tracker.update_boundary(12, Some(4));
        tracker.finish_chunk(20);
        tracker.update_boundary(7, None);

        tracker.on_voice_changed(true);
        assert_eq!(tracker.mode(), BoundaryMode::BoundaryDetected);
        assert_eq!(tracker.absolute_position(), 27);

        tracker.on_voice_changed(false);
        let state = tracker.snapshot();
        assert_eq!(state.mode, BoundaryMode::BoundariesNotSupported);
        assert_eq!(state.previously_spoken_index, 0);
        assert_eq!(state.speech_utterance_start_index, 20);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut tracker = WordBoundaryTracker::new();
        tracker.update_boundary(5, Some(2));
        tracker.reset();
        let once = tracker.snapshot();
        tracker.reset();
        assert_eq!(tracker.snapshot(), once);
        assert_eq!(once, WordBoundaryState::default());
    }

    #[test]
    fn reset_to_starts_mid_segment() {
        let mut tracker = WordBoundaryTracker::new();
        tracker.update_boundary(5, Some(2));
        tracker.reset_to(8);
        assert_eq!(tracker.mode(), BoundaryMode::NoBoundaries);
        assert_eq!(tracker.absolute_position(), 8);
    }
}
