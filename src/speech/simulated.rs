//! Deterministic in-process engine used by the CLI and tests.

use super::synthesizer::{SpeechEvent, SpeechEventKind, SpeechSynthesizer, Utterance};
use crate::segmenter::TextSegmenter;
use std::collections::VecDeque;
use tracing::trace;

/// Queues the callbacks a real engine would fire: start, one boundary per
/// word, end. Events are pulled with [`SimulatedSynthesizer::next_event`].
#[derive(Debug)]
pub struct SimulatedSynthesizer {
    segmenter: TextSegmenter,
    emit_boundaries: bool,
    paused: bool,
    pending: VecDeque<SpeechEvent>,
    spoken: Vec<Utterance>,
}

impl SimulatedSynthesizer {
    pub fn new(locale: &str, emit_boundaries: bool) -> Self {
        Self {
            segmenter: TextSegmenter::new(locale),
            emit_boundaries,
            paused: false,
            pending: VecDeque::new(),
            spoken: Vec::new(),
        }
    }

    /// Next callback, or `None` while paused or idle.
    pub fn next_event(&mut self) -> Option<SpeechEvent> {
        if self.paused {
            return None;
        }
        self.pending.pop_front()
    }

    /// Drop queued callbacks for the utterance in flight and report an
    /// error in their place.
    pub fn fail_current(&mut self, message: &str) {
        if let Some(id) = self.pending.front().map(|event| event.utterance_id) {
            self.pending.clear();
            self.pending.push_back(SpeechEvent::new(
                id,
                SpeechEventKind::Error {
                    message: message.to_string(),
                },
            ));
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn spoken(&self) -> &[Utterance] {
        &self.spoken
    }
}

impl SpeechSynthesizer for SimulatedSynthesizer {
    fn speak(&mut self, utterance: &Utterance) {
        trace!(id = utterance.id, text = %utterance.text, "Simulated speak");
        let id = utterance.id;
        self.pending
            .push_back(SpeechEvent::new(id, SpeechEventKind::Start));
        if self.emit_boundaries {
            for word in self.segmenter.get_words(&utterance.text) {
                self.pending.push_back(SpeechEvent::new(
                    id,
                    SpeechEventKind::Boundary {
                        index: word.index,
                        length: Some(word.text.len()),
                    },
                ));
            }
        }
        self.pending.push_back(SpeechEvent::new(id, SpeechEventKind::End));
        self.spoken.push(utterance.clone());
    }

    fn cancel(&mut self) {
        self.pending.clear();
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }
}
