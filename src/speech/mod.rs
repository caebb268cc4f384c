//! Playback orchestration against an external speech engine.
//!
//! [`SpeechController`] never talks to the engine directly. Every operation
//! returns the [`SpeechEffect`]s to carry out, and engine callbacks are fed
//! back as [`SpeechEvent`]s tagged with the utterance they belong to.

mod controller;
mod simulated;
mod synthesizer;

pub use controller::{PauseSource, PlaybackState, SpeechController};
pub use simulated::SimulatedSynthesizer;
pub use synthesizer::{SpeechEffect, SpeechEvent, SpeechEventKind, SpeechSynthesizer, Utterance};
