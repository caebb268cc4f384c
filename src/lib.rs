//! Read-aloud synchronization engine.
//!
//! Splits page content into sentence-level reading units, drives an external
//! speech engine through [`speech::SpeechController`], and maps the engine's
//! boundary events back onto source text so the current word, phrase or
//! sentence can be highlighted. [`session::ReadAloudSession`] is the
//! command-driven entry point.

pub mod bindings;
pub mod boundary;
pub mod config;
pub mod content;
pub mod error;
pub mod highlight;
pub mod node;
pub mod queue;
pub mod segmenter;
pub mod session;
pub mod speech;
pub mod voice;

pub use error::{ReadAloudError, Result};
