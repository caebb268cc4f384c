//! Precondition errors raised by the read-aloud core.
//!
//! These indicate a caller bug (unknown node, malformed test tree) rather than
//! an end-user reachable condition. Unsupported engine capabilities and
//! malformed offsets never surface here; they degrade to "no highlight".

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadAloudError {
    /// A `NodeId` that was never issued by this store, or was issued before the
    /// last `clear()`.
    #[error("unknown read-aloud node #{index} (generation {generation})")]
    UnknownNode { index: usize, generation: u32 },

    /// A content handle the tree does not know about.
    #[error("unknown content handle {0}")]
    UnknownHandle(u64),

    /// A content tree was built without declaring a root.
    #[error("content tree has no root")]
    MissingRoot,

    /// A content tree child referenced a parent that was never added.
    #[error("content node {child} references missing parent {parent}")]
    MissingParent { child: u64, parent: u64 },

    /// A content handle was declared twice in one tree.
    #[error("content handle {0} declared twice")]
    DuplicateHandle(u64),
}

pub type Result<T> = std::result::Result<T, ReadAloudError>;
