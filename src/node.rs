//! Stable identities for text-bearing content and the segments cut from it.
//!
//! Consumers hold a [`NodeId`]; the [`NodeStore`] maps it to whichever content
//! handle currently backs it. When the rendering layer swaps a node out,
//! [`NodeStore::replace`] re-points the id so every holder follows along.

use crate::content::{ContentHandle, ContentTree};
use crate::error::{ReadAloudError, Result};
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Identity of one read-aloud node. Equality is identity, never text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// A contiguous span of one node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub node: NodeId,
    pub start: usize,
    pub length: usize,
}

impl Segment {
    pub fn new(node: NodeId, start: usize, length: usize) -> Self {
        Self {
            node,
            start,
            length,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

#[derive(Debug)]
struct NodeEntry {
    handle: ContentHandle,
    text: String,
    block_ancestor: OnceCell<Option<ContentHandle>>,
}

impl NodeEntry {
    fn new(handle: ContentHandle, text: String) -> Self {
        Self {
            handle,
            text,
            block_ancestor: OnceCell::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct NodeStore {
    generation: u32,
    entries: Vec<NodeEntry>,
    by_handle: HashMap<ContentHandle, usize>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get-or-create the node wrapping `handle`.
    pub fn node_for(&mut self, tree: &dyn ContentTree, handle: ContentHandle) -> Result<NodeId> {
        if let Some(&index) = self.by_handle.get(&handle) {
            return Ok(self.id_at(index));
        }
        let text = tree
            .text_content(handle)
            .ok_or(ReadAloudError::UnknownHandle(handle.0))?;
        let index = self.entries.len();
        trace!(%handle, index, chars = text.len(), "Registering read-aloud node");
        self.entries.push(NodeEntry::new(handle, text));
        self.by_handle.insert(handle, index);
        Ok(self.id_at(index))
    }

    /// Look up an already registered handle without creating a node.
    pub fn find(&self, handle: ContentHandle) -> Option<NodeId> {
        self.by_handle.get(&handle).map(|&index| self.id_at(index))
    }

    pub fn handle(&self, id: NodeId) -> Result<ContentHandle> {
        self.entry(id).map(|entry| entry.handle)
    }

    pub fn text(&self, id: NodeId) -> Result<&str> {
        self.entry(id).map(|entry| entry.text.as_str())
    }

    /// Two ids denote the same node when they resolve to the same handle.
    pub fn same_node(&self, a: NodeId, b: NodeId) -> Result<bool> {
        Ok(self.handle(a)? == self.handle(b)?)
    }

    /// Nearest block-level ancestor, computed on first use.
    pub fn block_ancestor(
        &self,
        id: NodeId,
        tree: &dyn ContentTree,
    ) -> Result<Option<ContentHandle>> {
        let entry = self.entry(id)?;
        Ok(*entry.block_ancestor.get_or_init(|| {
            let mut current = tree.parent(entry.handle);
            while let Some(handle) = current {
                if tree.is_block(handle) {
                    return Some(handle);
                }
                current = tree.parent(handle);
            }
            None
        }))
    }

    pub fn same_block(&self, a: NodeId, b: NodeId, tree: &dyn ContentTree) -> Result<bool> {
        Ok(self.block_ancestor(a, tree)? == self.block_ancestor(b, tree)?)
    }

    /// Re-point every id wrapping `old` at `new`, refreshing cached text.
    pub fn replace(
        &mut self,
        tree: &dyn ContentTree,
        old: ContentHandle,
        new: ContentHandle,
    ) -> Result<NodeId> {
        let index = self
            .by_handle
            .remove(&old)
            .ok_or(ReadAloudError::UnknownHandle(old.0))?;
        let text = tree
            .text_content(new)
            .ok_or(ReadAloudError::UnknownHandle(new.0))?;
        debug!(%old, %new, index, "Replacing read-aloud node handle");
        self.entries[index] = NodeEntry::new(new, text);
        self.by_handle.entry(new).or_insert(index);
        Ok(self.id_at(index))
    }

    /// Drop every node; ids issued before this call are rejected afterwards.
    pub fn clear(&mut self) {
        debug!(nodes = self.entries.len(), "Clearing read-aloud node store");
        self.entries.clear();
        self.by_handle.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Text covered by `segment`, or `None` when it is out of range.
    pub fn segment_text(&self, segment: &Segment) -> Option<&str> {
        let text = self.text(segment.node).ok()?;
        text.get(segment.start..segment.end())
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.generation,
        }
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry> {
        if id.generation != self.generation {
            return Err(ReadAloudError::UnknownNode {
                index: id.index,
                generation: id.generation,
            });
        }
        self.entries
            .get(id.index)
            .ok_or(ReadAloudError::UnknownNode {
                index: id.index,
                generation: id.generation,
            })
    }
}
