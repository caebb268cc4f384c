//! Seam to the page-content tree supplied by the embedding application.
//!
//! The read-aloud core only needs a handful of queries against that tree:
//! text of a text-bearing node, its parent, whether a node groups a visual
//! block, and its language. [`MemoryTree`] is a small owned implementation
//! used by the CLI and by tests.

use crate::error::{ReadAloudError, Result};
use std::collections::HashMap;
use std::fmt;

/// Opaque identity of one node in the external content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHandle(pub u64);

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait ContentTree {
    fn text_content(&self, handle: ContentHandle) -> Option<String>;
    fn parent(&self, handle: ContentHandle) -> Option<ContentHandle>;
    /// Paragraphs, headings, list items and other containers that group a
    /// visual block of text.
    fn is_block(&self, handle: ContentHandle) -> bool;
    fn language(&self, _handle: ContentHandle) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
struct MemoryNode {
    parent: Option<ContentHandle>,
    text: String,
    block: bool,
    language: Option<String>,
}

/// In-memory content tree with document-ordered text nodes.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    root: Option<ContentHandle>,
    nodes: HashMap<ContentHandle, MemoryNode>,
    text_order: Vec<ContentHandle>,
}

impl MemoryTree {
    pub fn builder() -> MemoryTreeBuilder {
        MemoryTreeBuilder::default()
    }

    /// One block per paragraph (blank-line separated) and one text node per
    /// line inside it, so sentences that wrap across lines span several nodes.
    pub fn from_paragraphs(text: &str, language: &str) -> Result<Self> {
        let mut builder = Self::builder().root(ContentHandle(0), Some(language));
        let mut next_id = 1u64;
        let mut paragraph: Option<ContentHandle> = None;
        for line in text.lines() {
            if line.trim().is_empty() {
                paragraph = None;
                continue;
            }
            let block = match paragraph {
                Some(block) => block,
                None => {
                    let block = ContentHandle(next_id);
                    next_id += 1;
                    builder = builder.block(block, ContentHandle(0));
                    paragraph = Some(block);
                    block
                }
            };
            let mut content = line.trim_end().to_string();
            content.push(' ');
            builder = builder.text(ContentHandle(next_id), block, content);
            next_id += 1;
        }
        builder.build()
    }

    pub fn root(&self) -> Option<ContentHandle> {
        self.root
    }

    /// Text-bearing nodes in document order.
    pub fn text_handles(&self) -> &[ContentHandle] {
        &self.text_order
    }

    /// Swap a text node for a new handle, as a rendering layer does when it
    /// re-creates markup. The new node takes the old one's place in order.
    pub fn replace_text(
        &mut self,
        old: ContentHandle,
        new: ContentHandle,
        text: impl Into<String>,
    ) -> Result<()> {
        if self.nodes.contains_key(&new) {
            return Err(ReadAloudError::DuplicateHandle(new.0));
        }
        let mut node = self
            .nodes
            .remove(&old)
            .ok_or(ReadAloudError::UnknownHandle(old.0))?;
        node.text = text.into();
        self.nodes.insert(new, node);
        for handle in &mut self.text_order {
            if *handle == old {
                *handle = new;
            }
        }
        Ok(())
    }
}

impl ContentTree for MemoryTree {
    fn text_content(&self, handle: ContentHandle) -> Option<String> {
        self.nodes.get(&handle).map(|node| node.text.clone())
    }

    fn parent(&self, handle: ContentHandle) -> Option<ContentHandle> {
        self.nodes.get(&handle).and_then(|node| node.parent)
    }

    fn is_block(&self, handle: ContentHandle) -> bool {
        self.nodes.get(&handle).is_some_and(|node| node.block)
    }

    fn language(&self, handle: ContentHandle) -> Option<String> {
        let mut current = Some(handle);
        while let Some(handle) = current {
            let node = self.nodes.get(&handle)?;
            if let Some(language) = &node.language {
                return Some(language.clone());
            }
            current = node.parent;
        }
        None
    }
}

#[derive(Debug, Clone)]
enum PendingNode {
    Root {
        handle: ContentHandle,
        language: Option<String>,
    },
    Block {
        handle: ContentHandle,
        parent: ContentHandle,
    },
    Text {
        handle: ContentHandle,
        parent: ContentHandle,
        text: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTreeBuilder {
    pending: Vec<PendingNode>,
}

impl MemoryTreeBuilder {
    pub fn root(mut self, handle: ContentHandle, language: Option<&str>) -> Self {
        self.pending.push(PendingNode::Root {
            handle,
            language: language.map(str::to_string),
        });
        self
    }

    pub fn block(mut self, handle: ContentHandle, parent: ContentHandle) -> Self {
        self.pending.push(PendingNode::Block { handle, parent });
        self
    }

    pub fn text(
        mut self,
        handle: ContentHandle,
        parent: ContentHandle,
        text: impl Into<String>,
    ) -> Self {
        self.pending.push(PendingNode::Text {
            handle,
            parent,
            text: text.into(),
        });
        self
    }

    /// Fails when no root was declared, a parent is missing, or a handle is
    /// used twice. These are caller bugs, not recoverable states.
    pub fn build(self) -> Result<MemoryTree> {
        let mut tree = MemoryTree::default();
        for pending in self.pending {
            let (handle, node) = match pending {
                PendingNode::Root { handle, language } => {
                    tree.root = Some(handle);
                    let node = MemoryNode {
                        parent: None,
                        text: String::new(),
                        block: true,
                        language,
                    };
                    (handle, node)
                }
                PendingNode::Block { handle, parent } => {
                    check_parent(&tree, handle, parent)?;
                    let node = MemoryNode {
                        parent: Some(parent),
                        text: String::new(),
                        block: true,
                        language: None,
                    };
                    (handle, node)
                }
                PendingNode::Text {
                    handle,
                    parent,
                    text,
                } => {
                    check_parent(&tree, handle, parent)?;
                    tree.text_order.push(handle);
                    let node = MemoryNode {
                        parent: Some(parent),
                        text,
                        block: false,
                        language: None,
                    };
                    (handle, node)
                }
            };
            if tree.nodes.insert(handle, node).is_some() {
                return Err(ReadAloudError::DuplicateHandle(handle.0));
            }
        }
        if tree.root.is_none() {
            return Err(ReadAloudError::MissingRoot);
        }
        Ok(tree)
    }
}

fn check_parent(tree: &MemoryTree, child: ContentHandle, parent: ContentHandle) -> Result<()> {
    if tree.root.is_none() {
        return Err(ReadAloudError::MissingRoot);
    }
    if !tree.nodes.contains_key(&parent) {
        return Err(ReadAloudError::MissingParent {
            child: child.0,
            parent: parent.0,
        });
    }
    Ok(())
}
