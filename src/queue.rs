//! Sentence-level reading units and the cursor that walks them.

use crate::content::{ContentHandle, ContentTree};
use crate::error::Result;
use crate::node::{NodeId, NodeStore, Segment};
use crate::segmenter::TextSegmenter;
use tracing::debug;

/// One sentence, possibly spread over several nodes of the same block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingUnit {
    pub segments: Vec<Segment>,
    pub text: String,
}

impl ReadingUnit {
    /// Map a byte range of `self.text` back onto the node segments it covers.
    pub fn segments_for_range(&self, start: usize, end: usize) -> Vec<Segment> {
        let mut covered = Vec::new();
        let mut offset = 0;
        for segment in &self.segments {
            let seg_start = offset;
            let seg_end = offset + segment.length;
            offset = seg_end;
            let from = start.max(seg_start);
            let to = end.min(seg_end);
            if to > from {
                covered.push(Segment::new(
                    segment.node,
                    segment.start + (from - seg_start),
                    to - from,
                ));
            }
        }
        covered
    }

    /// Offset within `self.text` of `offset` inside `node`, if this unit
    /// covers it.
    fn locate(&self, node: NodeId, offset: usize) -> Option<usize> {
        let mut unit_offset = 0;
        for segment in &self.segments {
            if segment.node == node && segment.start <= offset && offset < segment.end() {
                return Some(unit_offset + (offset - segment.start));
            }
            unit_offset += segment.length;
        }
        None
    }
}

#[derive(Debug, Default)]
pub struct ReadingQueue {
    units: Vec<ReadingUnit>,
    cursor: usize,
}

impl ReadingQueue {
    /// Cut `nodes` (document order) into sentence units. Consecutive nodes that
    /// share a block ancestor are read as one run of text so a sentence may
    /// cross node boundaries.
    pub fn build(
        nodes: &[NodeId],
        store: &NodeStore,
        tree: &dyn ContentTree,
        segmenter: &TextSegmenter,
    ) -> Result<Self> {
        let mut units = Vec::new();
        let mut run: Vec<NodeId> = Vec::new();
        let mut run_block: Option<Option<ContentHandle>> = None;

        for &node in nodes {
            let block = store.block_ancestor(node, tree)?;
            if run_block.is_some_and(|current| current != block) {
                units.extend(units_for_run(&run, store, segmenter)?);
                run.clear();
            }
            run_block = Some(block);
            run.push(node);
        }
        units.extend(units_for_run(&run, store, segmenter)?);

        debug!(nodes = nodes.len(), units = units.len(), "Built reading queue");
        Ok(Self { units, cursor: 0 })
    }

    pub fn from_units(units: Vec<ReadingUnit>) -> Self {
        Self { units, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn units(&self) -> &[ReadingUnit] {
        &self.units
    }

    pub fn current(&self) -> Option<&ReadingUnit> {
        self.units.get(self.cursor)
    }

    /// Units that have finished playing.
    pub fn previous(&self) -> &[ReadingUnit] {
        &self.units[..self.cursor.min(self.units.len())]
    }

    /// Units not yet finished, starting with the current one.
    pub fn remaining(&self) -> &[ReadingUnit] {
        &self.units[self.cursor.min(self.units.len())..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.units.len()
    }

    /// Move to the next unit. Returns `false` once the queue is exhausted.
    pub fn advance(&mut self) -> bool {
        self.cursor = (self.cursor + 1).min(self.units.len());
        !self.is_exhausted()
    }

    /// Move back one unit; a no-op on the first unit.
    pub fn retreat(&mut self) -> bool {
        if self.cursor == 0 || self.units.is_empty() {
            return false;
        }
        self.cursor = (self.cursor - 1).min(self.units.len() - 1);
        true
    }

    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.units.len());
    }

    pub fn finish(&mut self) {
        self.cursor = self.units.len();
    }

    pub fn clear(&mut self) {
        self.units.clear();
        self.cursor = 0;
    }

    /// Unit index and offset within that unit for a point in `node`.
    pub fn locate(&self, node: NodeId, offset: usize) -> Option<(usize, usize)> {
        self.units
            .iter()
            .enumerate()
            .find_map(|(idx, unit)| unit.locate(node, offset).map(|within| (idx, within)))
    }
}

fn units_for_run(
    run: &[NodeId],
    store: &NodeStore,
    segmenter: &TextSegmenter,
) -> Result<Vec<ReadingUnit>> {
    if run.is_empty() {
        return Ok(Vec::new());
    }

    let mut joined = String::new();
    let mut pieces = Vec::with_capacity(run.len());
    for &node in run {
        let text = store.text(node)?;
        pieces.push((node, joined.len(), text.len()));
        joined.push_str(text);
    }

    let units = segmenter
        .get_sentences(&joined)
        .into_iter()
        .filter(|sentence| !sentence.text.trim().is_empty())
        .map(|sentence| {
            let (start, end) = (sentence.index, sentence.end());
            let segments = pieces
                .iter()
                .filter_map(|&(node, offset, len)| {
                    let from = start.max(offset);
                    let to = end.min(offset + len);
                    (to > from).then(|| Segment::new(node, from - offset, to - from))
                })
                .collect();
            ReadingUnit {
                segments,
                text: sentence.text,
            }
        })
        .collect();
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryTree;

    fn build(text: &str) -> (MemoryTree, NodeStore, Vec<NodeId>, ReadingQueue) {
        let tree = MemoryTree::from_paragraphs(text, "en").expect("tree");
        let mut store = NodeStore::new();
        let nodes: Vec<NodeId> = tree
            .text_handles()
            .iter()
            .map(|handle| store.node_for(&tree, *handle).unwrap())
            .collect();
        let queue =
            ReadingQueue::build(&nodes, &store, &tree, &TextSegmenter::default()).expect("queue");
        (tree, store, nodes, queue)
    }

    #[test]
    fn sentence_crossing_nodes_spans_both_segments() {
        let (_tree, store, nodes, queue) = build("The cat\nsat down. Then\nit slept.");
        let texts: Vec<&str> = queue.units().iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["The cat sat down. ", "Then it slept. "]);

        let first = &queue.units()[0];
        assert_eq!(
            first.segments,
            vec![Segment::new(nodes[0], 0, 8), Segment::new(nodes[1], 0, 10)]
        );
        let second = &queue.units()[1];
        assert_eq!(
            second.segments,
            vec![Segment::new(nodes[1], 10, 5), Segment::new(nodes[2], 0, 10)]
        );
        for unit in queue.units() {
            let rebuilt: String = unit
                .segments
                .iter()
                .filter_map(|segment| store.segment_text(segment))
                .collect();
            assert_eq!(rebuilt, unit.text);
        }
    }

    #[test]
    fn paragraphs_never_share_a_unit() {
        let (_tree, _store, _nodes, queue) = build("No period here\n\nNext block.");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.units()[0].text, "No period here ");
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let (_tree, _store, _nodes, mut queue) = build("A. B. C.");
        assert!(!queue.retreat());
        assert_eq!(queue.cursor(), 0);

        assert!(queue.advance());
        assert!(queue.advance());
        assert_eq!(queue.previous().len(), 2);
        assert!(!queue.advance());
        assert!(queue.is_exhausted());
        assert!(queue.current().is_none());
        assert!(!queue.advance());

        assert!(queue.retreat());
        assert_eq!(queue.cursor(), 2);
        assert_eq!(queue.remaining().len(), 1);
    }

    #[test]
    fn locate_maps_node_offsets_into_units() {
        let (_tree, _store, nodes, queue) = build("The cat\nsat down. Then\nit slept.");
        assert_eq!(queue.locate(nodes[1], 2), Some((0, 10)));
        assert_eq!(queue.locate(nodes[1], 11), Some((1, 1)));
        assert_eq!(queue.locate(nodes[2], 100), None);
    }

    #[test]
    fn segments_for_range_splits_across_nodes() {
        let (_tree, _store, nodes, queue) = build("The cat\nsat down.");
        let unit = &queue.units()[0];
        assert_eq!(
            unit.segments_for_range(4, 11),
            vec![Segment::new(nodes[0], 4, 4), Segment::new(nodes[1], 0, 3)]
        );
    }
}
