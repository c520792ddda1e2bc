use crate::error::ModelError;
use crate::model::{Model, Selection};
use crate::node::{Node, content_size, slice_children};
use crate::ops::Op;
use crate::position::{Position, Range};
use crate::schema::ChildKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Leave a block container without a caret position instead of filling
    /// it with an empty paragraph.
    pub suppress_auto_paragraph: bool,
}

/// Index of the first path entry where the two positions part ways, bounded so
/// that it always addresses an offset in a shared parent.
fn common_depth(start: &Position, end: &Position) -> usize {
    let max = start.depth().min(end.depth()) - 1;
    (0..max)
        .find(|&i| start.path[i] != end.path[i])
        .unwrap_or(max)
}

impl Model {
    /// Deep copy of the content inside `range`. Partially selected elements are
    /// copied with only their selected part.
    pub fn selected_content(&self, range: &Range) -> Vec<Node> {
        if range.is_collapsed() {
            return Vec::new();
        }
        let depth = common_depth(&range.start, &range.end);
        let parent = &range.start.path[..depth];
        let Some(children) = self.doc().children_at(parent) else {
            return Vec::new();
        };
        slice_children(
            children,
            Some(&range.start.path[depth..]),
            Some(&range.end.path[depth..]),
        )
    }

    pub fn delete_content(
        &mut self,
        range: &Range,
        options: DeleteOptions,
    ) -> Result<(), ModelError> {
        if range.is_collapsed() {
            return Ok(());
        }
        self.change(|model| model.delete_content_in_change(range, options))
    }

    fn delete_content_in_change(
        &mut self,
        range: &Range,
        options: DeleteOptions,
    ) -> Result<(), ModelError> {
        let was_selection = self.selection().range() == *range;
        let start = &range.start.path;
        let end = &range.end.path;
        let depth = common_depth(&range.start, &range.end);
        let parent = &start[..depth];
        let start_deeper = start.len() > depth + 1;
        let end_deeper = end.len() > depth + 1;

        // Heads of the end branch, deepest level first.
        for level in (depth + 1..end.len()).rev() {
            let howmany = end[level];
            if howmany > 0 {
                self.apply(Op::Remove {
                    position: Position::at(&end[..level], 0),
                    howmany,
                })?;
            }
        }

        let from = if start_deeper { start[depth] + 1 } else { start[depth] };
        let to = end[depth];
        if to > from {
            self.apply(Op::Remove {
                position: Position::at(parent, from),
                howmany: to - from,
            })?;
        }

        // Tails of the start branch.
        for level in (depth + 1..start.len()).rev() {
            let container = &start[..level];
            let howmany = self.doc().max_offset(container).saturating_sub(start[level]);
            if howmany > 0 {
                self.apply(Op::Remove {
                    position: Position::at(container, start[level]),
                    howmany,
                })?;
            }
        }

        if start_deeper && end_deeper {
            self.merge_branches(start, end.len(), depth)?;
        }

        let position = range.start.clone();
        if !options.suppress_auto_paragraph
            && !self.check_child_at(&position, ChildKind::Text)
            && self.check_child_at(&position, ChildKind::Kind("paragraph"))
        {
            self.apply(Op::Insert {
                position: position.clone(),
                nodes: vec![Node::paragraph("")],
            })?;
            if was_selection {
                let mut inner = position.path.clone();
                inner.push(0);
                self.set_selection(Selection::collapsed(Position::new(inner)));
            }
        } else if was_selection {
            self.set_selection(Selection::collapsed(position));
        }
        Ok(())
    }

    /// Joins the end branch into the start branch level by level, stopping at
    /// objects or at elements of different content models.
    fn merge_branches(
        &mut self,
        start: &[usize],
        end_len: usize,
        depth: usize,
    ) -> Result<(), ModelError> {
        let mut level = depth;
        while start.len() > level + 1 && end_len > level + 1 {
            let left_path = &start[..level + 1];
            let right = Position::at(&start[..level], start[level] + 1);
            let (Some(left), Some(right_node)) =
                (self.node_at(left_path), self.node_at(&right.path))
            else {
                break;
            };
            let schema = self.schema();
            let mergeable =
                |node: &Node| matches!(node, Node::Element(_)) && !schema.is_object(node);
            if !mergeable(left)
                || !mergeable(right_node)
                || schema.is_text_block(left) != schema.is_text_block(right_node)
            {
                break;
            }
            self.apply(Op::Merge { position: right })?;
            level += 1;
        }
        Ok(())
    }

    /// Inserts `content` at the selection, replacing a non-collapsed selection,
    /// and returns the range the content ended up in. The selection is left
    /// collapsed at the end of that range.
    pub fn insert_content(&mut self, content: Vec<Node>) -> Result<Range, ModelError> {
        self.change(|model| model.insert_content_in_change(content))
    }

    fn insert_content_in_change(&mut self, content: Vec<Node>) -> Result<Range, ModelError> {
        let selection = self.selection().range();
        if !selection.is_collapsed() {
            self.delete_content(
                &selection,
                DeleteOptions {
                    suppress_auto_paragraph: true,
                },
            )?;
        }
        let position = self.selection().range().start;
        if content.is_empty() {
            return Ok(Range::collapsed(position));
        }

        let inline_only = content.iter().all(|node| self.schema().is_inline(node));
        let range = if self.check_child_at(&position, ChildKind::Text) {
            let block_parent_accepts = position
                .parent_path()
                .split_last()
                .is_some_and(|(_, grand)| self.check_child_in(grand, ChildKind::Block));
            if inline_only {
                self.insert_inline(&position, content)?
            } else if block_parent_accepts {
                self.insert_blocks_into_text(&position, content)?
            } else {
                let inline = self.flatten_to_inline(content);
                self.insert_inline(&position, inline)?
            }
        } else if self.check_child_at(&position, ChildKind::Block) {
            let blocks = self.wrap_inline_runs(content);
            let parent = position.parent_path();
            if let Some(node) = blocks
                .iter()
                .find(|node| {
                    let kind = ChildKind::Kind(node.kind().unwrap_or_default());
                    !self.check_child_in(parent, kind)
                })
            {
                tracing::debug!(kind = ?node.kind(), "content not allowed in block container");
                return Err(ModelError::InvalidInsertionPosition(position.path.clone()));
            }
            let count = blocks.len();
            self.apply(Op::Insert {
                position: position.clone(),
                nodes: blocks,
            })?;
            Range::new(position.clone(), position.with_offset(position.offset() + count))
        } else {
            return Err(ModelError::InvalidInsertionPosition(position.path.clone()));
        };

        self.set_selection(Selection::collapsed(range.end.clone()));
        Ok(range)
    }

    fn insert_inline(
        &mut self,
        position: &Position,
        nodes: Vec<Node>,
    ) -> Result<Range, ModelError> {
        let size = content_size(&nodes);
        if size > 0 {
            self.apply(Op::Insert {
                position: position.clone(),
                nodes,
            })?;
        }
        Ok(Range::new(
            position.clone(),
            position.with_offset(position.offset() + size),
        ))
    }

    /// Splits the text block at `position`, places the blocks between the two
    /// halves and joins text blocks at both seams.
    fn insert_blocks_into_text(
        &mut self,
        position: &Position,
        content: Vec<Node>,
    ) -> Result<Range, ModelError> {
        let blocks = self.wrap_inline_runs(content);
        let count = blocks.len();
        let block_path = position.parent_path().to_vec();
        let Some((&index, grand)) = block_path.split_last() else {
            return Err(ModelError::RootOperation("split"));
        };

        self.apply(Op::Split {
            position: position.clone(),
        })?;
        self.apply(Op::Insert {
            position: Position::at(grand, index + 1),
            nodes: blocks,
        })?;
        let tracked = self.track_range(Range::new(
            Position::at(grand, index + 1),
            Position::at(grand, index + 1 + count),
        ));

        let right = Position::at(grand, index + 1 + count);
        let last = Position::at(grand, index + count);
        if self.node_at(&right.path).is_some_and(Node::is_empty) {
            self.apply(Op::Remove {
                position: right,
                howmany: 1,
            })?;
        } else if self.both_text_blocks(&last.path, &right.path) {
            self.apply(Op::Merge { position: right })?;
        }

        let left = Position::at(grand, index);
        let first = Position::at(grand, index + 1);
        if self.node_at(&left.path).is_some_and(Node::is_empty) {
            self.apply(Op::Remove {
                position: left,
                howmany: 1,
            })?;
        } else if self.both_text_blocks(&left.path, &first.path) {
            self.apply(Op::Merge { position: first })?;
        }

        Ok(self
            .detach(tracked)
            .unwrap_or_else(|| Range::collapsed(position.clone())))
    }

    fn both_text_blocks(&self, a: &[usize], b: &[usize]) -> bool {
        let schema = self.schema();
        self.node_at(a).is_some_and(|n| schema.is_text_block(n))
            && self.node_at(b).is_some_and(|n| schema.is_text_block(n))
    }

    /// Groups consecutive inline nodes into paragraphs.
    fn wrap_inline_runs(&self, content: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::new();
        let mut run: Vec<Node> = Vec::new();
        for node in content {
            if self.schema().is_inline(&node) {
                run.push(node);
                continue;
            }
            if !run.is_empty() {
                out.push(Node::element("paragraph", std::mem::take(&mut run)));
            }
            out.push(node);
        }
        if !run.is_empty() {
            out.push(Node::element("paragraph", run));
        }
        out
    }

    /// Keeps the inline content of text blocks; objects that cannot live
    /// inline are dropped.
    fn flatten_to_inline(&self, content: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::new();
        for node in content {
            if self.schema().is_inline(&node) {
                out.push(node);
            } else if self.schema().is_text_block(&node) {
                out.extend(node.children().iter().cloned());
            } else if !self.schema().is_object(&node) {
                out.extend(self.flatten_to_inline(node.children().to_vec()));
            }
        }
        out
    }
}
