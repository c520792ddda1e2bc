use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::node::{
    Document, ElementNode, Node, content_size, merge_text_leaves, node_index_at, split_at_offset,
};
use crate::position::{Position, Range, Stickiness};

/// Atomic document change. Every mutation of a [`Model`](crate::Model) is a
/// sequence of these, and every tracked position is transformed by each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Insert {
        position: Position,
        nodes: Vec<Node>,
    },
    Remove {
        position: Position,
        howmany: usize,
    },
    /// Splits the parent of `position` in two at that offset.
    Split { position: Position },
    /// Moves the children of the element right after `position` into the
    /// element right before it, then removes the emptied element.
    Merge { position: Position },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Insert { .. } => "insert",
            Op::Remove { .. } => "remove",
            Op::Split { .. } => "split",
            Op::Merge { .. } => "merge",
        }
    }
}

/// An op that has been applied, with what its position transform needs to
/// know about the document before the change.
#[derive(Debug, Clone)]
pub(crate) struct AppliedOp {
    op: Op,
    inserted_size: usize,
    merged_left_size: usize,
}

impl AppliedOp {
    pub(crate) fn transform_position(
        &self,
        position: &Position,
        stickiness: Stickiness,
    ) -> Position {
        match &self.op {
            Op::Insert { position: at, .. } => shift_for_insert(
                position,
                at.parent_path(),
                at.offset(),
                self.inserted_size,
                stickiness,
            ),
            Op::Remove {
                position: at,
                howmany,
            } => shift_for_remove(position, at.parent_path(), at.offset(), *howmany),
            Op::Split { position: at } => shift_for_split(position, at, stickiness),
            Op::Merge { position: at } => shift_for_merge(position, at, self.merged_left_size),
        }
    }

    /// Start follows `start`, end follows `end`; a range never inverts.
    pub(crate) fn transform_range(
        &self,
        range: &Range,
        start: Stickiness,
        end: Stickiness,
    ) -> Range {
        let new_start = self.transform_position(&range.start, start);
        let mut new_end = self.transform_position(&range.end, end);
        if new_end < new_start {
            new_end = new_start.clone();
        }
        Range {
            start: new_start,
            end: new_end,
        }
    }
}

pub(crate) fn apply_op(doc: &mut Document, op: Op) -> Result<AppliedOp, ModelError> {
    let mut inserted_size = 0;
    let mut merged_left_size = 0;

    match &op {
        Op::Insert { position, nodes } => {
            let children = doc.children_mut(position.parent_path())?;
            check_offset(children, position, position.offset())?;
            let ix = split_at_offset(children, position.offset());
            inserted_size = content_size(nodes);
            for (i, node) in nodes.iter().enumerate() {
                children.insert(ix + i, node.clone());
            }
            merge_text_leaves(children);
        }
        Op::Remove { position, howmany } => {
            let children = doc.children_mut(position.parent_path())?;
            check_offset(children, position, position.offset() + howmany)?;
            let from = split_at_offset(children, position.offset());
            let to = split_at_offset(children, position.offset() + howmany);
            children.drain(from..to);
            merge_text_leaves(children);
        }
        Op::Split { position } => {
            let element_path = position.parent_path();
            let (&element_offset, grand_parent) = element_path
                .split_last()
                .ok_or(ModelError::RootOperation("split"))?;
            let siblings = doc.children_mut(grand_parent)?;
            let index = node_index_at(siblings, element_offset)
                .ok_or_else(|| ModelError::InvalidPath(element_path.to_vec()))?;
            let Node::Element(element) = &mut siblings[index] else {
                return Err(ModelError::NotAContainer(element_path.to_vec()));
            };
            check_offset(&element.children, position, position.offset())?;
            let ix = split_at_offset(&mut element.children, position.offset());
            let mut tail = element.children.split_off(ix);
            merge_text_leaves(&mut element.children);
            merge_text_leaves(&mut tail);
            let clone = Node::Element(ElementNode {
                kind: element.kind.clone(),
                attrs: element.attrs.clone(),
                children: tail,
            });
            siblings.insert(index + 1, clone);
        }
        Op::Merge { position } => {
            let offset = position.offset();
            if offset == 0 {
                return Err(ModelError::InvalidPath(position.path.clone()));
            }
            let siblings = doc.children_mut(position.parent_path())?;
            let right_ix = node_index_at(siblings, offset)
                .ok_or_else(|| ModelError::InvalidPath(position.path.clone()))?;
            let left_ix = node_index_at(siblings, offset - 1)
                .ok_or_else(|| ModelError::InvalidPath(position.with_offset(offset - 1).path))?;
            if !matches!(siblings[left_ix], Node::Element(_))
                || !matches!(siblings[right_ix], Node::Element(_))
            {
                return Err(ModelError::NotAContainer(position.path.clone()));
            }
            let Node::Element(right) = siblings.remove(right_ix) else {
                return Err(ModelError::NotAContainer(position.path.clone()));
            };
            let Node::Element(left) = &mut siblings[left_ix] else {
                return Err(ModelError::NotAContainer(position.path.clone()));
            };
            merged_left_size = content_size(&left.children);
            left.children.extend(right.children);
            merge_text_leaves(&mut left.children);
        }
    }

    Ok(AppliedOp {
        op,
        inserted_size,
        merged_left_size,
    })
}

fn check_offset(children: &[Node], position: &Position, offset: usize) -> Result<(), ModelError> {
    let size = content_size(children);
    if offset > size {
        return Err(ModelError::OffsetOutOfBounds {
            parent: position.parent_path().to_vec(),
            offset,
            size,
        });
    }
    Ok(())
}

fn shift_for_insert(
    position: &Position,
    parent: &[usize],
    offset: usize,
    len: usize,
    stickiness: Stickiness,
) -> Position {
    let depth = parent.len();
    if position.path.len() <= depth || !position.path.starts_with(parent) {
        return position.clone();
    }
    let x = position.path[depth];
    let same_level = position.path.len() == depth + 1;
    let moves = x > offset || (x == offset && (!same_level || stickiness == Stickiness::ToNext));
    let mut out = position.clone();
    if moves {
        out.path[depth] += len;
    }
    out
}

fn shift_for_remove(
    position: &Position,
    parent: &[usize],
    offset: usize,
    howmany: usize,
) -> Position {
    let depth = parent.len();
    if position.path.len() <= depth || !position.path.starts_with(parent) {
        return position.clone();
    }
    let x = position.path[depth];
    let same_level = position.path.len() == depth + 1;
    if x >= offset + howmany {
        let mut out = position.clone();
        out.path[depth] -= howmany;
        return out;
    }
    if x > offset || (x == offset && !same_level) {
        // Inside the removed content.
        return Position::at(parent, offset);
    }
    position.clone()
}

fn shift_for_split(position: &Position, at: &Position, stickiness: Stickiness) -> Position {
    let element_path = at.parent_path();
    let Some((&element_offset, grand_parent)) = element_path.split_last() else {
        return position.clone();
    };
    let depth = element_path.len();
    if position.path.len() > depth && position.path.starts_with(element_path) {
        let x = position.path[depth];
        let same_level = position.path.len() == depth + 1;
        let split = at.offset();
        if x > split || (x == split && (!same_level || stickiness == Stickiness::ToNext)) {
            let mut path = grand_parent.to_vec();
            path.push(element_offset + 1);
            path.push(x - split);
            path.extend_from_slice(&position.path[depth + 1..]);
            return Position { path };
        }
        return position.clone();
    }
    shift_for_insert(
        position,
        grand_parent,
        element_offset + 1,
        1,
        Stickiness::ToNext,
    )
}

fn shift_for_merge(position: &Position, at: &Position, left_size: usize) -> Position {
    let right = &at.path;
    let depth = right.len();
    let left_path = at.with_offset(at.offset() - 1).path;
    if position.path.len() > depth && position.path.starts_with(right) {
        let mut path = left_path;
        path.push(position.path[depth] + left_size);
        path.extend_from_slice(&position.path[depth + 1..]);
        return Position { path };
    }
    if position.path == *right {
        return Position::at(&left_path, left_size);
    }
    shift_for_remove(position, at.parent_path(), at.offset(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(doc: &mut Document, op: Op) -> AppliedOp {
        apply_op(doc, op).expect("op applies")
    }

    #[test]
    fn insert_at_range_start_does_not_grow_range() {
        let mut doc = Document::new(vec![Node::paragraph("hello")]);
        let range = Range::new(Position::new(vec![0, 1]), Position::new(vec![0, 3]));
        let op = applied(
            &mut doc,
            Op::Insert {
                position: Position::new(vec![0, 1]),
                nodes: vec![Node::text("XY")],
            },
        );
        let moved = op.transform_range(&range, Stickiness::ToNext, Stickiness::ToPrevious);
        assert_eq!(moved.start.path, vec![0, 3]);
        assert_eq!(moved.end.path, vec![0, 5]);
        assert_eq!(doc.children, vec![Node::paragraph("hXYello")]);
    }

    #[test]
    fn split_and_merge_round_trip_positions() {
        let mut doc = Document::new(vec![Node::paragraph("abcd")]);
        let tracked = Position::new(vec![0, 3]);

        let split = applied(
            &mut doc,
            Op::Split {
                position: Position::new(vec![0, 2]),
            },
        );
        let after_split = split.transform_position(&tracked, Stickiness::ToNext);
        assert_eq!(after_split.path, vec![1, 1]);
        assert_eq!(
            doc.children,
            vec![Node::paragraph("ab"), Node::paragraph("cd")]
        );

        let merge = applied(
            &mut doc,
            Op::Merge {
                position: Position::new(vec![1]),
            },
        );
        let after_merge = merge.transform_position(&after_split, Stickiness::ToNext);
        assert_eq!(after_merge.path, vec![0, 3]);
        assert_eq!(doc.children, vec![Node::paragraph("abcd")]);
    }

    #[test]
    fn remove_collapses_positions_inside_removed_content() {
        let mut doc =
            Document::new(vec![Node::paragraph("a"), Node::divider(), Node::paragraph("b")]);
        let op = applied(
            &mut doc,
            Op::Remove {
                position: Position::new(vec![1]),
                howmany: 1,
            },
        );
        assert_eq!(
            op.transform_position(&Position::new(vec![1, 0]), Stickiness::ToNext).path,
            vec![1]
        );
        assert_eq!(
            op.transform_position(&Position::new(vec![2, 1]), Stickiness::ToNext).path,
            vec![1, 1]
        );
        assert_eq!(doc.children.len(), 2);
    }
}
