use serde::{Deserialize, Serialize};

use crate::node::{Document, Locate, Node, locate, offset_of_index};
use crate::position::{Path, Position, Range};
use crate::schema::{ChildKind, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Both,
}

/// Checks what the parent of `position` accepts.
pub fn check_child_at(
    doc: &Document,
    schema: &Schema,
    position: &Position,
    child: ChildKind<'_>,
) -> bool {
    let parent = position.parent_path();
    if position.offset() > doc.max_offset(parent) {
        return false;
    }
    if parent.is_empty() {
        return schema.check_child(None, child);
    }
    match doc.node_at(parent) {
        Some(node @ (Node::Element(_) | Node::Void(_))) => schema.check_child(Some(node), child),
        _ => false,
    }
}

/// Closest range where a selection may be placed, starting from `position`.
///
/// A position that accepts text is returned as is. Otherwise the tree is walked
/// inside the nearest limit ancestor: the first object met from its near side
/// yields a range on it, the first position accepting text yields a collapsed
/// range.
pub fn nearest_selection_range(
    doc: &Document,
    schema: &Schema,
    position: &Position,
    direction: Direction,
) -> Option<Range> {
    if check_child_at(doc, schema, position, ChildKind::Text) {
        return Some(Range::collapsed(position.clone()));
    }

    let boundary = limit_ancestor(doc, schema, position);
    let mut backward = matches!(direction, Direction::Backward | Direction::Both)
        .then(|| Walker::new(doc, boundary.clone(), position.clone(), false));
    let mut forward = matches!(direction, Direction::Forward | Direction::Both)
        .then(|| Walker::new(doc, boundary, position.clone(), true));

    loop {
        let mut progressed = false;

        if let Some(walker) = backward.as_mut() {
            match walker.next() {
                Some(step) => {
                    progressed = true;
                    if let Some(range) = accept(doc, schema, &step, Edge::End) {
                        return Some(range);
                    }
                }
                None => backward = None,
            }
        }

        if let Some(walker) = forward.as_mut() {
            match walker.next() {
                Some(step) => {
                    progressed = true;
                    if let Some(range) = accept(doc, schema, &step, Edge::Start) {
                        return Some(range);
                    }
                }
                None => forward = None,
            }
        }

        if !progressed {
            return None;
        }
    }
}

/// Path of the closest ancestor of `position` that is a limit, or the root.
pub fn limit_ancestor(doc: &Document, schema: &Schema, position: &Position) -> Path {
    let parent = position.parent_path();
    for len in (1..=parent.len()).rev() {
        let path = &parent[..len];
        if doc.node_at(path).is_some_and(|node| schema.is_limit(node)) {
            return path.to_vec();
        }
    }
    Vec::new()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

fn accept(
    doc: &Document,
    schema: &Schema,
    step: &WalkStep<'_>,
    object_edge: Edge,
) -> Option<Range> {
    if let Some((node, path)) = &step.element {
        if step.edge == object_edge && schema.is_object(node) {
            return Some(Range::on(path));
        }
    }
    check_child_at(doc, schema, &step.next, ChildKind::Text)
        .then(|| Range::collapsed(step.next.clone()))
}

struct WalkStep<'a> {
    /// Element entered or left, with its path; `None` for text runs.
    element: Option<(&'a Node, Path)>,
    edge: Edge,
    next: Position,
}

struct Walker<'a> {
    doc: &'a Document,
    boundary: Path,
    position: Position,
    forward: bool,
}

impl<'a> Walker<'a> {
    fn new(doc: &'a Document, boundary: Path, position: Position, forward: bool) -> Self {
        Self {
            doc,
            boundary,
            position,
            forward,
        }
    }

    fn next(&mut self) -> Option<WalkStep<'a>> {
        let step = if self.forward {
            self.step_forward()?
        } else {
            self.step_backward()?
        };
        self.position = step.next.clone();
        Some(step)
    }

    fn step_forward(&self) -> Option<WalkStep<'a>> {
        let parent = self.position.parent_path();
        let offset = self.position.offset();
        let children = self.doc.children_at(parent)?;
        let size = self.doc.max_offset(parent);

        if offset >= size {
            if parent == self.boundary.as_slice() {
                return None;
            }
            let node = self.doc.node_at(parent)?;
            return Some(WalkStep {
                element: Some((node, parent.to_vec())),
                edge: Edge::End,
                next: Position::after(parent),
            });
        }

        let index = match locate(children, offset) {
            Locate::At(index) | Locate::InText { index, .. } => index,
            Locate::End => return None,
        };
        let node = &children[index];
        if node.is_text() {
            let run_end = offset_of_index(children, index) + node.size();
            return Some(WalkStep {
                element: None,
                edge: Edge::Start,
                next: self.position.with_offset(run_end),
            });
        }

        let path = self.position.path.clone();
        Some(WalkStep {
            next: Position::at(&path, 0),
            element: Some((node, path)),
            edge: Edge::Start,
        })
    }

    fn step_backward(&self) -> Option<WalkStep<'a>> {
        let parent = self.position.parent_path();
        let offset = self.position.offset();
        let children = self.doc.children_at(parent)?;

        if offset == 0 {
            if parent == self.boundary.as_slice() {
                return None;
            }
            let node = self.doc.node_at(parent)?;
            return Some(WalkStep {
                element: Some((node, parent.to_vec())),
                edge: Edge::Start,
                next: Position::before(parent),
            });
        }

        let index = match locate(children, offset - 1) {
            Locate::At(index) | Locate::InText { index, .. } => index,
            Locate::End => return None,
        };
        let node = &children[index];
        if node.is_text() {
            let run_start = offset_of_index(children, index);
            return Some(WalkStep {
                element: None,
                edge: Edge::End,
                next: self.position.with_offset(run_start),
            });
        }

        let path = self.position.with_offset(offset - 1).path;
        let inner_size = self.doc.max_offset(&path);
        Some(WalkStep {
            next: Position::at(&path, inner_size),
            element: Some((node, path)),
            edge: Edge::End,
        })
    }
}
