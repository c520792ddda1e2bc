use serde::{Deserialize, Serialize};

/// Offsets from the root down to a position or node.
pub type Path = Vec<usize>;

/// A place between two offsets of an element (or of the root).
///
/// The last path entry is the offset in the parent; every earlier entry is
/// the offset of an ancestor in its own parent. Positions compare in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub path: Path,
}

impl Position {
    pub fn new(path: Path) -> Self {
        debug_assert!(!path.is_empty(), "a position needs at least an offset");
        Self { path }
    }

    pub fn at(parent: &[usize], offset: usize) -> Self {
        let mut path = parent.to_vec();
        path.push(offset);
        Self { path }
    }

    pub fn before(node_path: &[usize]) -> Self {
        Self {
            path: node_path.to_vec(),
        }
    }

    pub fn after(node_path: &[usize]) -> Self {
        let mut path = node_path.to_vec();
        if let Some(last) = path.last_mut() {
            *last += 1;
        }
        Self { path }
    }

    pub fn parent_path(&self) -> &[usize] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    pub fn offset(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }

    pub fn with_offset(&self, offset: usize) -> Self {
        Self::at(self.parent_path(), offset)
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Which neighbour a tracked position follows when content is inserted exactly
/// at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stickiness {
    ToNext,
    ToPrevious,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    /// Range spanning exactly the node at `node_path`.
    pub fn on(node_path: &[usize]) -> Self {
        Self {
            start: Position::before(node_path),
            end: Position::after(node_path),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Both ends share one parent.
    pub fn is_flat(&self) -> bool {
        self.start.parent_path() == self.end.parent_path()
    }

    /// Path of the node when the range spans exactly one node.
    pub fn spanned_node_path(&self) -> Option<&[usize]> {
        if self.is_flat() && self.end.offset() == self.start.offset() + 1 {
            Some(&self.start.path)
        } else {
            None
        }
    }

    /// Strictly between the range ends.
    pub fn contains_position(&self, position: &Position) -> bool {
        *position > self.start && *position < self.end
    }

    /// With `loose`, `other` may share a boundary with this range. A collapsed
    /// `other` is always checked strictly.
    pub fn contains_range(&self, other: &Range, loose: bool) -> bool {
        let loose = loose && !other.is_collapsed();
        let contains_start =
            self.contains_position(&other.start) || (loose && self.start == other.start);
        let contains_end = self.contains_position(&other.end) || (loose && self.end == other.end);
        contains_start && contains_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_on_spans_single_node() {
        let range = Range::on(&[2, 1]);
        assert_eq!(range.start.path, vec![2, 1]);
        assert_eq!(range.end.path, vec![2, 2]);
        assert_eq!(range.spanned_node_path(), Some(&[2, 1][..]));
    }

    #[test]
    fn contains_range_treats_collapsed_targets_strictly() {
        let dragged = Range::new(Position::new(vec![0, 0]), Position::new(vec![0, 5]));
        let inside = Range::collapsed(Position::new(vec![0, 3]));
        let at_end = Range::collapsed(Position::new(vec![0, 5]));
        let same = dragged.clone();

        assert!(dragged.contains_range(&inside, true));
        assert!(!dragged.contains_range(&at_end, true));
        assert!(dragged.contains_range(&same, true));
        assert!(!dragged.contains_range(&same, false));
    }

    #[test]
    fn positions_order_by_document_order() {
        let before = Position::new(vec![1]);
        let inside = Position::new(vec![1, 0]);
        let after = Position::new(vec![2]);
        assert!(before < inside);
        assert!(inside < after);
    }
}
