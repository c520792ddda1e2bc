use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::marker::{Marker, MarkerOptions};
use crate::node::{Document, Node};
use crate::ops::{AppliedOp, Op, apply_op};
use crate::position::{Path, Position, Range, Stickiness};
use crate::schema::{ChildKind, Schema};
use crate::value::ModelValue;
use crate::walker::{Direction, check_child_at, nearest_selection_range};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            focus: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    pub fn range(&self) -> Range {
        Range::new(self.anchor.clone(), self.focus.clone())
    }
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        Self {
            anchor: range.start,
            focus: range.end,
        }
    }
}

/// Handle to a range that follows every change until it is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiveRangeId(u64);

pub struct Model {
    doc: Document,
    schema: Schema,
    selection: Selection,
    markers: BTreeMap<String, Marker>,
    live_ranges: BTreeMap<LiveRangeId, Range>,
    next_live_range: u64,
    version: u64,
    change_depth: usize,
}

impl Model {
    pub fn new(doc: Document, schema: Schema) -> Self {
        let start = Position::new(vec![0]);
        let selection = nearest_selection_range(&doc, &schema, &start, Direction::Forward)
            .map(Selection::from)
            .unwrap_or_else(|| Selection::collapsed(start));
        Self {
            doc,
            schema,
            selection,
            markers: BTreeMap::new(),
            live_ranges: BTreeMap::new(),
            next_live_range: 0,
            version: 0,
            change_depth: 0,
        }
    }

    pub fn with_richtext_schema(doc: Document) -> Self {
        Self::new(doc, Schema::richtext())
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Bumped by every operation and marker change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_selection(&mut self, selection: impl Into<Selection>) {
        self.selection = selection.into();
    }

    pub fn to_value(&self) -> ModelValue {
        ModelValue::from_document(self.doc.clone())
    }

    /// Runs `f` as one change block. Nested blocks join the outermost one and
    /// post-fixing runs once, when it ends.
    pub fn change<R>(&mut self, f: impl FnOnce(&mut Model) -> R) -> R {
        self.begin_change();
        let result = f(self);
        self.end_change();
        result
    }

    pub fn begin_change(&mut self) {
        self.change_depth += 1;
    }

    pub fn end_change(&mut self) {
        self.change_depth = self.change_depth.saturating_sub(1);
        if self.change_depth == 0 {
            self.post_fix_selection();
        }
    }

    pub fn is_in_change(&self) -> bool {
        self.change_depth > 0
    }

    pub fn apply(&mut self, op: Op) -> Result<(), ModelError> {
        let name = op.name();
        let applied = apply_op(&mut self.doc, op)?;
        self.transform_tracked(&applied);
        self.version += 1;
        tracing::trace!(op = name, version = self.version, "applied operation");
        Ok(())
    }

    fn transform_tracked(&mut self, applied: &AppliedOp) {
        let backward = self.selection.is_backward();
        let range = applied.transform_range(
            &self.selection.range(),
            Stickiness::ToNext,
            Stickiness::ToPrevious,
        );
        self.selection = if backward {
            Selection {
                anchor: range.end,
                focus: range.start,
            }
        } else {
            Selection::from(range)
        };

        for marker in self.markers.values_mut() {
            marker.range =
                applied.transform_range(&marker.range, Stickiness::ToNext, Stickiness::ToPrevious);
        }
        for range in self.live_ranges.values_mut() {
            *range = applied.transform_range(range, Stickiness::ToNext, Stickiness::ToPrevious);
        }
    }

    fn post_fix_selection(&mut self) {
        if self.is_valid_selection(&self.selection.range()) {
            return;
        }
        let start = self.selection.range().start;
        if let Some(fixed) = self.nearest_selection_range(&start, Direction::Both) {
            tracing::debug!(?start, ?fixed, "selection post-fixed");
            self.selection = Selection::from(fixed);
        }
    }

    fn is_valid_selection(&self, range: &Range) -> bool {
        let text_ok = |p: &Position| self.check_child_at(p, ChildKind::Text);
        if text_ok(&range.start) && text_ok(&range.end) {
            return true;
        }
        range
            .spanned_node_path()
            .and_then(|path| self.doc.node_at(path))
            .is_some_and(|node| self.schema.is_object(node))
    }

    pub fn track_range(&mut self, range: Range) -> LiveRangeId {
        let id = LiveRangeId(self.next_live_range);
        self.next_live_range += 1;
        self.live_ranges.insert(id, range);
        id
    }

    pub fn live_range(&self, id: LiveRangeId) -> Option<&Range> {
        self.live_ranges.get(&id)
    }

    /// Stops tracking; returns the last known range.
    pub fn detach(&mut self, id: LiveRangeId) -> Option<Range> {
        self.live_ranges.remove(&id)
    }

    pub fn live_range_count(&self) -> usize {
        self.live_ranges.len()
    }

    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.markers.get(name)
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn add_marker(&mut self, name: &str, options: MarkerOptions) -> Result<(), ModelError> {
        if self.markers.contains_key(name) {
            return Err(ModelError::MarkerExists(name.to_string()));
        }
        self.markers.insert(
            name.to_string(),
            Marker {
                name: name.to_string(),
                range: options.range,
                managed_using_operations: options.managed_using_operations,
                affects_data: options.affects_data,
            },
        );
        self.version += 1;
        Ok(())
    }

    pub fn update_marker(&mut self, name: &str, range: Range) -> Result<(), ModelError> {
        let marker = self
            .markers
            .get_mut(name)
            .ok_or_else(|| ModelError::MissingMarker(name.to_string()))?;
        marker.range = range;
        self.version += 1;
        Ok(())
    }

    pub fn remove_marker(&mut self, name: &str) -> Result<Marker, ModelError> {
        let marker = self
            .markers
            .remove(name)
            .ok_or_else(|| ModelError::MissingMarker(name.to_string()))?;
        self.version += 1;
        Ok(marker)
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        self.doc.node_at(path)
    }

    /// Non-text node right after `position`.
    pub fn node_after(&self, position: &Position) -> Option<&Node> {
        self.doc.node_at(&position.path).filter(|node| !node.is_text())
    }

    /// The element holding `position`; `None` for the root or a dangling path.
    pub fn parent_node(&self, position: &Position) -> Option<&Node> {
        let parent = position.parent_path();
        if parent.is_empty() {
            return None;
        }
        self.doc.node_at(parent)
    }

    pub fn is_object_at(&self, path: &[usize]) -> bool {
        self.doc
            .node_at(path)
            .is_some_and(|node| self.schema.is_object(node))
    }

    pub fn check_child_at(&self, position: &Position, child: ChildKind<'_>) -> bool {
        check_child_at(&self.doc, &self.schema, position, child)
    }

    /// Whether the element at `path` (or the root for the empty path) accepts `child`.
    pub fn check_child_in(&self, path: &[usize], child: ChildKind<'_>) -> bool {
        if path.is_empty() {
            return self.schema.check_child(None, child);
        }
        match self.doc.node_at(path) {
            Some(node) if !node.is_text() => self.schema.check_child(Some(node), child),
            _ => false,
        }
    }

    pub fn nearest_selection_range(
        &self,
        position: &Position,
        direction: Direction,
    ) -> Option<Range> {
        nearest_selection_range(&self.doc, &self.schema, position, direction)
    }

    /// Path of the object the selection spans exactly, if any.
    pub fn selected_element(&self) -> Option<Path> {
        let range = self.selection.range();
        let path = range.spanned_node_path()?;
        self.is_object_at(path).then(|| path.to_vec())
    }

    /// Path of the deepest text block holding `position`, if any.
    pub fn text_block_at(&self, position: &Position) -> Option<Path> {
        let parent = position.parent_path();
        (1..=parent.len()).rev().map(|len| &parent[..len]).find_map(|path| {
            self.doc
                .node_at(path)
                .filter(|node| self.schema.is_text_block(node))
                .map(|_| path.to_vec())
        })
    }
}
