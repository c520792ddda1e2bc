use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::Model;
use crate::node::{Marks, Node};
use crate::position::{Path, Position, Range};
use crate::schema::ChildKind;

pub const DROP_TARGET_MARKER: &str = "drop-target";
pub const DROP_TARGET_POSITION_CLASS: &str = "drop-target-position";
pub const DROP_TARGET_RANGE_CLASS: &str = "drop-target-range";
pub const SELECTION_HANDLE_CLASS: &str = "widget-selection-handle";

/// Handle to a view node. Ids are never reused for different content, so an
/// id kept across renders either resolves to the same mapped element or to
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    RootEditable,
    NestedEditable,
    Container,
    Widget,
    /// Formatting wrapper around text; not mapped to a model element.
    AttributeElement,
    /// Rendering-only element: selection handles, drop indicators.
    UiElement,
    Text,
}

#[derive(Debug, Clone)]
pub struct ViewNode {
    kind: ViewKind,
    name: String,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    model_path: Option<Path>,
    text: String,
    text_start: usize,
    attrs: BTreeMap<String, String>,
    classes: BTreeSet<String>,
}

impl ViewNode {
    fn new(kind: ViewKind, name: &str, parent: Option<ViewId>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            parent,
            children: Vec::new(),
            model_path: None,
            text: String::new(),
            text_start: 0,
            attrs: BTreeMap::new(),
            classes: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A place in the view: a child index for elements, a character offset for
/// text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPosition {
    pub parent: ViewId,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRange {
    pub start: ViewPosition,
    pub end: ViewPosition,
}

impl ViewRange {
    pub fn collapsed(position: ViewPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }
}

struct Previous {
    nodes: HashMap<ViewId, ViewNode>,
    by_model_path: HashMap<Path, ViewId>,
}

struct DropTarget {
    /// Inline indicator position, when the marker starts where text is allowed.
    position: Option<Position>,
    /// Object the marker spans, otherwise.
    object: Option<Path>,
}

/// Rendered editing tree plus the model/view mapping.
#[derive(Debug, Default)]
pub struct EditingView {
    nodes: HashMap<ViewId, ViewNode>,
    root: Option<ViewId>,
    by_model_path: HashMap<Path, ViewId>,
    next_id: u64,
    focused: bool,
}

impl EditingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the tree from `model`. Mapped elements keep their id and the
    /// attributes set on them when the element at the same path has the same
    /// kind; everything else gets fresh ids.
    pub fn render(&mut self, model: &Model) {
        let previous = Previous {
            nodes: std::mem::take(&mut self.nodes),
            by_model_path: std::mem::take(&mut self.by_model_path),
        };

        let drop_target = model.marker(DROP_TARGET_MARKER).map(|marker| {
            let range = &marker.range;
            if model.check_child_at(&range.start, ChildKind::Text) {
                DropTarget {
                    position: Some(range.start.clone()),
                    object: None,
                }
            } else {
                DropTarget {
                    position: None,
                    object: range
                        .spanned_node_path()
                        .filter(|path| model.is_object_at(path))
                        .map(<[usize]>::to_vec),
                }
            }
        });

        let root = self.alloc(
            ViewKind::RootEditable,
            "$root",
            None,
            Some(Vec::new()),
            Some(&previous),
        );
        self.root = Some(root);
        self.render_children(
            model,
            root,
            &[],
            &model.doc().children,
            drop_target.as_ref(),
            &previous,
        );
        tracing::trace!(nodes = self.nodes.len(), "view rendered");
    }

    fn fresh_id(&mut self) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc(
        &mut self,
        kind: ViewKind,
        name: &str,
        parent: Option<ViewId>,
        model_path: Option<Path>,
        previous: Option<&Previous>,
    ) -> ViewId {
        let reused = previous.and_then(|previous| {
            let id = *previous.by_model_path.get(model_path.as_ref()?)?;
            let old = previous.nodes.get(&id)?;
            (old.kind == kind && old.name == name).then_some((id, old))
        });
        let id = match reused {
            Some((id, _)) => id,
            None => self.fresh_id(),
        };

        let mut node = ViewNode::new(kind, name, parent);
        if let Some((_, old)) = reused {
            node.attrs = old.attrs.clone();
        }
        if let Some(path) = &model_path {
            self.by_model_path.insert(path.clone(), id);
        }
        node.model_path = model_path;
        self.nodes.insert(id, node);
        if let Some(parent) = parent {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.children.push(id);
            }
        }
        id
    }

    fn render_children(
        &mut self,
        model: &Model,
        parent: ViewId,
        path: &[usize],
        children: &[Node],
        drop_target: Option<&DropTarget>,
        previous: &Previous,
    ) {
        let drop_at = drop_target
            .and_then(|target| target.position.as_ref())
            .filter(|position| position.parent_path() == path)
            .map(Position::offset);
        let mut placed = drop_at.is_none();
        let mut offset = 0;

        for node in children {
            let size = node.size();
            match node {
                Node::Text(text) => {
                    let cut = drop_at
                        .filter(|&at| !placed && at >= offset && at < offset + size)
                        .map(|at| at - offset);
                    match cut {
                        Some(cut) => {
                            let head: String = text.text.chars().take(cut).collect();
                            let tail: String = text.text.chars().skip(cut).collect();
                            if !head.is_empty() {
                                self.render_text(parent, head, &text.marks, offset);
                            }
                            self.render_drop_position(parent);
                            self.render_text(parent, tail, &text.marks, offset + cut);
                            placed = true;
                        }
                        None => self.render_text(parent, text.text.clone(), &text.marks, offset),
                    }
                }
                Node::Element(_) | Node::Void(_) => {
                    if !placed && drop_at == Some(offset) {
                        self.render_drop_position(parent);
                        placed = true;
                    }
                    let mut child_path = path.to_vec();
                    child_path.push(offset);
                    self.render_node(model, parent, child_path, node, drop_target, previous);
                }
            }
            offset += size;
        }

        if !placed && drop_at == Some(offset) {
            self.render_drop_position(parent);
        }
    }

    fn render_node(
        &mut self,
        model: &Model,
        parent: ViewId,
        path: Path,
        node: &Node,
        drop_target: Option<&DropTarget>,
        previous: &Previous,
    ) {
        let schema = model.schema();
        let kind = if schema.is_object(node) {
            ViewKind::Widget
        } else if schema.is_editable(node) {
            ViewKind::NestedEditable
        } else {
            ViewKind::Container
        };
        let highlighted = drop_target
            .and_then(|target| target.object.as_ref())
            .is_some_and(|object| *object == path);

        let id = self.alloc(
            kind,
            node.kind().unwrap_or_default(),
            Some(parent),
            Some(path.clone()),
            Some(previous),
        );
        if kind == ViewKind::Widget {
            if !schema.is_inline(node) {
                let handle = self.alloc(ViewKind::UiElement, "div", Some(id), None, None);
                self.add_class(handle, SELECTION_HANDLE_CLASS);
            }
            if highlighted {
                self.add_class(id, DROP_TARGET_RANGE_CLASS);
            }
        }

        if let Node::Element(element) = node {
            self.render_children(model, id, &path, &element.children, drop_target, previous);
        }
    }

    fn render_text(&mut self, parent: ViewId, text: String, marks: &Marks, start: usize) {
        let mut parent = parent;
        if marks.bold {
            parent = self.alloc(ViewKind::AttributeElement, "strong", Some(parent), None, None);
        }
        if marks.code {
            parent = self.alloc(ViewKind::AttributeElement, "code", Some(parent), None, None);
        }
        let id = self.alloc(ViewKind::Text, "$text", Some(parent), None, None);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.text = text;
            node.text_start = start;
        }
    }

    fn render_drop_position(&mut self, parent: ViewId) {
        let id = self.alloc(ViewKind::UiElement, "span", Some(parent), None, None);
        self.add_class(id, DROP_TARGET_POSITION_CLASS);
    }

    fn add_class(&mut self, id: ViewId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.classes.insert(class.to_string());
        }
    }

    pub fn root(&self) -> Option<ViewId> {
        self.root
    }

    pub fn node(&self, id: ViewId) -> Option<&ViewNode> {
        self.nodes.get(&id)
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.nodes.get(&id)?.parent
    }

    pub fn children(&self, id: ViewId) -> &[ViewId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: ViewId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn kind(&self, id: ViewId) -> Option<ViewKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    pub fn is_widget(&self, id: ViewId) -> bool {
        self.kind(id) == Some(ViewKind::Widget)
    }

    pub fn is_editable(&self, id: ViewId) -> bool {
        matches!(
            self.kind(id),
            Some(ViewKind::RootEditable | ViewKind::NestedEditable)
        )
    }

    pub fn is_root(&self, id: ViewId) -> bool {
        self.kind(id) == Some(ViewKind::RootEditable)
    }

    pub fn is_ui_element(&self, id: ViewId) -> bool {
        self.kind(id) == Some(ViewKind::UiElement)
    }

    /// Closest strict ancestor matching `predicate`.
    pub fn find_ancestor(
        &self,
        id: ViewId,
        predicate: impl Fn(&EditingView, ViewId) -> bool,
    ) -> Option<ViewId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if predicate(self, node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// The editing root holding `id`.
    pub fn root_of(&self, id: ViewId) -> Option<ViewId> {
        let mut current = id;
        loop {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return self.nodes.contains_key(&current).then_some(current),
            }
        }
    }

    /// Returns `false` when `id` no longer exists.
    pub fn set_attribute(&mut self, id: ViewId, key: &str, value: &str) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.attrs.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, id: ViewId, key: &str) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => node.attrs.remove(key).is_some(),
            None => false,
        }
    }

    pub fn attribute(&self, id: ViewId, key: &str) -> Option<&str> {
        self.nodes.get(&id)?.attrs.get(key).map(String::as_str)
    }

    pub fn has_class(&self, id: ViewId, class: &str) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.classes.contains(class))
    }

    /// Every node carrying `class`, in id order.
    pub fn find_by_class(&self, class: &str) -> Vec<ViewId> {
        let mut found: Vec<ViewId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.classes.contains(class))
            .map(|(&id, _)| id)
            .collect();
        found.sort();
        found
    }

    pub fn find_by_model_path(&self, path: &[usize]) -> Option<ViewId> {
        self.by_model_path.get(path).copied()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Model element a view element is bound to. Text, UI and attribute
    /// elements are never bound.
    pub fn to_model_element(&self, id: ViewId) -> Option<Path> {
        let node = self.nodes.get(&id)?;
        match node.kind {
            ViewKind::Text | ViewKind::UiElement | ViewKind::AttributeElement => None,
            _ => node.model_path.clone(),
        }
    }

    /// `id` itself when it is mapped, otherwise its closest mapped ancestor.
    pub fn find_mapped_view_ancestor(&self, id: ViewId) -> Option<ViewId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.to_model_element(node).is_some() {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn to_model_position(&self, position: &ViewPosition) -> Option<Position> {
        let node = self.nodes.get(&position.parent)?;
        match node.kind {
            ViewKind::Text => {
                let mapped = self.find_mapped_view_ancestor(position.parent)?;
                let path = self.to_model_element(mapped)?;
                let offset = node.text_start + position.offset.min(node.char_len());
                Some(Position::at(&path, offset))
            }
            ViewKind::UiElement => {
                let before = ViewPosition {
                    parent: node.parent?,
                    offset: self.index_in_parent(position.parent)?,
                };
                self.to_model_position(&before)
            }
            _ => {
                let mapped = self.find_mapped_view_ancestor(position.parent)?;
                let path = self.to_model_element(mapped)?;
                let offset = self.model_offset_in(position.parent, position.offset)?;
                Some(Position::at(&path, offset))
            }
        }
    }

    pub fn to_model_range(&self, range: &ViewRange) -> Option<Range> {
        Some(Range::new(
            self.to_model_position(&range.start)?,
            self.to_model_position(&range.end)?,
        ))
    }

    pub fn to_view_position(&self, position: &Position) -> Option<ViewPosition> {
        let container = self.find_by_model_path(position.parent_path())?;
        Some(
            self.find_view_position(container, position.offset())
                .unwrap_or(ViewPosition {
                    parent: container,
                    offset: self.children(container).len(),
                }),
        )
    }

    pub fn to_view_range(&self, range: &Range) -> Option<ViewRange> {
        Some(ViewRange {
            start: self.to_view_position(&range.start)?,
            end: self.to_view_position(&range.end)?,
        })
    }

    fn find_view_position(&self, container: ViewId, offset: usize) -> Option<ViewPosition> {
        for (index, &child) in self.children(container).iter().enumerate() {
            let node = self.nodes.get(&child)?;
            match node.kind {
                ViewKind::Text => {
                    let start = node.text_start;
                    if offset >= start && offset <= start + node.char_len() {
                        return Some(ViewPosition {
                            parent: child,
                            offset: offset - start,
                        });
                    }
                }
                ViewKind::UiElement => {}
                ViewKind::AttributeElement => {
                    if let Some(found) = self.find_view_position(child, offset) {
                        return Some(found);
                    }
                }
                _ => {
                    if self.start_offset(child) == Some(offset) {
                        return Some(ViewPosition {
                            parent: container,
                            offset: index,
                        });
                    }
                }
            }
        }
        None
    }

    /// Model offset at view child `index` of `parent`.
    fn model_offset_in(&self, parent: ViewId, index: usize) -> Option<usize> {
        let children = self.children(parent);
        let index = index.min(children.len());
        if let Some(start) = children[index..].iter().find_map(|&c| self.start_offset(c)) {
            return Some(start);
        }
        if let Some(end) = children[..index].iter().rev().find_map(|&c| self.end_offset(c)) {
            return Some(end);
        }
        if self.to_model_element(parent).is_some() {
            return Some(0);
        }
        let grand = self.parent(parent)?;
        let at = self.index_in_parent(parent)?;
        self.model_offset_in(grand, at)
    }

    fn start_offset(&self, id: ViewId) -> Option<usize> {
        let node = self.nodes.get(&id)?;
        match node.kind {
            ViewKind::Text => Some(node.text_start),
            ViewKind::UiElement => None,
            ViewKind::AttributeElement => node.children.iter().find_map(|&c| self.start_offset(c)),
            _ => node.model_path.as_ref()?.last().copied(),
        }
    }

    fn end_offset(&self, id: ViewId) -> Option<usize> {
        let node = self.nodes.get(&id)?;
        match node.kind {
            ViewKind::Text => Some(node.text_start + node.char_len()),
            ViewKind::UiElement => None,
            ViewKind::AttributeElement => {
                node.children.iter().rev().find_map(|&c| self.end_offset(c))
            }
            _ => node.model_path.as_ref()?.last().map(|offset| offset + 1),
        }
    }

    /// The editable element holding a model position.
    pub fn editable_for_model_position(&self, position: &Position) -> Option<ViewId> {
        let view_position = self.to_view_position(position)?;
        let parent = view_position.parent;
        if self.is_editable(parent) {
            return Some(parent);
        }
        self.find_ancestor(parent, |view, id| view.is_editable(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Document;

    #[test]
    fn positions_map_through_attribute_elements() {
        let doc = Document::new(vec![Node::element(
            "paragraph",
            vec![
                Node::text("ab"),
                Node::text("cd").with_marks(Marks {
                    code: true,
                    ..Marks::default()
                }),
            ],
        )]);
        let model = Model::with_richtext_schema(doc);
        let mut view = EditingView::new();
        view.render(&model);

        let position = Position::new(vec![0, 3]);
        let view_position = view.to_view_position(&position).expect("mapped");
        assert_eq!(view.node(view_position.parent).map(ViewNode::text), Some("cd"));
        assert_eq!(view.to_model_position(&view_position), Some(position));

        let code = view.parent(view_position.parent).expect("code wrapper");
        assert_eq!(view.to_model_element(code), None);
        let mapped = view.find_mapped_view_ancestor(code).expect("paragraph");
        assert_eq!(view.to_model_element(mapped), Some(vec![0]));
    }

    #[test]
    fn mapped_ids_survive_rerender() {
        let doc = Document::new(vec![Node::paragraph("a"), Node::image("x.png")]);
        let model = Model::with_richtext_schema(doc);
        let mut view = EditingView::new();
        view.render(&model);
        let widget = view.find_by_model_path(&[1]).expect("widget");
        assert!(view.is_widget(widget));
        assert!(view.set_attribute(widget, "draggable", "true"));

        view.render(&model);
        assert_eq!(view.find_by_model_path(&[1]), Some(widget));
        assert_eq!(view.attribute(widget, "draggable"), Some("true"));
    }
}
