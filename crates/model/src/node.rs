use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        let text = text.into();
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        };
        Node::element("paragraph", children)
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn void(kind: impl Into<String>) -> Self {
        Node::Void(VoidNode {
            kind: kind.into(),
            attrs: Attrs::default(),
        })
    }

    pub fn divider() -> Self {
        Node::void("divider")
    }

    pub fn image(src: impl Into<String>) -> Self {
        Node::void("image").with_attr("src", serde_json::Value::String(src.into()))
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        match &mut self {
            Node::Element(el) => {
                el.attrs.insert(key.into(), value);
            }
            Node::Void(v) => {
                v.attrs.insert(key.into(), value);
            }
            Node::Text(_) => {}
        }
        self
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        if let Node::Text(t) = &mut self {
            t.marks = marks;
        }
        self
    }

    /// Number of offsets the node occupies in its parent.
    pub fn size(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            Node::Element(_) | Node::Void(_) => 1,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Node::Element(el) => Some(&el.kind),
            Node::Void(v) => Some(&v.kind),
            Node::Text(_) => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Element(el) => Some(&el.attrs),
            Node::Void(v) => Some(&v.attrs),
            Node::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Void(_) | Node::Text(_) => &[],
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// `true` for elements without content. Voids and text are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Element(el) => content_size(&el.children) == 0,
            Node::Void(_) | Node::Text(_) => false,
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Element(el) => el.children.iter().map(Node::plain_text).collect(),
            Node::Void(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

impl TextNode {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub code: bool,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Children of the element at `path`; the empty path is the root.
    pub fn children_at(&self, path: &[usize]) -> Option<&[Node]> {
        if path.is_empty() {
            return Some(&self.children);
        }
        match self.node_at(path)? {
            Node::Element(el) => Some(&el.children),
            Node::Void(_) => Some(&[]),
            Node::Text(_) => None,
        }
    }

    /// Node occupying the offset addressed by `path`. Offsets inside a text run
    /// resolve to the text node holding that character.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (&last, parents) = path.split_last()?;
        let mut children: &[Node] = &self.children;
        for &offset in parents {
            let index = node_index_at(children, offset)?;
            children = match &children[index] {
                Node::Element(el) => &el.children,
                Node::Void(_) | Node::Text(_) => return None,
            };
        }
        match locate(children, last) {
            Locate::At(index) => children.get(index),
            Locate::InText { index, .. } => children.get(index),
            Locate::End => None,
        }
    }

    pub fn max_offset(&self, path: &[usize]) -> usize {
        self.children_at(path).map(content_size).unwrap_or(0)
    }

    pub(crate) fn children_mut(&mut self, path: &[usize]) -> Result<&mut Vec<Node>, ModelError> {
        children_mut(&mut self.children, path, path)
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(Node::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn children_mut<'a>(
    children: &'a mut Vec<Node>,
    rest: &[usize],
    full: &[usize],
) -> Result<&'a mut Vec<Node>, ModelError> {
    let Some((&offset, rest)) = rest.split_first() else {
        return Ok(children);
    };
    let index = node_index_at(children, offset)
        .ok_or_else(|| ModelError::InvalidPath(full.to_vec()))?;
    match &mut children[index] {
        Node::Element(el) => children_mut(&mut el.children, rest, full),
        Node::Void(_) | Node::Text(_) => Err(ModelError::NotAContainer(full.to_vec())),
    }
}

pub fn content_size(children: &[Node]) -> usize {
    children.iter().map(Node::size).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Locate {
    /// A node starts exactly at the offset.
    At(usize),
    /// The offset falls strictly inside the text node at `index`.
    InText { index: usize, char_offset: usize },
    End,
}

pub(crate) fn locate(children: &[Node], offset: usize) -> Locate {
    let mut start = 0;
    for (index, node) in children.iter().enumerate() {
        let size = node.size();
        if size == 0 {
            continue;
        }
        if offset == start {
            return Locate::At(index);
        }
        if offset < start + size {
            return Locate::InText {
                index,
                char_offset: offset - start,
            };
        }
        start += size;
    }
    Locate::End
}

/// Index of the non-text node starting at `offset`.
pub(crate) fn node_index_at(children: &[Node], offset: usize) -> Option<usize> {
    match locate(children, offset) {
        Locate::At(index) if !children[index].is_text() => Some(index),
        _ => None,
    }
}

pub(crate) fn offset_of_index(children: &[Node], index: usize) -> usize {
    content_size(&children[..index.min(children.len())])
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(ix, _)| ix)
        .unwrap_or(text.len())
}

/// Makes sure a node boundary exists at `offset` and returns the index of the
/// first node at or after it.
pub(crate) fn split_at_offset(children: &mut Vec<Node>, offset: usize) -> usize {
    match locate(children, offset) {
        Locate::At(index) => index,
        Locate::End => children.len(),
        Locate::InText { index, char_offset } => {
            let Node::Text(text) = &mut children[index] else {
                return index;
            };
            let at = byte_index(&text.text, char_offset);
            let tail = TextNode {
                text: text.text.split_off(at),
                marks: text.marks.clone(),
            };
            children.insert(index + 1, Node::Text(tail));
            index + 1
        }
    }
}

/// Joins adjacent text leaves with equal marks and drops empty ones.
pub(crate) fn merge_text_leaves(children: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for node in children.drain(..) {
        match node {
            Node::Text(t) if t.text.is_empty() => {}
            Node::Text(t) => match merged.last_mut() {
                Some(Node::Text(prev)) if prev.marks == t.marks => prev.text.push_str(&t.text),
                _ => merged.push(Node::Text(t)),
            },
            other => merged.push(other),
        }
    }
    *children = merged;
}

/// Clones the content between `start` and `end` offsets, descending into the
/// boundary branches when the relative paths continue deeper.
pub(crate) fn slice_children(
    children: &[Node],
    start: Option<&[usize]>,
    end: Option<&[usize]>,
) -> Vec<Node> {
    let from = start.and_then(|p| p.first().copied()).unwrap_or(0);
    let to = end
        .and_then(|p| p.first().copied())
        .unwrap_or_else(|| content_size(children));
    let start_branch = start.filter(|p| p.len() > 1).map(|p| &p[1..]);
    let end_branch = end.filter(|p| p.len() > 1).map(|p| &p[1..]);

    let mut out = Vec::new();
    let mut offset = 0;
    for node in children {
        let size = node.size();
        let node_start = offset;
        offset += size;
        match node {
            Node::Text(t) => {
                let lo = from.max(node_start);
                let hi = to.min(node_start + size);
                if lo < hi {
                    let a = byte_index(&t.text, lo - node_start);
                    let b = byte_index(&t.text, hi - node_start);
                    out.push(Node::Text(TextNode {
                        text: t.text[a..b].to_string(),
                        marks: t.marks.clone(),
                    }));
                }
            }
            Node::Element(el) => {
                let on_start = start_branch.is_some() && node_start == from;
                let on_end = end_branch.is_some() && node_start == to;
                if on_start || on_end {
                    let inner = slice_children(
                        &el.children,
                        if on_start { start_branch } else { None },
                        if on_end { end_branch } else { None },
                    );
                    out.push(Node::Element(ElementNode {
                        kind: el.kind.clone(),
                        attrs: el.attrs.clone(),
                        children: inner,
                    }));
                } else if node_start >= from && node_start < to {
                    out.push(node.clone());
                }
            }
            Node::Void(_) => {
                if node_start >= from && node_start < to {
                    out.push(node.clone());
                }
            }
        }
    }
    out
}
