use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
    Any,
    Only(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    /// Selected and moved only as a whole; the caret never enters it directly.
    pub is_object: bool,
    /// Selection and tree walks never leave it.
    pub is_limit: bool,
    /// Rendered as a nested editable region.
    pub editable: bool,
    pub children: ChildConstraint,
}

impl NodeSpec {
    pub fn block(kind: impl Into<String>, children: ChildConstraint) -> Self {
        Self {
            kind: kind.into(),
            role: NodeRole::Block,
            is_object: false,
            is_limit: false,
            editable: false,
            children,
        }
    }

    pub fn inline_object(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            role: NodeRole::Inline,
            is_object: true,
            is_limit: false,
            editable: false,
            children: ChildConstraint::None,
        }
    }

    pub fn object(mut self) -> Self {
        self.is_object = true;
        self
    }

    pub fn limit(mut self) -> Self {
        self.is_limit = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }
}

/// What is being placed when checking a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind<'a> {
    Text,
    Block,
    Kind(&'a str),
}

pub trait SchemaPlugin {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec>;
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    node_specs: HashMap<String, NodeSpec>,
}

impl Schema {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn SchemaPlugin>>,
    ) -> Result<Self, ModelError> {
        let mut schema = Self::default();
        for plugin in plugins {
            schema.register_plugin(plugin.as_ref())?;
        }
        Ok(schema)
    }

    pub fn richtext() -> Self {
        let plugins: Vec<Box<dyn SchemaPlugin>> = vec![
            Box::new(CoreBlocksPlugin),
            Box::new(CoreDividerPlugin),
            Box::new(ImagePlugin),
            Box::new(MentionPlugin),
            Box::new(TablePlugin),
        ];
        Self::new(plugins).expect("richtext schema must be valid")
    }

    pub fn register_plugin(&mut self, plugin: &dyn SchemaPlugin) -> Result<(), ModelError> {
        for spec in plugin.node_specs() {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(ModelError::DuplicateKind(spec.kind));
            }
            self.node_specs.insert(spec.kind.clone(), spec);
        }
        Ok(())
    }

    pub fn spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.node_specs.get(kind)
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.node_specs.contains_key(kind)
    }

    pub fn is_object(&self, node: &Node) -> bool {
        match node {
            Node::Void(_) => true,
            Node::Element(el) => self.spec(&el.kind).is_some_and(|s| s.is_object),
            Node::Text(_) => false,
        }
    }

    pub fn is_limit(&self, node: &Node) -> bool {
        self.is_object(node)
            || node
                .kind()
                .and_then(|kind| self.spec(kind))
                .is_some_and(|s| s.is_limit)
    }

    pub fn is_inline(&self, node: &Node) -> bool {
        match node {
            Node::Text(_) => true,
            Node::Element(_) | Node::Void(_) => node
                .kind()
                .and_then(|kind| self.spec(kind))
                .is_some_and(|s| s.role == NodeRole::Inline),
        }
    }

    pub fn is_editable(&self, node: &Node) -> bool {
        node.kind()
            .and_then(|kind| self.spec(kind))
            .is_some_and(|s| s.editable)
    }

    /// An element whose children are inline content.
    pub fn is_text_block(&self, node: &Node) -> bool {
        matches!(node, Node::Element(_)) && self.check_child(Some(node), ChildKind::Text)
    }

    /// `parent == None` checks the document root.
    pub fn check_child(&self, parent: Option<&Node>, child: ChildKind<'_>) -> bool {
        let constraint = match parent {
            None => &ChildConstraint::BlockOnly,
            Some(Node::Text(_)) | Some(Node::Void(_)) => return false,
            Some(Node::Element(el)) => match self.spec(&el.kind) {
                Some(spec) => &spec.children,
                None => &ChildConstraint::Any,
            },
        };

        match (constraint, child) {
            (ChildConstraint::None, _) => false,
            (ChildConstraint::Any, _) => true,
            (ChildConstraint::InlineOnly, ChildKind::Text) => true,
            (ChildConstraint::InlineOnly, ChildKind::Block) => false,
            (ChildConstraint::BlockOnly, ChildKind::Text) => false,
            (ChildConstraint::BlockOnly, ChildKind::Block) => true,
            (ChildConstraint::Only(_), ChildKind::Text | ChildKind::Block) => false,
            (ChildConstraint::Only(kinds), ChildKind::Kind(kind)) => {
                kinds.iter().any(|k| k == kind)
            }
            (ChildConstraint::InlineOnly, ChildKind::Kind(kind)) => {
                self.role_of(kind) == NodeRole::Inline
            }
            (ChildConstraint::BlockOnly, ChildKind::Kind(kind)) => {
                self.role_of(kind) == NodeRole::Block
            }
        }
    }

    /// Whether `node` may be placed inside `parent`.
    pub fn allows_node(&self, parent: Option<&Node>, node: &Node) -> bool {
        match node {
            Node::Text(_) => self.check_child(parent, ChildKind::Text),
            Node::Element(_) | Node::Void(_) => {
                let kind = node.kind().unwrap_or_default();
                self.check_child(parent, ChildKind::Kind(kind))
            }
        }
    }

    fn role_of(&self, kind: &str) -> NodeRole {
        self.spec(kind)
            .map(|s| s.role.clone())
            .unwrap_or(NodeRole::Block)
    }
}

struct CoreBlocksPlugin;

impl SchemaPlugin for CoreBlocksPlugin {
    fn id(&self) -> &'static str {
        "core.blocks"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block("paragraph", ChildConstraint::InlineOnly),
            NodeSpec::block("heading", ChildConstraint::InlineOnly),
            NodeSpec::block("blockquote", ChildConstraint::BlockOnly),
        ]
    }
}

struct CoreDividerPlugin;

impl SchemaPlugin for CoreDividerPlugin {
    fn id(&self) -> &'static str {
        "core.divider"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::block("divider", ChildConstraint::None).object()]
    }
}

struct ImagePlugin;

impl SchemaPlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            // Uncaptioned block images are voids; captioned ones are elements
            // holding a single caption.
            NodeSpec::block("image", ChildConstraint::Only(vec!["caption".to_string()])).object(),
            NodeSpec::block("caption", ChildConstraint::InlineOnly)
                .limit()
                .editable(),
            NodeSpec::inline_object("image_inline"),
        ]
    }
}

struct MentionPlugin;

impl SchemaPlugin for MentionPlugin {
    fn id(&self) -> &'static str {
        "mention"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::inline_object("mention")]
    }
}

struct TablePlugin;

impl SchemaPlugin for TablePlugin {
    fn id(&self) -> &'static str {
        "table"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::block("table", ChildConstraint::Only(vec!["table_row".to_string()])).object(),
            NodeSpec::block("table_row", ChildConstraint::Only(vec!["table_cell".to_string()]))
                .limit(),
            NodeSpec::block("table_cell", ChildConstraint::BlockOnly)
                .limit()
                .editable(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DuplicateParagraph;

    impl SchemaPlugin for DuplicateParagraph {
        fn id(&self) -> &'static str {
            "test.duplicate"
        }

        fn node_specs(&self) -> Vec<NodeSpec> {
            vec![NodeSpec::block("paragraph", ChildConstraint::Any)]
        }
    }

    #[test]
    fn duplicate_kinds_are_rejected() {
        let mut schema = Schema::richtext();
        let err = schema.register_plugin(&DuplicateParagraph).unwrap_err();
        assert_eq!(err, ModelError::DuplicateKind("paragraph".to_string()));
    }

    #[test]
    fn check_child_follows_constraints() {
        let schema = Schema::richtext();
        let paragraph = Node::paragraph("x");
        let cell = Node::element("table_cell", vec![Node::paragraph("")]);
        let table = Node::element("table", Vec::new());

        assert!(schema.check_child(None, ChildKind::Block));
        assert!(!schema.check_child(None, ChildKind::Text));
        assert!(schema.check_child(Some(&paragraph), ChildKind::Text));
        assert!(schema.check_child(Some(&paragraph), ChildKind::Kind("mention")));
        assert!(!schema.check_child(Some(&paragraph), ChildKind::Kind("table")));
        assert!(schema.check_child(Some(&cell), ChildKind::Block));
        assert!(!schema.check_child(Some(&table), ChildKind::Block));
        assert!(schema.check_child(Some(&table), ChildKind::Kind("table_row")));
        assert!(schema.is_object(&table));
        assert!(schema.is_limit(&cell));
        assert!(!schema.is_object(&cell));
    }
}
