use serde::{Deserialize, Serialize};

use crate::node::{Document, Node};

const DEFAULT_SCHEMA: &str = "plate-model";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Serializable snapshot of a document. Markers, live ranges and the
/// selection are editing state and never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub document: Document,
}

impl ModelValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Fragment encoding used in transfer carriers.
pub fn fragment_to_json(nodes: &[Node]) -> Result<String, serde_json::Error> {
    serde_json::to_string(nodes)
}

pub fn fragment_from_json(s: &str) -> Result<Vec<Node>, serde_json::Error> {
    serde_json::from_str(s)
}
