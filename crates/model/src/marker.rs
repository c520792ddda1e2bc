use serde::{Deserialize, Serialize};

use crate::position::Range;

/// A named annotation over a document range. Markers follow every change like
/// live ranges and are never part of the serialized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub range: Range,
    /// Changes to the marker are recorded as document operations.
    pub managed_using_operations: bool,
    /// The marker carries document data (comments, suggestions) rather than
    /// UI state.
    pub affects_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerOptions {
    pub range: Range,
    pub managed_using_operations: bool,
    pub affects_data: bool,
}

impl MarkerOptions {
    /// A UI-only marker: no operations, no data.
    pub fn ui(range: Range) -> Self {
        Self {
            range,
            managed_using_operations: false,
            affects_data: false,
        }
    }
}
