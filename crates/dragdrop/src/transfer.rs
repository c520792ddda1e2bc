use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Carrier type holding the id of the session a drag started from.
pub const DRAGGING_UID_TYPE: &str = "application/x-plate-dragging-uid";
/// Carrier type holding a serialized node fragment.
pub const FRAGMENT_TYPE: &str = "application/x-plate-fragment";
pub const PLAIN_TEXT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectAllowed {
    #[default]
    Uninitialized,
    None,
    Copy,
    Move,
    Link,
    CopyMove,
    CopyLink,
    LinkMove,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Move,
    Link,
}

#[derive(Debug, Default)]
struct TransferState {
    effect_allowed: EffectAllowed,
    drop_effect: DropEffect,
    cancelled: bool,
    data: BTreeMap<String, String>,
}

/// Payload and effect negotiation of one drag or clipboard operation.
///
/// Clones share state: the host keeps one handle while the events carry
/// others, and every side sees the same effects and data.
#[derive(Debug, Clone, Default)]
pub struct DataTransfer {
    state: Rc<RefCell<TransferState>>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effect_allowed(&self) -> EffectAllowed {
        self.state.borrow().effect_allowed
    }

    pub fn set_effect_allowed(&self, effect: EffectAllowed) {
        self.state.borrow_mut().effect_allowed = effect;
    }

    pub fn drop_effect(&self) -> DropEffect {
        self.state.borrow().drop_effect
    }

    pub fn set_drop_effect(&self, effect: DropEffect) {
        self.state.borrow_mut().drop_effect = effect;
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    pub fn set_cancelled(&self, cancelled: bool) {
        self.state.borrow_mut().cancelled = cancelled;
    }

    pub fn data(&self, kind: &str) -> Option<String> {
        self.state.borrow().data.get(kind).cloned()
    }

    pub fn set_data(&self, kind: &str, value: impl Into<String>) {
        self.state
            .borrow_mut()
            .data
            .insert(kind.to_string(), value.into());
    }

    pub fn types(&self) -> Vec<String> {
        self.state.borrow().data.keys().cloned().collect()
    }

    pub fn shares_state_with(&self, other: &DataTransfer) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}
