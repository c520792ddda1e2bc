use std::fmt;

use plate_model::{DeleteOptions, LiveRangeId, Model, Range};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token identifying one drag. Stored in the transfer carrier at drag start
/// and compared at drop time to tell own drags from foreign ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    /// A drag started here; nothing hovered yet.
    Armed,
    Tracking,
    /// A drop was accepted and is being inserted.
    Committing,
    Cancelled,
}

/// How the last session ended. `Cancelled` covers drags that ended without
/// a drop accepted here and without a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Moved,
    Copied,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DragSession {
    dragged: Option<LiveRangeId>,
    uid: Option<SessionId>,
    phase: SessionPhase,
    last_outcome: Option<SessionOutcome>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `range` under a fresh id. A range left over from a
    /// drag whose end was never reported is detached first.
    pub fn start(&mut self, model: &mut Model, range: Range) -> SessionId {
        if let Some(stale) = self.dragged.take() {
            tracing::debug!("detaching the range of an unfinished drag");
            model.detach(stale);
        }
        let uid = SessionId::mint();
        self.dragged = Some(model.track_range(range));
        self.uid = Some(uid.clone());
        self.transition(SessionPhase::Armed);
        uid
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn transition(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "drag session");
            self.phase = phase;
        }
    }

    pub fn uid(&self) -> Option<&SessionId> {
        self.uid.as_ref()
    }

    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.last_outcome
    }

    pub fn has_dragged_range(&self) -> bool {
        self.dragged.is_some()
    }

    /// Current extent of the dragged content.
    pub fn dragged_range(&self, model: &Model) -> Option<Range> {
        model.live_range(self.dragged?).cloned()
    }

    pub fn is_active(&self) -> bool {
        self.uid.is_some() || self.dragged.is_some()
    }

    /// Whether `token` was minted by this session.
    pub fn matches(&self, token: Option<&str>) -> bool {
        match (&self.uid, token) {
            (Some(uid), Some(token)) => uid.as_str() == token,
            _ => false,
        }
    }

    /// Forgets the dragged range and its id without touching the content.
    pub fn discard(&mut self, model: &mut Model) {
        self.uid = None;
        if let Some(id) = self.dragged.take() {
            tracing::debug!("discarding the range of an earlier drag");
            model.detach(id);
        }
    }

    /// Ends the session: deletes the dragged content when `moved`, then
    /// releases everything. Without an active session only the phase is
    /// reset.
    pub fn finalize(&mut self, model: &mut Model, moved: bool) {
        if !self.is_active() {
            self.transition(SessionPhase::Idle);
            return;
        }
        self.uid = None;
        let mut deleted = false;
        if let Some(id) = self.dragged.take() {
            if moved {
                if let Some(range) = model.live_range(id).cloned() {
                    let result = model.change(|model| {
                        model.delete_content(
                            &range,
                            DeleteOptions {
                                suppress_auto_paragraph: true,
                            },
                        )
                    });
                    match result {
                        Ok(()) => deleted = true,
                        Err(err) => tracing::warn!(%err, "failed to remove the moved content"),
                    }
                }
            }
            model.detach(id);
        }
        let outcome = if deleted {
            SessionOutcome::Moved
        } else if self.phase == SessionPhase::Committing {
            SessionOutcome::Copied
        } else {
            SessionOutcome::Cancelled
        };
        if matches!(self.phase, SessionPhase::Armed | SessionPhase::Tracking) && !deleted {
            self.transition(SessionPhase::Cancelled);
        }
        self.transition(SessionPhase::Idle);
        self.last_outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use plate_model::{Document, Node, Position};

    use super::*;

    #[test]
    fn finalize_is_idempotent() {
        let doc = Document::new(vec![Node::paragraph("hello world")]);
        let mut model = Model::with_richtext_schema(doc);
        let mut session = DragSession::new();
        let range = Range::new(Position::new(vec![0, 0]), Position::new(vec![0, 6]));
        session.start(&mut model, range);

        session.finalize(&mut model, true);
        assert_eq!(model.doc().plain_text(), "world");
        assert_eq!(model.live_range_count(), 0);
        assert_eq!(session.last_outcome(), Some(SessionOutcome::Moved));

        let version = model.version();
        session.finalize(&mut model, true);
        assert_eq!(model.version(), version);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn restarting_detaches_the_previous_range() {
        let doc = Document::new(vec![Node::paragraph("abc")]);
        let mut model = Model::with_richtext_schema(doc);
        let mut session = DragSession::new();
        let range = |from, to| Range::new(Position::new(vec![0, from]), Position::new(vec![0, to]));
        let first = session.start(&mut model, range(0, 1));
        let second = session.start(&mut model, range(1, 2));

        assert_ne!(first, second);
        assert_eq!(model.live_range_count(), 1);
        assert!(session.matches(Some(second.as_str())));
        assert!(!session.matches(Some(first.as_str())));
        assert!(!session.matches(None));
    }
}
