//! Turns the position reported under the pointer into a range content can be
//! dropped at.
//!
//! Reported positions are imprecise: they land inside UI elements, between
//! blocks next to widgets, or directly in containers that cannot hold a caret.
//! The steps below run in order and the first one producing a range wins.

use plate_model::view::{EditingView, ViewId, ViewRange};
use plate_model::{ChildKind, Direction, Model, Path, Position, Range};

use crate::config::SearchBias;

struct Probe<'a> {
    model: &'a Model,
    view: &'a EditingView,
    target: ViewId,
    /// Model element closest to the target.
    element: Option<Path>,
    /// Model position of the first candidate range start.
    point: Option<Position>,
    bias: SearchBias,
}

type Step = fn(&Probe<'_>) -> Option<Range>;

const STEPS: &[(&str, Step)] = &[
    ("widget", on_widget),
    ("widget_ancestor", on_widget_ancestor),
    ("element_start", at_element_start),
    ("between_blocks", between_blocks),
    ("nearest_selection", nearest_selection),
    ("ancestor_object", on_ancestor_object),
];

/// Resolves the drop range for `target` and the candidate ranges reported
/// with it. Deterministic for a given model, view and input.
pub fn resolve(
    model: &Model,
    view: &EditingView,
    target_ranges: &[ViewRange],
    target: ViewId,
    bias: SearchBias,
) -> Option<Range> {
    // Indicators and handles are not editable; their parent is.
    let target = if view.is_ui_element(target) {
        view.parent(target)?
    } else {
        target
    };

    let probe = Probe {
        model,
        view,
        target,
        element: view
            .find_mapped_view_ancestor(target)
            .and_then(|id| view.to_model_element(id)),
        point: target_ranges
            .first()
            .and_then(|range| view.to_model_position(&range.start)),
        bias,
    };

    for (name, step) in STEPS {
        if let Some(range) = step(&probe) {
            tracing::trace!(step = name, ?range, "drop target resolved");
            return Some(range);
        }
    }
    tracing::trace!(?target, "no drop target");
    None
}

fn range_on_view_element(probe: &Probe<'_>, id: ViewId) -> Option<Range> {
    probe
        .view
        .to_model_element(id)
        .map(|path| Range::on(&path))
}

fn on_widget(probe: &Probe<'_>) -> Option<Range> {
    if !probe.view.is_widget(probe.target) {
        return None;
    }
    range_on_view_element(probe, probe.target)
}

fn on_widget_ancestor(probe: &Probe<'_>) -> Option<Range> {
    let view = probe.view;
    if view.is_editable(probe.target) {
        return None;
    }
    let ancestor = view.find_ancestor(probe.target, |view, id| {
        view.is_widget(id) || view.is_editable(id)
    })?;
    if !view.is_widget(ancestor) {
        return None;
    }
    range_on_view_element(probe, ancestor)
}

/// Without a reported position (an empty table cell, say) the first caret
/// position inside the element is used.
fn at_element_start(probe: &Probe<'_>) -> Option<Range> {
    if probe.point.is_some() {
        return None;
    }
    let element = probe.element.as_ref()?;
    probe
        .model
        .nearest_selection_range(&Position::at(element, 0), Direction::Forward)
}

/// Next to a widget the reported position jumps around between blocks; an
/// object right after the block-level position takes the drop.
fn between_blocks(probe: &Probe<'_>) -> Option<Range> {
    let point = probe.point.as_ref()?;
    let element = probe.element.as_ref()?;
    if !probe.model.check_child_in(element, ChildKind::Block) {
        return None;
    }
    let common = point.path.get(..element.len() + 1)?;
    let between = Position::new(common.to_vec());
    let node = probe.model.node_after(&between)?;
    if !probe.model.schema().is_object(node) {
        return None;
    }
    Some(Range::on(&between.path))
}

fn nearest_selection(probe: &Probe<'_>) -> Option<Range> {
    let point = probe.point.as_ref()?;
    probe
        .model
        .nearest_selection_range(point, probe.bias.direction())
}

/// The position sits directly in an object's structure (a table row, for
/// one) with no caret position around it inside the limit.
fn on_ancestor_object(probe: &Probe<'_>) -> Option<Range> {
    let point = probe.point.as_ref()?;
    let parent = point.parent_path();
    (1..=parent.len())
        .rev()
        .map(|len| &parent[..len])
        .find(|path| probe.model.is_object_at(path))
        .map(Range::on)
}
