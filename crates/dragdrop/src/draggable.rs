use plate_model::Model;
use plate_model::view::{EditingView, SELECTION_HANDLE_CLASS, ViewId};

use crate::config::DragDropConfig;

const DRAGGABLE_ATTR: &str = "draggable";
const SPELLCHECK_ATTR: &str = "spellcheck";

/// The one view element currently flagged draggable, held by id only. A mark
/// on an element that has since been re-rendered away clears as a no-op.
#[derive(Debug, Default)]
pub struct DraggableMark {
    element: Option<ViewId>,
}

impl DraggableMark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self) -> Option<ViewId> {
        self.element
    }

    /// Flags `element` draggable and turns spellchecking off on its root,
    /// clearing any previous mark first.
    pub fn set(&mut self, view: &mut EditingView, element: ViewId) {
        self.clear(view);
        view.set_attribute(element, DRAGGABLE_ATTR, "true");
        if let Some(root) = view.root_of(element) {
            view.set_attribute(root, SPELLCHECK_ATTR, "false");
        }
        self.element = Some(element);
    }

    pub fn clear(&mut self, view: &mut EditingView) {
        let Some(element) = self.element.take() else {
            return;
        };
        view.remove_attribute(element, DRAGGABLE_ATTR);
        if let Some(root) = view.root_of(element) {
            view.remove_attribute(root, SPELLCHECK_ATTR);
        }
    }
}

/// Picks the element a pointer-down on `target` makes draggable, first match
/// wins: the widget of a selection handle, the editable holding a text
/// selection when configured, then the widget under the pointer.
pub fn pick_source(
    model: &Model,
    view: &EditingView,
    target: ViewId,
    config: &DragDropConfig,
    read_only: bool,
) -> Option<ViewId> {
    if view.has_class(target, SELECTION_HANDLE_CLASS) {
        return view.find_ancestor(target, |view, id| view.is_widget(id));
    }

    let selection = model.selection();
    if config.draggable_editable_on_selection
        && !read_only
        && !selection.is_collapsed()
        && model.selected_element().is_none()
    {
        return view.editable_for_model_position(&selection.range().start);
    }

    if view.is_editable(target) {
        return None;
    }
    if view.is_widget(target) {
        return Some(target);
    }
    let ancestor = view.find_ancestor(target, |view, id| {
        view.is_widget(id) || view.is_editable(id)
    })?;
    view.is_widget(ancestor).then_some(ancestor)
}
