use plate_model::view::{
    DROP_TARGET_MARKER, DROP_TARGET_POSITION_CLASS, DROP_TARGET_RANGE_CLASS, EditingView,
    SELECTION_HANDLE_CLASS, ViewPosition,
};
use plate_model::{Document, MarkerOptions, Model, Node, Position, Range};

fn rendered(children: Vec<Node>) -> (Model, EditingView) {
    let model = Model::with_richtext_schema(Document::new(children));
    let mut view = EditingView::new();
    view.render(&model);
    (model, view)
}

#[test]
fn block_widgets_get_a_selection_handle() {
    let (_, view) = rendered(vec![Node::paragraph("a"), Node::image("x.png")]);
    let widget = view.find_by_model_path(&[1]).unwrap();
    assert!(view.is_widget(widget));
    let handle = view.children(widget)[0];
    assert!(view.is_ui_element(handle));
    assert!(view.has_class(handle, SELECTION_HANDLE_CLASS));
    assert_eq!(view.find_ancestor(handle, |v, id| v.is_widget(id)), Some(widget));
}

#[test]
fn nested_editables_map_to_their_cells() {
    let (_, view) = rendered(vec![Node::element(
        "table",
        vec![Node::element(
            "table_row",
            vec![Node::element("table_cell", vec![Node::paragraph("x")])],
        )],
    )]);
    let cell = view.find_by_model_path(&[0, 0, 0]).unwrap();
    assert!(view.is_editable(cell));
    assert!(!view.is_root(cell));
    assert_eq!(view.to_model_element(cell), Some(vec![0, 0, 0]));
    let root = view.root().unwrap();
    assert_eq!(view.root_of(cell), Some(root));
    assert!(view.is_root(root));
}

#[test]
fn collapsed_drop_marker_renders_an_inline_indicator() {
    let (mut model, mut view) = rendered(vec![Node::paragraph("abcd")]);
    model
        .add_marker(
            DROP_TARGET_MARKER,
            MarkerOptions::ui(Range::collapsed(Position::new(vec![0, 2]))),
        )
        .unwrap();
    view.render(&model);

    let found = view.find_by_class(DROP_TARGET_POSITION_CLASS);
    assert_eq!(found.len(), 1);
    let indicator = found[0];
    let paragraph = view.find_by_model_path(&[0]).unwrap();
    assert_eq!(view.children(paragraph).len(), 3);
    assert_eq!(view.index_in_parent(indicator), Some(1));

    // A position inside the indicator maps to the place it marks.
    let inside = ViewPosition {
        parent: indicator,
        offset: 0,
    };
    assert_eq!(view.to_model_position(&inside), Some(Position::new(vec![0, 2])));
}

#[test]
fn drop_marker_on_a_widget_highlights_it() {
    let (mut model, mut view) = rendered(vec![Node::paragraph("a"), Node::divider()]);
    model
        .add_marker(DROP_TARGET_MARKER, MarkerOptions::ui(Range::on(&[1])))
        .unwrap();
    view.render(&model);

    let widget = view.find_by_model_path(&[1]).unwrap();
    assert!(view.has_class(widget, DROP_TARGET_RANGE_CLASS));
    assert!(view.find_by_class(DROP_TARGET_POSITION_CLASS).is_empty());

    model.remove_marker(DROP_TARGET_MARKER).unwrap();
    view.render(&model);
    assert!(!view.has_class(widget, DROP_TARGET_RANGE_CLASS));
}

#[test]
fn model_ranges_round_trip_through_the_view() {
    let (_, view) = rendered(vec![
        Node::paragraph("hello"),
        Node::divider(),
        Node::paragraph("world"),
    ]);
    for range in [
        Range::new(Position::new(vec![0, 1]), Position::new(vec![2, 3])),
        Range::on(&[1]),
        Range::collapsed(Position::new(vec![2, 5])),
    ] {
        let view_range = view.to_view_range(&range).unwrap();
        assert_eq!(view.to_model_range(&view_range), Some(range));
    }
}
