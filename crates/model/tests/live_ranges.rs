use plate_model::{Document, MarkerOptions, Model, ModelError, Node, Op, Position, Range};

fn hello() -> Model {
    Model::with_richtext_schema(Document::new(vec![Node::paragraph("hello")]))
}

#[test]
fn insertion_at_a_boundary_never_grows_a_live_range() {
    let mut model = hello();
    let id = model.track_range(Range::new(
        Position::new(vec![0, 1]),
        Position::new(vec![0, 3]),
    ));

    model
        .apply(Op::Insert {
            position: Position::new(vec![0, 3]),
            nodes: vec![Node::text("!")],
        })
        .unwrap();
    model
        .apply(Op::Insert {
            position: Position::new(vec![0, 1]),
            nodes: vec![Node::text("XY")],
        })
        .unwrap();

    assert_eq!(
        model.live_range(id),
        Some(&Range::new(
            Position::new(vec![0, 3]),
            Position::new(vec![0, 5])
        ))
    );
}

#[test]
fn removing_tracked_content_collapses_the_range() {
    let mut model = hello();
    let id = model.track_range(Range::new(
        Position::new(vec![0, 1]),
        Position::new(vec![0, 3]),
    ));

    model
        .apply(Op::Remove {
            position: Position::new(vec![0, 0]),
            howmany: 5,
        })
        .unwrap();

    let range = model.detach(id).unwrap();
    assert!(range.is_collapsed());
    assert_eq!(range.start.path, vec![0, 0]);
    assert_eq!(model.live_range(id), None);
    assert_eq!(model.live_range_count(), 0);
}

#[test]
fn live_range_follows_a_block_moving_down() {
    let mut model = Model::with_richtext_schema(Document::new(vec![
        Node::paragraph("a"),
        Node::image("x.png"),
    ]));
    let id = model.track_range(Range::on(&[1]));

    model
        .apply(Op::Insert {
            position: Position::new(vec![0]),
            nodes: vec![Node::paragraph("new")],
        })
        .unwrap();

    assert_eq!(model.live_range(id), Some(&Range::on(&[2])));
}

#[test]
fn marker_lifecycle_reports_errors() {
    let mut model = hello();
    let range = Range::collapsed(Position::new(vec![0, 2]));

    model.add_marker("drop-target", MarkerOptions::ui(range.clone())).unwrap();
    assert_eq!(
        model.add_marker("drop-target", MarkerOptions::ui(range.clone())),
        Err(ModelError::MarkerExists("drop-target".to_string()))
    );

    let marker = model.marker("drop-target").unwrap();
    assert!(!marker.managed_using_operations);
    assert!(!marker.affects_data);

    model.remove_marker("drop-target").unwrap();
    assert!(!model.has_marker("drop-target"));
    assert_eq!(
        model.update_marker("drop-target", range),
        Err(ModelError::MissingMarker("drop-target".to_string()))
    );
}

#[test]
fn invalid_operations_leave_the_document_untouched() {
    let mut model = hello();
    let err = model
        .apply(Op::Remove {
            position: Position::new(vec![0, 3]),
            howmany: 10,
        })
        .unwrap_err();
    assert!(matches!(err, ModelError::OffsetOutOfBounds { .. }));
    assert_eq!(model.doc().children, vec![Node::paragraph("hello")]);

    let err = model
        .apply(Op::Split {
            position: Position::new(vec![0]),
        })
        .unwrap_err();
    assert_eq!(err, ModelError::RootOperation("split"));
}
