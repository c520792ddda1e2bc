use plate_model::{Direction, Document, Model, Node, Position, Range, Schema, limit_ancestor};

fn table_doc() -> Document {
    let cell = |children: Vec<Node>| Node::element("table_cell", children);
    Document::new(vec![
        Node::paragraph("a"),
        Node::element(
            "table",
            vec![Node::element(
                "table_row",
                vec![cell(vec![Node::paragraph("x")]), cell(Vec::new())],
            )],
        ),
        Node::paragraph("b"),
    ])
}

#[test]
fn walk_inside_a_table_finds_the_first_cell_text() {
    let model = Model::with_richtext_schema(table_doc());
    let range = model.nearest_selection_range(&Position::new(vec![1, 0]), Direction::Forward);
    assert_eq!(range, Some(Range::collapsed(Position::new(vec![1, 0, 0, 0, 0]))));
}

#[test]
fn empty_cell_has_no_selection_position() {
    let model = Model::with_richtext_schema(table_doc());
    let inside = Position::new(vec![1, 0, 1, 0]);
    assert_eq!(
        limit_ancestor(model.doc(), model.schema(), &inside),
        vec![1, 0, 1]
    );
    assert_eq!(model.nearest_selection_range(&inside, Direction::Both), None);
}

#[test]
fn both_directions_prefer_the_backward_hit_on_ties() {
    let model = Model::with_richtext_schema(Document::new(vec![
        Node::image("a.png"),
        Node::image("b.png"),
    ]));
    let between = Position::new(vec![1]);
    assert_eq!(
        model.nearest_selection_range(&between, Direction::Both),
        Some(Range::on(&[0]))
    );
    assert_eq!(
        model.nearest_selection_range(&between, Direction::Forward),
        Some(Range::on(&[1]))
    );
}

#[test]
fn root_and_cells_accept_blocks_but_tables_do_not() {
    let model = Model::with_richtext_schema(table_doc());
    let schema: &Schema = model.schema();
    let table = model.node_at(&[1]).unwrap();
    assert!(schema.is_object(table));
    assert!(model.check_child_in(&[], plate_model::ChildKind::Block));
    assert!(model.check_child_in(&[1, 0, 1], plate_model::ChildKind::Block));
    assert!(!model.check_child_in(&[1], plate_model::ChildKind::Block));
    assert_eq!(model.selected_element(), None);
}
