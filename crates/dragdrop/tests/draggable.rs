use plate_dragdrop::{DragDrop, DragDropConfig, Editor, Environment, Event};
use plate_model::view::{SELECTION_HANDLE_CLASS, ViewId};
use plate_model::{Document, Model, Node, Position, Range};

fn editor_with(config: DragDropConfig) -> Editor {
    let doc = Document::new(vec![
        Node::paragraph("hello world"),
        Node::image("a.png"),
        Node::divider(),
    ]);
    Editor::new(Model::with_richtext_schema(doc), config)
}

fn editor() -> Editor {
    editor_with(DragDropConfig::default())
}

fn select_text(editor: &mut Editor) {
    editor.edit(|model| {
        model.set_selection(Range::new(
            Position::new(vec![0, 0]),
            Position::new(vec![0, 5]),
        ))
    });
}

fn text_in_paragraph(editor: &Editor) -> ViewId {
    let paragraph = editor.view().find_by_model_path(&[0]).unwrap();
    editor.view().children(paragraph)[0]
}

fn marked(editor: &Editor) -> Option<ViewId> {
    editor.plugin::<DragDrop>().unwrap().draggable().element()
}

#[test]
fn text_selection_makes_the_root_draggable() {
    let mut editor = editor();
    select_text(&mut editor);
    let root = editor.view().root().unwrap();
    let target = text_in_paragraph(&editor);

    editor.fire(Event::pointer_down(target));
    assert_eq!(marked(&editor), Some(root));
    assert_eq!(editor.view().attribute(root, "draggable"), Some("true"));
    assert_eq!(editor.view().attribute(root, "spellcheck"), Some("false"));

    editor.fire(Event::pointer_up(target));
    assert_eq!(marked(&editor), None);
    assert_eq!(editor.view().attribute(root, "draggable"), None);
    assert_eq!(editor.view().attribute(root, "spellcheck"), None);
}

#[test]
fn gecko_and_read_only_leave_text_selections_unmarked() {
    let mut gecko = editor_with(DragDropConfig::for_environment(Environment::Gecko));
    select_text(&mut gecko);
    let target = text_in_paragraph(&gecko);
    gecko.fire(Event::pointer_down(target));
    assert_eq!(marked(&gecko), None);

    let mut read_only = editor();
    select_text(&mut read_only);
    read_only.set_read_only(true);
    let target = text_in_paragraph(&read_only);
    read_only.fire(Event::pointer_down(target));
    assert_eq!(marked(&read_only), None);
}

#[test]
fn collapsed_selection_in_text_marks_nothing() {
    let mut editor = editor();
    let target = text_in_paragraph(&editor);
    editor.fire(Event::pointer_down(target));
    assert_eq!(marked(&editor), None);
}

#[test]
fn selection_handle_marks_its_widget() {
    let mut editor = editor();
    let image = editor.view().find_by_model_path(&[1]).unwrap();
    let handle = editor.view().children(image)[0];
    assert!(editor.view().has_class(handle, SELECTION_HANDLE_CLASS));

    editor.fire(Event::pointer_down(handle));
    assert_eq!(marked(&editor), Some(image));
    assert_eq!(editor.view().attribute(image, "draggable"), Some("true"));
}

#[test]
fn marking_another_widget_clears_the_first() {
    let mut editor = editor();
    let image = editor.view().find_by_model_path(&[1]).unwrap();
    let divider = editor.view().find_by_model_path(&[2]).unwrap();

    editor.fire(Event::pointer_down(image));
    editor.fire(Event::pointer_down(divider));

    assert_eq!(marked(&editor), Some(divider));
    assert_eq!(editor.view().attribute(image, "draggable"), None);
    assert_eq!(editor.view().attribute(divider, "draggable"), Some("true"));
    let root = editor.view().root().unwrap();
    assert_eq!(editor.view().attribute(root, "spellcheck"), Some("false"));
}

#[test]
fn text_selection_outranks_a_widget_under_the_pointer() {
    let mut editor = editor();
    select_text(&mut editor);
    let root = editor.view().root().unwrap();
    let image = editor.view().find_by_model_path(&[1]).unwrap();

    editor.fire(Event::pointer_down(image));
    assert_eq!(marked(&editor), Some(root));
    assert_eq!(editor.view().attribute(image, "draggable"), None);

    let mut gecko = editor_with(DragDropConfig::for_environment(Environment::Gecko));
    select_text(&mut gecko);
    let image = gecko.view().find_by_model_path(&[1]).unwrap();
    gecko.fire(Event::pointer_down(image));
    assert_eq!(marked(&gecko), Some(image));
}
