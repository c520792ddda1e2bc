use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use plate_dragdrop::{
    BusError, ContentInsertionData, DataTransfer, EditingContext, Editor, Event, EventName,
    Listener, Method, Priority, Subscription,
};
use plate_model::{Document, Model, Node};

type Log = Rc<RefCell<Vec<String>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Action {
    Record,
    Stop,
    FollowUp,
    FollowUpInChange,
}

struct Probe {
    id: &'static str,
    subscriptions: Vec<Subscription>,
    action: Action,
    log: Log,
}

impl Probe {
    fn boxed(
        id: &'static str,
        event: EventName,
        priority: Priority,
        action: Action,
        log: &Log,
    ) -> Box<dyn Listener> {
        Box::new(Self {
            id,
            subscriptions: vec![Subscription::new(event, priority, "probe")],
            action,
            log: log.clone(),
        })
    }
}

impl Listener for Probe {
    fn id(&self) -> &'static str {
        self.id
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.clone()
    }

    fn handle(&mut self, _handler: &'static str, ctx: &mut EditingContext, event: &mut Event) {
        let entry = match event.name() {
            EventName::ContentInsertion => {
                format!("{}:in_change={}", self.id, ctx.model.is_in_change())
            }
            name => format!("{}:{:?}", self.id, name),
        };
        self.log.borrow_mut().push(entry);
        match self.action {
            Action::Record => {}
            Action::Stop => event.stop(),
            Action::FollowUp => {
                if let Some(target) = event.pointer_target() {
                    ctx.fire(Event::pointer_up(target));
                }
            }
            Action::FollowUpInChange => {
                ctx.fire_in_change(Event::content_insertion(ContentInsertionData {
                    method: Method::Paste,
                    data_transfer: DataTransfer::new(),
                    target_ranges: Vec::new(),
                    content: Vec::new(),
                    result_range: None,
                }))
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn model() -> Model {
    Model::with_richtext_schema(Document::new(vec![Node::paragraph("x")]))
}

fn editor(listeners: Vec<Box<dyn Listener>>) -> Editor {
    Editor::with_listeners(model(), listeners).unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn handlers_run_by_priority_then_registration_order() {
    let log = Log::default();
    let mut editor = editor(vec![
        Probe::boxed("low", EventName::PointerDown, Priority::Low, Action::Record, &log),
        Probe::boxed("first", EventName::PointerDown, Priority::Normal, Action::Record, &log),
        Probe::boxed("highest", EventName::PointerDown, Priority::Highest, Action::Record, &log),
        Probe::boxed("second", EventName::PointerDown, Priority::Normal, Action::Record, &log),
        Probe::boxed("other", EventName::PointerUp, Priority::Highest, Action::Record, &log),
    ]);
    let root = editor.view().root().unwrap();
    editor.fire(Event::pointer_down(root));

    assert_eq!(
        entries(&log),
        vec![
            "highest:PointerDown",
            "first:PointerDown",
            "second:PointerDown",
            "low:PointerDown",
        ]
    );
}

#[test]
fn stopping_skips_lower_handlers() {
    let log = Log::default();
    let mut editor = editor(vec![
        Probe::boxed("after", EventName::PointerDown, Priority::Lowest, Action::Record, &log),
        Probe::boxed("stopper", EventName::PointerDown, Priority::High, Action::Stop, &log),
    ]);
    let root = editor.view().root().unwrap();
    let event = editor.fire(Event::pointer_down(root));

    assert!(event.is_stopped());
    assert_eq!(entries(&log), vec!["stopper:PointerDown"]);
}

#[test]
fn follow_up_events_run_after_the_current_dispatch() {
    let log = Log::default();
    let mut editor = editor(vec![
        Probe::boxed("up", EventName::PointerUp, Priority::Normal, Action::Record, &log),
        Probe::boxed("a", EventName::PointerDown, Priority::High, Action::FollowUp, &log),
        Probe::boxed("b", EventName::PointerDown, Priority::Low, Action::FollowUp, &log),
    ]);
    let root = editor.view().root().unwrap();
    editor.fire(Event::pointer_down(root));

    assert_eq!(
        entries(&log),
        vec![
            "a:PointerDown",
            "b:PointerDown",
            "up:PointerUp",
            "up:PointerUp",
        ]
    );
}

#[test]
fn events_fired_in_change_run_inside_one_change_block() {
    let log = Log::default();
    let mut editor = editor(vec![
        Probe::boxed(
            "trigger",
            EventName::PointerDown,
            Priority::Normal,
            Action::FollowUpInChange,
            &log,
        ),
        Probe::boxed(
            "insert",
            EventName::ContentInsertion,
            Priority::Normal,
            Action::Record,
            &log,
        ),
    ]);
    let root = editor.view().root().unwrap();
    editor.fire(Event::pointer_down(root));

    assert_eq!(entries(&log), vec!["trigger:PointerDown", "insert:in_change=true"]);
    assert!(!editor.model().is_in_change());
}

#[test]
fn duplicate_listener_ids_are_rejected() {
    let log = Log::default();
    let result = Editor::with_listeners(
        model(),
        vec![
            Probe::boxed("same", EventName::PointerDown, Priority::Normal, Action::Record, &log),
            Probe::boxed("same", EventName::PointerUp, Priority::Normal, Action::Record, &log),
        ],
    );
    assert_eq!(result.err(), Some(BusError::DuplicateListener("same")));

    let mut editor = editor(Vec::new());
    let late = Probe::boxed("late", EventName::PointerDown, Priority::Normal, Action::Record, &log);
    assert!(editor.register(late).is_ok());
    assert!(editor.plugin::<Probe>().is_some());
}
