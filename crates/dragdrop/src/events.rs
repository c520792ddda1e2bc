use std::any::Any;
use std::collections::HashMap;

use plate_model::view::{ViewId, ViewRange};
use plate_model::{Node, Range};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::EditingContext;
use crate::transfer::DataTransfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PointerDown,
    PointerUp,
    DragStart,
    DragEnter,
    DragOver,
    DragLeave,
    DragEnd,
    ClipboardInput,
    InputTransformation,
    ContentInsertion,
    ClipboardOutput,
}

/// What started a clipboard-pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Paste,
    Drop,
    DragStart,
    Copy,
    Cut,
}

#[derive(Debug, Clone)]
pub struct DragData {
    pub data_transfer: DataTransfer,
    pub target: Option<ViewId>,
    pub target_ranges: Vec<ViewRange>,
}

#[derive(Debug, Clone)]
pub struct ClipboardInputData {
    pub method: Method,
    pub data_transfer: DataTransfer,
    pub target: Option<ViewId>,
    pub target_ranges: Vec<ViewRange>,
}

#[derive(Debug, Clone)]
pub struct InputTransformationData {
    pub method: Method,
    pub data_transfer: DataTransfer,
    pub target_ranges: Vec<ViewRange>,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct ContentInsertionData {
    pub method: Method,
    pub data_transfer: DataTransfer,
    pub target_ranges: Vec<ViewRange>,
    pub content: Vec<Node>,
    /// Where the content landed; set by the inserting listener.
    pub result_range: Option<Range>,
}

#[derive(Debug, Clone)]
pub struct ClipboardOutputData {
    pub method: Method,
    pub data_transfer: DataTransfer,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum EventData {
    Pointer { target: ViewId },
    Drag(DragData),
    ClipboardInput(ClipboardInputData),
    InputTransformation(InputTransformationData),
    ContentInsertion(ContentInsertionData),
    ClipboardOutput(ClipboardOutputData),
}

#[derive(Debug, Clone)]
pub struct Event {
    name: EventName,
    data: EventData,
    stopped: bool,
    default_prevented: bool,
}

impl Event {
    fn new(name: EventName, data: EventData) -> Self {
        Self {
            name,
            data,
            stopped: false,
            default_prevented: false,
        }
    }

    pub fn pointer_down(target: ViewId) -> Self {
        Self::new(EventName::PointerDown, EventData::Pointer { target })
    }

    pub fn pointer_up(target: ViewId) -> Self {
        Self::new(EventName::PointerUp, EventData::Pointer { target })
    }

    /// A drag event. Panics in debug builds when `name` is not a drag event.
    pub fn drag(
        name: EventName,
        data_transfer: DataTransfer,
        target: Option<ViewId>,
        target_ranges: Vec<ViewRange>,
    ) -> Self {
        debug_assert!(matches!(
            name,
            EventName::DragStart
                | EventName::DragEnter
                | EventName::DragOver
                | EventName::DragLeave
                | EventName::DragEnd
        ));
        Self::new(
            name,
            EventData::Drag(DragData {
                data_transfer,
                target,
                target_ranges,
            }),
        )
    }

    pub fn drag_start(data_transfer: DataTransfer, target: ViewId) -> Self {
        Self::drag(EventName::DragStart, data_transfer, Some(target), Vec::new())
    }

    pub fn drag_enter(data_transfer: DataTransfer) -> Self {
        Self::drag(EventName::DragEnter, data_transfer, None, Vec::new())
    }

    pub fn drag_over(
        data_transfer: DataTransfer,
        target: ViewId,
        target_ranges: Vec<ViewRange>,
    ) -> Self {
        Self::drag(EventName::DragOver, data_transfer, Some(target), target_ranges)
    }

    pub fn drag_leave(data_transfer: DataTransfer) -> Self {
        Self::drag(EventName::DragLeave, data_transfer, None, Vec::new())
    }

    pub fn drag_end(data_transfer: DataTransfer) -> Self {
        Self::drag(EventName::DragEnd, data_transfer, None, Vec::new())
    }

    pub fn drop(
        data_transfer: DataTransfer,
        target: ViewId,
        target_ranges: Vec<ViewRange>,
    ) -> Self {
        Self::clipboard_input(ClipboardInputData {
            method: Method::Drop,
            data_transfer,
            target: Some(target),
            target_ranges,
        })
    }

    pub fn paste(data_transfer: DataTransfer) -> Self {
        Self::clipboard_input(ClipboardInputData {
            method: Method::Paste,
            data_transfer,
            target: None,
            target_ranges: Vec::new(),
        })
    }

    pub fn clipboard_input(data: ClipboardInputData) -> Self {
        Self::new(EventName::ClipboardInput, EventData::ClipboardInput(data))
    }

    pub fn input_transformation(data: InputTransformationData) -> Self {
        Self::new(
            EventName::InputTransformation,
            EventData::InputTransformation(data),
        )
    }

    pub fn content_insertion(data: ContentInsertionData) -> Self {
        Self::new(EventName::ContentInsertion, EventData::ContentInsertion(data))
    }

    pub fn clipboard_output(data: ClipboardOutputData) -> Self {
        Self::new(EventName::ClipboardOutput, EventData::ClipboardOutput(data))
    }

    pub fn name(&self) -> EventName {
        self.name
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Skips every listener not yet called for this event.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Tells the host to abandon its default action (a drag start, for one).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn pointer_target(&self) -> Option<ViewId> {
        match &self.data {
            EventData::Pointer { target } => Some(*target),
            _ => None,
        }
    }

    pub fn as_drag(&self) -> Option<&DragData> {
        match &self.data {
            EventData::Drag(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_clipboard_input(&self) -> Option<&ClipboardInputData> {
        match &self.data {
            EventData::ClipboardInput(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_clipboard_input_mut(&mut self) -> Option<&mut ClipboardInputData> {
        match &mut self.data {
            EventData::ClipboardInput(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_input_transformation(&self) -> Option<&InputTransformationData> {
        match &self.data {
            EventData::InputTransformation(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_input_transformation_mut(&mut self) -> Option<&mut InputTransformationData> {
        match &mut self.data {
            EventData::InputTransformation(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_content_insertion(&self) -> Option<&ContentInsertionData> {
        match &self.data {
            EventData::ContentInsertion(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_content_insertion_mut(&mut self) -> Option<&mut ContentInsertionData> {
        match &mut self.data {
            EventData::ContentInsertion(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_clipboard_output(&self) -> Option<&ClipboardOutputData> {
        match &self.data {
            EventData::ClipboardOutput(data) => Some(data),
            _ => None,
        }
    }
}

/// One handler of a listener, bound to an event at a fixed priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub event: EventName,
    pub priority: Priority,
    pub handler: &'static str,
}

impl Subscription {
    pub const fn new(event: EventName, priority: Priority, handler: &'static str) -> Self {
        Self {
            event,
            priority,
            handler,
        }
    }
}

pub trait Listener: Any {
    fn id(&self) -> &'static str;

    /// Read once, at registration.
    fn subscriptions(&self) -> Vec<Subscription>;

    fn handle(&mut self, handler: &'static str, ctx: &mut EditingContext, event: &mut Event);

    /// Called whenever the editor clock advances.
    fn tick(&mut self, _ctx: &mut EditingContext) {}

    fn destroy(&mut self, _ctx: &mut EditingContext) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("listener `{0}` is already registered")]
    DuplicateListener(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Route {
    priority: Priority,
    seq: usize,
    listener: usize,
    handler: &'static str,
}

/// Priority-ordered publish/subscribe. Handlers of one event run from the
/// highest priority down; equal priorities run in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn Listener>>,
    routes: HashMap<EventName, Vec<Route>>,
    next_seq: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Box<dyn Listener>) -> Result<(), BusError> {
        let id = listener.id();
        if self.listeners.iter().any(|l| l.id() == id) {
            return Err(BusError::DuplicateListener(id));
        }
        let index = self.listeners.len();
        for subscription in listener.subscriptions() {
            let routes = self.routes.entry(subscription.event).or_default();
            routes.push(Route {
                priority: subscription.priority,
                seq: self.next_seq,
                listener: index,
                handler: subscription.handler,
            });
            self.next_seq += 1;
            routes.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        }
        tracing::debug!(listener = id, "listener registered");
        self.listeners.push(listener);
        Ok(())
    }

    pub fn dispatch(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Self {
            listeners, routes, ..
        } = self;
        let Some(routes) = routes.get(&event.name()) else {
            return;
        };
        for route in routes {
            if event.is_stopped() {
                tracing::trace!(event = ?event.name(), "propagation stopped");
                break;
            }
            let listener = &mut listeners[route.listener];
            tracing::trace!(
                event = ?event.name(),
                listener = listener.id(),
                handler = route.handler,
                priority = ?route.priority,
                "dispatch"
            );
            listener.handle(route.handler, ctx, event);
        }
    }

    pub fn tick(&mut self, ctx: &mut EditingContext) {
        for listener in &mut self.listeners {
            listener.tick(ctx);
        }
    }

    pub fn destroy(&mut self, ctx: &mut EditingContext) {
        for listener in &mut self.listeners {
            listener.destroy(ctx);
        }
    }

    pub fn get<T: Listener>(&self) -> Option<&T> {
        self.listeners
            .iter()
            .find_map(|listener| listener.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Listener>(&mut self) -> Option<&mut T> {
        self.listeners
            .iter_mut()
            .find_map(|listener| listener.as_any_mut().downcast_mut::<T>())
    }
}
