use std::collections::VecDeque;
use std::time::Duration;

use plate_model::Model;
use plate_model::view::EditingView;

use crate::config::DragDropConfig;
use crate::events::{BusError, Event, EventBus, Listener};
use crate::image::ImageInlineIntegration;
use crate::pipeline::ClipboardPipeline;
use crate::plugin::DragDrop;

struct Queued {
    event: Event,
    in_change: bool,
}

/// State shared by every listener of one editor surface.
pub struct EditingContext {
    pub model: Model,
    pub view: EditingView,
    read_only: bool,
    now: Duration,
    pending: VecDeque<Queued>,
}

impl EditingContext {
    fn new(model: Model) -> Self {
        Self {
            model,
            view: EditingView::new(),
            read_only: false,
            now: Duration::ZERO,
            pending: VecDeque::new(),
        }
    }

    /// Queues a follow-up event, dispatched once the current one is done.
    pub fn fire(&mut self, event: Event) {
        self.pending.push_back(Queued {
            event,
            in_change: false,
        });
    }

    /// Like [`EditingContext::fire`], but every listener of the event runs
    /// inside one model change block.
    pub fn fire_in_change(&mut self, event: Event) {
        self.pending.push_back(Queued {
            event,
            in_change: true,
        });
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

pub struct Editor {
    ctx: EditingContext,
    bus: EventBus,
    rendered_version: u64,
}

impl Editor {
    pub fn new(model: Model, config: DragDropConfig) -> Self {
        let listeners: Vec<Box<dyn Listener>> = vec![
            Box::new(ClipboardPipeline::new()),
            Box::new(DragDrop::new(config)),
            Box::new(ImageInlineIntegration::new()),
        ];
        Self::with_listeners(model, listeners).expect("built-in listeners must be unique")
    }

    pub fn with_listeners(
        model: Model,
        listeners: impl IntoIterator<Item = Box<dyn Listener>>,
    ) -> Result<Self, BusError> {
        let mut bus = EventBus::new();
        for listener in listeners {
            bus.register(listener)?;
        }
        let mut ctx = EditingContext::new(model);
        ctx.view.render(&ctx.model);
        let rendered_version = ctx.model.version();
        Ok(Self {
            ctx,
            bus,
            rendered_version,
        })
    }

    pub fn register(&mut self, listener: Box<dyn Listener>) -> Result<(), BusError> {
        self.bus.register(listener)
    }

    /// Dispatches `event` and every follow-up it causes, then re-renders the
    /// view if the model changed. Returns the event as the listeners left it.
    pub fn fire(&mut self, event: Event) -> Event {
        let mut event = event;
        self.dispatch(&mut event, false);
        self.drain();
        self.render_if_changed();
        event
    }

    /// Moves the clock forward and lets listeners run their due timers.
    pub fn advance(&mut self, by: Duration) {
        self.ctx.now += by;
        self.bus.tick(&mut self.ctx);
        self.drain();
        self.render_if_changed();
    }

    fn dispatch(&mut self, event: &mut Event, in_change: bool) {
        if in_change {
            self.ctx.model.begin_change();
        }
        self.bus.dispatch(&mut self.ctx, event);
        if in_change {
            self.ctx.model.end_change();
        }
    }

    fn drain(&mut self) {
        while let Some(Queued {
            mut event,
            in_change,
        }) = self.ctx.pending.pop_front()
        {
            self.dispatch(&mut event, in_change);
        }
    }

    fn render_if_changed(&mut self) {
        if self.ctx.model.version() != self.rendered_version {
            self.ctx.view.render(&self.ctx.model);
            self.rendered_version = self.ctx.model.version();
        }
    }

    pub fn model(&self) -> &Model {
        &self.ctx.model
    }

    pub fn view(&self) -> &EditingView {
        &self.ctx.view
    }

    /// Runs a host-driven edit as one change block and re-renders.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Model) -> R) -> R {
        let result = self.ctx.model.change(f);
        self.render_if_changed();
        result
    }

    pub fn now(&self) -> Duration {
        self.ctx.now
    }

    pub fn is_read_only(&self) -> bool {
        self.ctx.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.ctx.read_only = read_only;
    }

    pub fn plugin<T: Listener>(&self) -> Option<&T> {
        self.bus.get::<T>()
    }

    /// Runs `f` with a listener and the context, as a handler would.
    pub fn with_plugin<T: Listener, R>(
        &mut self,
        f: impl FnOnce(&mut T, &mut EditingContext) -> R,
    ) -> Option<R> {
        let plugin = self.bus.get_mut::<T>()?;
        let result = f(plugin, &mut self.ctx);
        self.drain();
        self.render_if_changed();
        Some(result)
    }

    /// Tears every listener down: sessions end and pending timers are dropped.
    pub fn destroy(&mut self) {
        self.bus.destroy(&mut self.ctx);
        self.ctx.pending.clear();
        self.render_if_changed();
    }
}
