use std::any::Any;

use plate_model::Range;
use plate_model::view::{ViewId, ViewRange};

use crate::config::{DragDropConfig, DropEffectSource};
use crate::draggable::{DraggableMark, pick_source};
use crate::editor::EditingContext;
use crate::events::{
    ClipboardOutputData, Event, EventName, Listener, Method, Priority, Subscription,
};
use crate::marker::DropMarkerController;
use crate::resolver;
use crate::session::{DragSession, SessionPhase};
use crate::transfer::{DRAGGING_UID_TYPE, DropEffect, EffectAllowed};

const POINTER_DOWN: &str = "pointer_down";
const POINTER_UP: &str = "pointer_up";
const DRAG_START: &str = "drag_start";
const DRAG_ENTER: &str = "drag_enter";
const DRAG_OVER: &str = "drag_over";
const DRAG_LEAVE: &str = "drag_leave";
const DRAG_END: &str = "drag_end";
const DROP: &str = "drop";
const SELECT_TARGET: &str = "select_target";
const FINISH_DROP: &str = "finish_drop";

/// Drag and drop of editor content: moving and copying within the editor,
/// and dropping content dragged in from elsewhere.
pub struct DragDrop {
    config: DragDropConfig,
    enabled: bool,
    session: DragSession,
    marker: DropMarkerController,
    draggable: DraggableMark,
}

impl DragDrop {
    pub fn new(config: DragDropConfig) -> Self {
        let marker = DropMarkerController::new(config.marker_interval());
        Self {
            config,
            enabled: true,
            session: DragSession::new(),
            marker,
            draggable: DraggableMark::new(),
        }
    }

    pub fn config(&self) -> &DragDropConfig {
        &self.config
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn marker(&self) -> &DropMarkerController {
        &self.marker
    }

    pub fn draggable(&self) -> &DraggableMark {
        &self.draggable
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling ends a running session as a copy.
    pub fn set_enabled(&mut self, ctx: &mut EditingContext, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        tracing::debug!(enabled, "drag and drop toggled");
        if !enabled {
            self.finalize(ctx, false);
        }
    }

    /// Ends the session. Safe to call any number of times.
    pub fn finalize(&mut self, ctx: &mut EditingContext, moved: bool) {
        self.marker.remove(&mut ctx.model);
        self.draggable.clear(&mut ctx.view);
        self.session.finalize(&mut ctx.model, moved && self.enabled);
    }

    fn resolve(
        &self,
        ctx: &EditingContext,
        target: Option<ViewId>,
        target_ranges: &[ViewRange],
    ) -> Option<Range> {
        resolver::resolve(
            &ctx.model,
            &ctx.view,
            target_ranges,
            target?,
            self.config.search_bias,
        )
    }

    fn on_pointer_down(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(target) = event.pointer_target() else {
            return;
        };
        let read_only = ctx.is_read_only();
        let source = pick_source(&ctx.model, &ctx.view, target, &self.config, read_only);
        if let Some(source) = source {
            self.draggable.set(&mut ctx.view, source);
        }
    }

    fn on_pointer_up(&mut self, ctx: &mut EditingContext) {
        self.draggable.clear(&mut ctx.view);
    }

    fn on_drag_start(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(drag) = event.as_drag() else {
            return;
        };
        let transfer = drag.data_transfer.clone();
        let target = drag.target;
        let range = ctx.model.selection().range();
        if range.is_collapsed() {
            tracing::debug!("nothing selected to drag");
            event.prevent_default();
            return;
        }
        if target.is_some_and(|target| ctx.view.is_root(target)) {
            tracing::debug!("drag start on the editing root rejected");
            event.prevent_default();
            return;
        }

        let content = ctx.model.selected_content(&range);
        let uid = self.session.start(&mut ctx.model, range);
        transfer.set_effect_allowed(EffectAllowed::CopyMove);
        transfer.set_data(DRAGGING_UID_TYPE, uid.as_str());
        ctx.fire(Event::clipboard_output(ClipboardOutputData {
            method: Method::DragStart,
            data_transfer: transfer,
            content,
        }));
    }

    fn on_drag_over(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(drag) = event.as_drag() else {
            return;
        };
        let transfer = drag.data_transfer.clone();
        self.marker.cancel_removal();
        if ctx.is_read_only() {
            transfer.set_drop_effect(DropEffect::None);
            return;
        }

        let target = self.resolve(ctx, drag.target, &drag.target_ranges);
        if self.config.drop_effect_source == DropEffectSource::EffectAllowed {
            match transfer.effect_allowed() {
                EffectAllowed::Copy => transfer.set_drop_effect(DropEffect::Copy),
                EffectAllowed::CopyMove | EffectAllowed::All => {
                    transfer.set_drop_effect(DropEffect::Move)
                }
                _ => {}
            }
        }
        if !self.session.has_dragged_range() {
            // Content from elsewhere can only be copied in.
            transfer.set_drop_effect(DropEffect::Copy);
        }
        if self.session.is_active() {
            self.session.transition(SessionPhase::Tracking);
        }
        if let Some(range) = target {
            self.marker.schedule_update(range, ctx.now());
        }
        event.stop();
    }

    fn on_drop(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(input) = event.as_clipboard_input() else {
            return;
        };
        if input.method != Method::Drop {
            return;
        }
        let transfer = input.data_transfer.clone();
        let target = self.resolve(ctx, input.target, &input.target_ranges);
        self.marker.remove(&mut ctx.model);

        let Some(target) = target else {
            tracing::debug!("drop without a valid target");
            self.finalize(ctx, false);
            event.stop();
            return;
        };

        let token = transfer.data(DRAGGING_UID_TYPE);
        if self.session.has_dragged_range() && !self.session.matches(token.as_deref()) {
            self.session.discard(&mut ctx.model);
        }

        let is_move =
            self.config.drop_effect_source.final_effect(&transfer) == DropEffect::Move;
        let same_place = self
            .session
            .dragged_range(&ctx.model)
            .is_some_and(|dragged| dragged.contains_range(&target, true));
        if is_move && same_place {
            tracing::debug!(?target, "dropped onto the dragged content");
            self.finalize(ctx, false);
            event.stop();
            return;
        }

        let Some(view_range) = ctx.view.to_view_range(&target) else {
            tracing::warn!(?target, "drop target has no view counterpart");
            self.finalize(ctx, false);
            event.stop();
            return;
        };
        if let Some(input) = event.as_clipboard_input_mut() {
            input.target_ranges = vec![view_range];
        }
        self.session.transition(SessionPhase::Committing);
    }

    fn on_select_target(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(insertion) = event.as_content_insertion() else {
            return;
        };
        if insertion.method != Method::Drop {
            return;
        }
        let Some(range) = insertion
            .target_ranges
            .first()
            .and_then(|range| ctx.view.to_model_range(range))
        else {
            return;
        };
        ctx.model.change(|model| model.set_selection(range));
    }

    fn on_finish_drop(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(insertion) = event.as_content_insertion() else {
            return;
        };
        if insertion.method != Method::Drop {
            return;
        }
        // Without a dragged range the content came from elsewhere: a copy.
        let is_move = self.session.has_dragged_range()
            && self.config.drop_effect_source.final_effect(&insertion.data_transfer)
                == DropEffect::Move;
        let success = insertion
            .result_range
            .as_ref()
            .is_none_or(|range| !range.is_collapsed());
        self.finalize(ctx, success && is_move);
    }

    fn on_drag_end(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(drag) = event.as_drag() else {
            return;
        };
        let transfer = &drag.data_transfer;
        let moved = !transfer.is_cancelled() && transfer.drop_effect() == DropEffect::Move;
        self.finalize(ctx, moved);
    }
}

impl Listener for DragDrop {
    fn id(&self) -> &'static str {
        "clipboard.drag_drop"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(EventName::PointerDown, Priority::Normal, POINTER_DOWN),
            Subscription::new(EventName::PointerUp, Priority::Normal, POINTER_UP),
            Subscription::new(EventName::DragStart, Priority::Low, DRAG_START),
            Subscription::new(EventName::DragEnter, Priority::Normal, DRAG_ENTER),
            Subscription::new(EventName::DragOver, Priority::Low, DRAG_OVER),
            Subscription::new(EventName::DragLeave, Priority::Normal, DRAG_LEAVE),
            Subscription::new(EventName::DragEnd, Priority::Low, DRAG_END),
            Subscription::new(EventName::ClipboardInput, Priority::High, DROP),
            Subscription::new(EventName::ContentInsertion, Priority::High, SELECT_TARGET),
            Subscription::new(EventName::ContentInsertion, Priority::Lowest, FINISH_DROP),
        ]
    }

    fn handle(&mut self, handler: &'static str, ctx: &mut EditingContext, event: &mut Event) {
        if !self.enabled {
            if handler == DRAG_OVER {
                if let Some(drag) = event.as_drag() {
                    drag.data_transfer.set_drop_effect(DropEffect::None);
                }
            }
            return;
        }
        match handler {
            POINTER_DOWN => self.on_pointer_down(ctx, event),
            POINTER_UP => self.on_pointer_up(ctx),
            DRAG_START => self.on_drag_start(ctx, event),
            DRAG_ENTER => ctx.view.focus(),
            DRAG_OVER => self.on_drag_over(ctx, event),
            DRAG_LEAVE => self.marker.schedule_removal(ctx.now()),
            DRAG_END => self.on_drag_end(ctx, event),
            DROP => self.on_drop(ctx, event),
            SELECT_TARGET => self.on_select_target(ctx, event),
            FINISH_DROP => self.on_finish_drop(ctx, event),
            _ => {}
        }
    }

    fn tick(&mut self, ctx: &mut EditingContext) {
        let now = ctx.now();
        self.marker.tick(&mut ctx.model, now);
    }

    fn destroy(&mut self, ctx: &mut EditingContext) {
        self.marker.cancel();
        self.draggable.clear(&mut ctx.view);
        self.session.discard(&mut ctx.model);
        self.session.transition(SessionPhase::Idle);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
