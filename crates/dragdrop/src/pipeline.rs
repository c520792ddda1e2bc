use std::any::Any;

use plate_model::{DeleteOptions, Node, Range, Schema, fragment_from_json, fragment_to_json};

use crate::editor::EditingContext;
use crate::events::{
    ContentInsertionData, Event, EventName, InputTransformationData, Listener, Method, Priority,
    Subscription,
};
use crate::transfer::{DataTransfer, FRAGMENT_TYPE, PLAIN_TEXT_TYPE};

const WRITE_OUTPUT: &str = "write_output";
const READ_INPUT: &str = "read_input";
const REQUEST_INSERTION: &str = "request_insertion";
const INSERT: &str = "insert";

/// Moves content between the editor and transfer carriers. Input goes
/// through `InputTransformation`, where integrations may rewrite it, then
/// through `ContentInsertion`, which runs as one change block.
#[derive(Debug, Default)]
pub struct ClipboardPipeline;

impl ClipboardPipeline {
    pub fn new() -> Self {
        Self
    }

    fn on_output(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(output) = event.as_clipboard_output() else {
            return;
        };
        let transfer = &output.data_transfer;
        match fragment_to_json(&output.content) {
            Ok(json) => transfer.set_data(FRAGMENT_TYPE, json),
            Err(err) => tracing::warn!(%err, "failed to serialize the fragment"),
        }
        transfer.set_data(PLAIN_TEXT_TYPE, plain_text(ctx.model.schema(), &output.content));

        if output.method == Method::Cut && !ctx.is_read_only() {
            let selection = ctx.model.selection().range();
            if let Err(err) = ctx.model.delete_content(&selection, DeleteOptions::default()) {
                tracing::warn!(%err, "failed to cut the selection");
            }
        }
    }

    fn on_input(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(input) = event.as_clipboard_input() else {
            return;
        };
        if ctx.is_read_only() {
            return;
        }
        let content = read_content(&input.data_transfer);
        if content.is_empty() {
            tracing::debug!(method = ?input.method, "nothing to insert");
            return;
        }
        ctx.fire(Event::input_transformation(InputTransformationData {
            method: input.method,
            data_transfer: input.data_transfer.clone(),
            target_ranges: input.target_ranges.clone(),
            content,
        }));
    }

    fn on_transformed(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(data) = event.as_input_transformation() else {
            return;
        };
        ctx.fire_in_change(Event::content_insertion(ContentInsertionData {
            method: data.method,
            data_transfer: data.data_transfer.clone(),
            target_ranges: data.target_ranges.clone(),
            content: data.content.clone(),
            result_range: None,
        }));
    }

    fn on_insert(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(insertion) = event.as_content_insertion_mut() else {
            return;
        };
        let content = std::mem::take(&mut insertion.content);
        let result = match ctx.model.insert_content(content) {
            Ok(range) => range,
            Err(err) => {
                tracing::warn!(%err, "content insertion failed");
                Range::collapsed(ctx.model.selection().range().start)
            }
        };
        insertion.result_range = Some(result);
    }
}

/// Fragment when present, otherwise the plain text split into paragraphs.
fn read_content(transfer: &DataTransfer) -> Vec<Node> {
    if let Some(json) = transfer.data(FRAGMENT_TYPE) {
        match fragment_from_json(&json) {
            Ok(nodes) => return nodes,
            Err(err) => tracing::warn!(%err, "ignoring a malformed fragment"),
        }
    }
    let Some(text) = transfer.data(PLAIN_TEXT_TYPE) else {
        return Vec::new();
    };
    if text.is_empty() {
        return Vec::new();
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() == 1 {
        return vec![Node::text(lines[0])];
    }
    lines.into_iter().map(Node::paragraph).collect()
}

fn plain_text(schema: &Schema, content: &[Node]) -> String {
    if content.iter().all(|node| schema.is_inline(node)) {
        content.iter().map(Node::plain_text).collect()
    } else {
        content
            .iter()
            .map(Node::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Listener for ClipboardPipeline {
    fn id(&self) -> &'static str {
        "clipboard.pipeline"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(EventName::ClipboardOutput, Priority::Normal, WRITE_OUTPUT),
            Subscription::new(EventName::ClipboardInput, Priority::Normal, READ_INPUT),
            Subscription::new(EventName::InputTransformation, Priority::Low, REQUEST_INSERTION),
            Subscription::new(EventName::ContentInsertion, Priority::Low, INSERT),
        ]
    }

    fn handle(&mut self, handler: &'static str, ctx: &mut EditingContext, event: &mut Event) {
        match handler {
            WRITE_OUTPUT => self.on_output(ctx, event),
            READ_INPUT => self.on_input(ctx, event),
            REQUEST_INSERTION => self.on_transformed(ctx, event),
            INSERT => self.on_insert(ctx, event),
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
