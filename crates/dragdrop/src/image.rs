use std::any::Any;

use plate_model::{Model, Node, Path, Range, VoidNode};

use crate::editor::EditingContext;
use crate::events::{Event, EventName, Listener, Priority, Subscription};

const IMAGE_KIND: &str = "image";
const IMAGE_INLINE_KIND: &str = "image_inline";
const CONVERT: &str = "convert";

/// Turns block images dropped or pasted into the middle of text into inline
/// images. Images with a caption are inserted as they are.
#[derive(Debug, Default)]
pub struct ImageInlineIntegration;

impl ImageInlineIntegration {
    pub fn new() -> Self {
        Self
    }

    fn on_input_transformation(&mut self, ctx: &mut EditingContext, event: &mut Event) {
        let Some(data) = event.as_input_transformation() else {
            return;
        };
        if data.content.is_empty() || !data.content.iter().all(is_block_image) {
            return;
        }
        // Drops carry their target; pastes go to the selection.
        let range = match data.target_ranges.first() {
            Some(view_range) => ctx.view.to_model_range(view_range),
            None => Some(ctx.model.selection().range()),
        };
        let Some(range) = range else {
            return;
        };
        if !inserts_inline(&ctx.model, &range) {
            return;
        }

        let Some(data) = event.as_input_transformation_mut() else {
            return;
        };
        tracing::debug!(images = data.content.len(), "converting block images to inline");
        for node in &mut data.content {
            if let Node::Void(image) = node {
                *node = Node::Void(VoidNode {
                    kind: IMAGE_INLINE_KIND.to_string(),
                    attrs: std::mem::take(&mut image.attrs),
                });
            }
        }
    }
}

fn is_block_image(node: &Node) -> bool {
    matches!(node, Node::Void(_) | Node::Element(_)) && node.kind() == Some(IMAGE_KIND)
}

/// Whether images inserted at `range` belong inline: the first block it
/// touches is a text block with content.
fn inserts_inline(model: &Model, range: &Range) -> bool {
    let Some(block) = first_block(model, range) else {
        return false;
    };
    let Some(node) = model.node_at(&block) else {
        return false;
    };
    !model.schema().is_object(node) && !node.is_empty()
}

fn first_block(model: &Model, range: &Range) -> Option<Path> {
    if let Some(path) = range.spanned_node_path() {
        if model.is_object_at(path) {
            return Some(path.to_vec());
        }
    }
    model.text_block_at(&range.start)
}

impl Listener for ImageInlineIntegration {
    fn id(&self) -> &'static str {
        "image.inline_integration"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            EventName::InputTransformation,
            Priority::Normal,
            CONVERT,
        )]
    }

    fn handle(&mut self, handler: &'static str, ctx: &mut EditingContext, event: &mut Event) {
        if handler == CONVERT {
            self.on_input_transformation(ctx, event);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
