mod config;
mod draggable;
mod editor;
mod events;
mod image;
mod marker;
mod pipeline;
mod plugin;
pub mod resolver;
mod session;
mod timer;
mod transfer;

pub use crate::config::*;
pub use crate::draggable::*;
pub use crate::editor::*;
pub use crate::events::*;
pub use crate::image::*;
pub use crate::marker::*;
pub use crate::pipeline::*;
pub use crate::plugin::*;
pub use crate::session::*;
pub use crate::timer::*;
pub use crate::transfer::*;
