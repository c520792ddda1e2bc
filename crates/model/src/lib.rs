mod content;
mod error;
mod marker;
mod model;
mod node;
mod ops;
mod position;
mod schema;
mod value;
pub mod view;
mod walker;

pub use crate::content::*;
pub use crate::error::*;
pub use crate::marker::*;
pub use crate::model::*;
pub use crate::node::*;
pub use crate::ops::*;
pub use crate::position::*;
pub use crate::schema::*;
pub use crate::value::*;
pub use crate::walker::*;
