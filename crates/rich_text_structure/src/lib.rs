mod apply;
mod create;
mod dom;
mod edit;
mod error;
mod format;
mod markup;
mod query;
mod record;
mod serialize;
mod settings;

pub use crate::apply::*;
pub use crate::create::*;
pub use crate::dom::*;
pub use crate::edit::*;
pub use crate::error::*;
pub use crate::format::*;
pub use crate::markup::*;
pub use crate::query::*;
pub use crate::record::*;
pub use crate::serialize::*;
pub use crate::settings::*;
