//! Wiki rendering: the directive pipeline plus the pieces around it.

mod assets;
mod metadata;
mod page;
mod paths;
pub mod pipeline;
mod wiki;

pub use paths::{PageLookup, resolve_page};
pub use wiki::Wiki;
