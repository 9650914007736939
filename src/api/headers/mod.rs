//! Parsers for the LDP request headers.
//!
//! Every parser takes the raw value (possibly absent) and yields `None` for
//! anything malformed, so a bad header degrades to "header absent".

mod datetime;
mod link;
mod prefer;
mod range;
mod slug;

pub use datetime::{AcceptDatetime, Version};
pub use link::Link;
pub use prefer::{Handling, Prefer, PreferReturn};
pub use range::ByteRange;
pub use slug::Slug;

pub const ACCEPT_DATETIME: &str = "accept-datetime";
pub const ACCEPT_PATCH: &str = "accept-patch";
pub const ACCEPT_POST: &str = "accept-post";
pub const MEMENTO_DATETIME: &str = "memento-datetime";
pub const ON_BEHALF_OF: &str = "on-behalf-of";
pub const PREFER: &str = "prefer";
pub const PREFERENCE_APPLIED: &str = "preference-applied";
pub const SLUG: &str = "slug";
