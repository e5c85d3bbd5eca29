//! Conversation state and query planning for movie lookups.
//!
//! Everything here is synchronous and free of I/O: slots accumulate in a [`slot::SlotSet`],
//! [`query::compile`] turns them into a [`query::CompiledQuery`], and [`select::select`] picks one
//! candidate out of whatever the search backend returned.

pub mod fulltext;
pub mod query;
pub mod search;
pub mod select;
pub mod slot;
