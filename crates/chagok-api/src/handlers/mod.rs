//! Request handlers.

pub mod cases;
pub mod drafts;
pub mod events;
pub mod evidence;
