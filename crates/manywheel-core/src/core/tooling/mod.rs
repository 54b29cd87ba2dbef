//! CLI-facing outcome shaping and user-facing messages.

mod messages;
pub(crate) mod outcome;

pub(crate) use messages::*;
