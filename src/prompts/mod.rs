//! Prompt text for every model call. Builders only format strings;
//! callers own the model choice and response parsing.

pub mod chat;
pub mod decision;
pub mod ranking;
pub mod report;
