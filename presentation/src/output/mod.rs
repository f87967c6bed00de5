//! Output formatting for finished runs, history and provider status

pub mod console;
pub mod formatter;
