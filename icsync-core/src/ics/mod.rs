//! ICS document parsing.

pub mod datetime;
pub mod parse;

pub use parse::parse_document;
