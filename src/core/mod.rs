// Command model, argument compilation, and output parsing.
pub mod action;
pub mod command;
pub mod compile;
pub mod error;
pub mod info;
pub mod matrix;
pub mod modifier;
pub mod restore;
pub mod reuse;
pub mod set_type;
pub mod version;
