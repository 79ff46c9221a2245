//! Terminal output helpers.

#[macro_use]
mod macros;

pub mod shell;
