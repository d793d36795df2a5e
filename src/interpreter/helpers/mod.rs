//! Interpreter helpers

pub mod ifs;

pub use ifs::*;
