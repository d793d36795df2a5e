//! Abstract Syntax Tree (AST) Types for Shell Words
//!
//! This module defines the Word AST consumed by the expansion engine.
//!
//! Architecture:
//!   Parser → Word AST → Expansion Manager → argv → Executor

pub mod types;
