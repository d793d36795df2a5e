//! Interpreter module
//!
//! The word-expansion engine: the expansion context borrowed from a shell
//! session, the collaborators it calls out to, and the manager that turns a
//! command's words into its arguments.

pub mod arithmetic;
pub mod errors;
pub mod expansion;
pub mod helpers;
pub mod redirections;
pub mod runtime;
pub mod types;
pub mod word_expansion;

pub use arithmetic::*;
pub use errors::*;
pub use expansion::*;
pub use helpers::*;
pub use redirections::*;
pub use runtime::*;
pub use types::*;
pub use word_expansion::*;
