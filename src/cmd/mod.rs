//! CLI command handlers.

mod run_cmd;
mod statements_cmd;

pub use run_cmd::*;
pub use statements_cmd::*;
